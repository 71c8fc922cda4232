//! User and token request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::{IssuedToken, User};
use crate::infrastructure::user::RegisterUserRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<RegisterUserBody> for RegisterUserRequest {
    fn from(body: RegisterUserBody) -> Self {
        RegisterUserRequest {
            name: body.name,
            email: body.email,
            password: body.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateUserBody {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAuthenticationTokenBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct AuthenticationTokenEnvelope {
    pub authentication_token: IssuedToken,
}
