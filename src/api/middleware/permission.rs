//! Route-level authorization extractors
//!
//! Each runs after the authenticate middleware and reads the [`Identity`] it
//! stored. A request that skipped that middleware is treated as anonymous.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::permission::{MOVIES_READ, MOVIES_WRITE};
use crate::domain::{Identity, User};

fn identity(parts: &Parts) -> Identity {
    parts
        .extensions
        .get::<Identity>()
        .cloned()
        .unwrap_or(Identity::Anonymous)
}

/// Any authenticated user
#[derive(Debug, Clone)]
pub struct RequireAuthenticated(pub User);

impl FromRequestParts<AppState> for RequireAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = identity(parts);
        let user = state.permission_gate.require_authenticated(&identity)?;
        Ok(Self(user.clone()))
    }
}

/// An authenticated user whose account is activated
#[derive(Debug, Clone)]
pub struct RequireActivated(pub User);

impl FromRequestParts<AppState> for RequireActivated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = identity(parts);
        let user = state.permission_gate.require_activated(&identity)?;
        Ok(Self(user.clone()))
    }
}

/// Permission code checked by [`RequirePermission`]
pub trait PermissionCode: Send + Sync {
    const CODE: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct MoviesRead;

impl PermissionCode for MoviesRead {
    const CODE: &'static str = MOVIES_READ;
}

#[derive(Debug, Clone, Copy)]
pub struct MoviesWrite;

impl PermissionCode for MoviesWrite {
    const CODE: &'static str = MOVIES_WRITE;
}

/// An activated user holding permission `P`
#[derive(Debug, Clone)]
pub struct RequirePermission<P>(pub User, PhantomData<P>);

impl<P> RequirePermission<P> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

impl<P: PermissionCode> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = identity(parts);
        let user = state
            .permission_gate
            .require_permission(&identity, P::CODE)
            .await?;
        Ok(Self(user.clone(), PhantomData))
    }
}
