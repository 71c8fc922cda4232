//! User domain
//!
//! User accounts, the request identity and the repository trait used by the
//! authenticator, permission gate and user service.

mod entity;
mod repository;
mod validation;

pub use entity::{Identity, NewUser, User, UserId};
pub use repository::UserRepository;
pub use validation::{validate_email, validate_password_plaintext, validate_user};

#[cfg(test)]
pub use repository::MockUserRepository;
