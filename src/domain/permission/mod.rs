//! Permission domain

mod entity;
mod repository;

pub use entity::{Permissions, MOVIES_READ, MOVIES_WRITE};
pub use repository::PermissionRepository;

#[cfg(test)]
pub use repository::MockPermissionRepository;
