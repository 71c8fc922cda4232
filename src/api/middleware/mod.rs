//! API middleware components

pub mod authenticate;
pub mod logging;
pub mod permission;
pub mod rate_limit;

pub use authenticate::authenticate_middleware;
pub use logging::{logging_middleware, Caller};
pub use permission::{
    MoviesRead, MoviesWrite, PermissionCode, RequireActivated, RequireAuthenticated,
    RequirePermission,
};
pub use rate_limit::rate_limit_middleware;
