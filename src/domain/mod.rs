//! Domain layer - entities, repository traits and validation rules

pub mod clock;
pub mod concurrency;
pub mod error;
pub mod filters;
pub mod movie;
pub mod permission;
pub mod token;
pub mod user;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use concurrency::{ConditionalUpdate, Versioned};
pub use error::{DomainError, FieldErrors};
pub use filters::{Filters, Metadata, SortDirection};
pub use movie::{Movie, MovieId, MovieQuery, MovieRepository, NewMovie, Runtime};
pub use permission::{PermissionRepository, Permissions};
pub use token::{IssuedToken, Scope, TokenHash, TokenRecord, TokenRepository};
pub use user::{Identity, NewUser, User, UserId, UserRepository};
pub use validation::Validator;
