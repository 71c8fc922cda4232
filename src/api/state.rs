//! Application state for shared services

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::Clock;
use crate::infrastructure::movie::MovieService;
use crate::infrastructure::storage::Repositories;
use crate::infrastructure::user::{Argon2Hasher, UserService};
use crate::infrastructure::{
    BackgroundTasks, ConcurrencyGuard, LogMailer, Mailer, PermissionGate, RateLimiter,
    TokenAuthenticator,
};

/// Shared services handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub authenticator: TokenAuthenticator,
    pub permission_gate: PermissionGate,
    pub user_service: Arc<UserService>,
    pub movie_service: Arc<MovieService>,
    pub background: BackgroundTasks,
}

impl AppState {
    /// Wire services over `repos` with the shipped log mailer
    pub fn new(config: AppConfig, repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.mailer.sender.clone()));
        Self::with_mailer(config, repos, clock, mailer)
    }

    pub fn with_mailer(
        config: AppConfig,
        repos: Repositories,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let store_timeout = config.store_timeout();
        let guard = ConcurrencyGuard::new(store_timeout);
        let background = BackgroundTasks::new();

        let authenticator =
            TokenAuthenticator::new(repos.users.clone(), repos.tokens.clone(), clock.clone())
                .with_store_timeout(store_timeout);

        let permission_gate =
            PermissionGate::new(repos.permissions.clone()).with_store_timeout(store_timeout);

        let user_service = UserService::new(
            repos.users.clone(),
            repos.permissions.clone(),
            authenticator.clone(),
            guard,
            Arc::new(Argon2Hasher::new()),
            mailer,
            background.clone(),
            config.token_ttls(),
        )
        .with_store_timeout(store_timeout);

        let movie_service =
            MovieService::new(repos.movies.clone(), guard).with_store_timeout(store_timeout);

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit(), clock));

        Self {
            config: Arc::new(config),
            rate_limiter,
            authenticator,
            permission_gate,
            user_service: Arc::new(user_service),
            movie_service: Arc::new(movie_service),
            background,
        }
    }
}
