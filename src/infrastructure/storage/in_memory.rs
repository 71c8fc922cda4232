//! In-memory tables shared by the in-memory repositories
//!
//! All tables sit behind one lock so multi-table reads (token owner lookup)
//! and version checks are atomic. Data is lost when the process terminates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{Clock, Movie, Permissions, SystemClock, TokenHash, TokenRecord, User};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub users: BTreeMap<i64, User>,
    pub next_user_id: i64,
    pub tokens: HashMap<TokenHash, TokenRecord>,
    pub permissions: HashMap<i64, Permissions>,
    pub movies: BTreeMap<i64, Movie>,
    pub next_movie_id: i64,
}

impl Tables {
    pub fn allocate_user_id(&mut self) -> i64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub fn allocate_movie_id(&mut self) -> i64 {
        self.next_movie_id += 1;
        self.next_movie_id
    }
}

/// Handle to the in-memory tables; clones share the same data
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryStore {
    /// `clock` stamps `created_at` on inserted rows
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}
