// src/state.rs

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::session::AttemptSession;
use crate::store::memory::MemoryStore;
use crate::store::postgres::PgStore;
use crate::store::{AwardStore, EventLogStore, QuizStore};

/// Shared application state: the three store seams, the per-process session
/// registry, and config. Stores are trait objects so tests can run on the
/// in-memory backend.
#[derive(Clone)]
pub struct AppState {
    pub quizzes: Arc<dyn QuizStore>,
    pub events: Arc<dyn EventLogStore>,
    pub awards: Arc<dyn AwardStore>,
    pub sessions: Arc<RwLock<HashMap<Uuid, AttemptSession>>>,
    pub config: Config,
}

impl AppState {
    pub fn with_postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        AppState {
            quizzes: store.clone(),
            events: store.clone(),
            awards: store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Everything in memory; returns the store too so callers can seed it.
    pub fn in_memory(config: Config) -> (Self, Arc<MemoryStore>) {
        let store = MemoryStore::new();
        let state = AppState {
            quizzes: store.clone(),
            events: store.clone(),
            awards: store.clone(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        };
        (state, store)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
