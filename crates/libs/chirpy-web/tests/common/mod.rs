#![allow(dead_code)]

use std::sync::Arc;

use chirpy_auth::{access_token::AccessTokenCodec, clock::ManualClock};
use chirpy_models::memory::MemoryStore;
use chirpy_web::session::SessionService;

pub const SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub sessions: SessionService,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let sessions = SessionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            AccessTokenCodec::new(SECRET),
        )
        .with_clock(Arc::new(clock.clone()));

        Self {
            store,
            clock,
            sessions,
        }
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
