//! Common test utilities for cinelog-auth-core integration tests

pub mod mock_repos;

use std::sync::Arc;

use cinelog_auth_core::{AuthConfig, AuthService};

#[allow(unused_imports)]
pub use mock_repos::{InsertScript, MockRefreshRepository, MockSessionCache, MockUserRepository};

pub type MockAuthService = AuthService<MockUserRepository, MockRefreshRepository, MockSessionCache>;

/// An auth service wired to mock stores, with handles on each store
#[allow(dead_code)]
pub struct Harness {
    pub service: MockAuthService,
    pub users: MockUserRepository,
    pub refresh: MockRefreshRepository,
    pub sessions: MockSessionCache,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_config(AuthConfig::default())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let users = MockUserRepository::new();
        let refresh = MockRefreshRepository::new(users.clone());
        let sessions = MockSessionCache::new();

        let service = AuthService::new(
            config,
            Arc::new(users.clone()),
            Arc::new(refresh.clone()),
            Arc::new(sessions.clone()),
        )
        .expect("valid test config");

        Self {
            service,
            users,
            refresh,
            sessions,
        }
    }
}
