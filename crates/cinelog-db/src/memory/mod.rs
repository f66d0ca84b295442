//! In-memory store implementations
//!
//! These mirror the semantics of the PostgreSQL and Redis backends (unique
//! constraints, transactional visibility, sliding TTL) without any external
//! service. The session cache is usable for local development; the user and
//! refresh repositories exist for tests.

mod refresh;
mod sessions;
mod users;

pub use refresh::MemoryRefreshRepository;
pub use sessions::MemorySessionCache;
pub use users::{MemoryUserRepository, MemoryUserTransaction};
