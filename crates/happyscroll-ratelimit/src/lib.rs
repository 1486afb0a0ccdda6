//! C7 — rate-limit gate.

pub mod backend;
pub mod error;
pub mod gate;
pub mod memory;
pub mod redis_counter;

pub use backend::{CounterBackend, IncrementOutcome};
pub use error::CounterBackendError;
pub use gate::{PrecheckOutcome, RateLimitGate, DEFAULT_CLIENT_LIMIT, DEFAULT_GLOBAL_LIMIT};
pub use memory::InMemoryCounterBackend;
pub use redis_counter::RedisCounterBackend;
