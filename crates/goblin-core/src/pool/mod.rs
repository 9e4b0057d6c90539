//! Connection pool and lifecycle manager for backend connections

pub mod breaker;
pub mod error;
pub mod manager;

pub use breaker::{Backoff, CircuitBreaker};
pub use error::{PoolError, PoolResult};
pub use manager::{Pool, PoolSlot};
