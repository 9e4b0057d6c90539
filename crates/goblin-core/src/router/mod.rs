//! Router: qualified-name dispatch from front-side calls to backends

pub mod cache;
pub mod error;
pub mod manager;

pub use cache::{RouteCache, RouteEntry};
pub use error::{RouterError, RouterResult};
pub use manager::{truncated_preview_content, CallContext, Router};
