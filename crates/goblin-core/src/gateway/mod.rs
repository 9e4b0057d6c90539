//! Front-side MCP protocol surface: session lifecycle, dispatch, fan-out

pub mod error;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use server::GatewayServer;
