//! Backend connection: the client side of one configured MCP server
//!
//! [`state::Backend`] is the data the pool and registry read; [`client::BackendClient`]
//! is the live connection that produces it, built on a [`crate::transport::ClientTransport`]
//! adapter plus the shared [`crate::correlation`] request/response machinery.

pub mod client;
pub mod state;

pub use client::{BackendClient, BackendNotification, NotificationSubscriptions};
pub use state::{Backend, BackendState};
