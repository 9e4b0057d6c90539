//! Client-side transport adapters
//!
//! Four implementations of [`ClientTransport`], one per backend transport
//! kind from `spec.md` §4.2: [`stdio::StdioTransport`],
//! [`http::HttpTransport`], [`sse::SseTransport`],
//! [`streamable_http::StreamableHttpTransport`].

pub mod client;
pub mod error;
pub mod http;
pub mod sse;
pub mod stdio;
pub mod streamable_http;

pub use client::{ClientTransport, TransportState};
pub use error::{ClientTransportError, ClientTransportResult};
pub use http::HttpTransport;
pub use sse::SseTransport;
pub use stdio::StdioTransport;
pub use streamable_http::StreamableHttpTransport;

use crate::config::{ServerSpec, TransportPayload};

/// Construct the adapter matching a validated server spec's declared kind
/// and transport payload.
pub fn build_transport(spec: &ServerSpec) -> Box<dyn ClientTransport> {
    match &spec.payload {
        TransportPayload::Stdio { command, args, env } => Box::new(StdioTransport::new(
            command.clone(),
            args.clone(),
            env.clone(),
        )),
        TransportPayload::Network { url, headers } => match spec.transport {
            crate::config::TransportKind::Http => {
                Box::new(HttpTransport::new(url.clone(), headers.clone()))
            }
            crate::config::TransportKind::Sse => {
                Box::new(SseTransport::new(url.clone(), headers.clone()))
            }
            crate::config::TransportKind::StreamableHttp => {
                Box::new(StreamableHttpTransport::new(url.clone(), headers.clone()))
            }
            crate::config::TransportKind::Stdio => unreachable!(
                "validate() guarantees stdio specs carry a Stdio payload, not Network"
            ),
        },
    }
}
