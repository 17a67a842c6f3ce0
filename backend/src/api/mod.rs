//! HTTP API module.
//!
//! The axum server, its JSON payloads, and the log / live report
//! broadcasters that feed its SSE streams.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::start_server;
pub use types::*;
