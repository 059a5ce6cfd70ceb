//! WebSocket HTTP handler for the web layer.
//!
//! This module contains only the axum upgrade handler and the transport
//! adapter. The connection manager and its pumps live in the `ws` crate.

pub(crate) mod handler;
pub(crate) mod socket;
