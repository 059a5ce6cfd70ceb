//! Realtime update broadcast over WebSocket connections.
//!
//! This crate keeps many connected clients up to date without polling. A
//! content producer calls [`Manager::broadcast`] after committing a change and
//! every live client receives a freshly rendered payload, computed from the
//! last state that client has seen.
//!
//! # Architecture
//!
//! - **Single-writer event loop**: [`Manager::start`] runs the only task allowed
//!   to mutate the set of live connections. Registration, unregistration and
//!   broadcast requests are passed to it over channels, so the set needs no lock.
//! - **Two pumps per connection**: the write pump is the only writer of the
//!   transport (payloads, keep-alive pings, pong replies); the read pump is the
//!   only reader and tears the connection down on any read error.
//! - **Coalescing broadcasts**: `broadcast()` never blocks. When a refresh is
//!   already pending further calls are absorbed by it. Every pass re-renders
//!   current state, so a missed update heals on the next pass. Only one pass
//!   runs at a time; requests made during it fold into one follow-up pass.
//! - **Bounded everywhere**: each connection has a bounded outbound queue and a
//!   send waits at most `send_timeout` for room; a slow client only loses that
//!   one update and stays registered. Sends in flight across all connections
//!   never exceed `max_concurrent_sends`.
//!
//! # Lifecycle
//!
//! 1. The HTTP layer authenticates the client and upgrades the connection
//! 2. It calls [`Manager::register_connection`] with the client id, the last
//!    seen marker and the transport
//! 3. The event loop adds the connection and sends it its current state
//! 4. Producers call [`Manager::broadcast`] (directly or through
//!    [`BroadcastHandler`]) and every connection gets a new render
//! 5. A transport error, the peer closing, or manager shutdown removes the
//!    connection and fires its done signal
//!
//! # Modules
//!
//! - `connection`: the per-client session object and its two pumps
//! - `manager`: the event loop and the public trigger API
//! - `registry`: the connection set owned by the event loop
//! - `transport`: frames and the transport traits the HTTP layer implements
//! - `render`: the injected render callback

pub mod connection;
pub mod domain_event_handler;
pub mod error;
pub mod manager;
pub mod render;
pub mod settings;
pub mod transport;

mod registry;

#[cfg(test)]
mod testing;

pub use connection::{ClientId, Connection, ConnectionId, Marker, SendOutcome};
pub use domain_event_handler::BroadcastHandler;
pub use error::Error;
pub use manager::Manager;
pub use render::{Render, RenderError};
pub use settings::Settings;
pub use transport::{Frame, FrameSink, FrameStream, Transport};
