#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # Trellis: surface roles for wayland compositors
//!
//! This crate implements the part of a wayland compositor deciding what client surfaces are
//! and where they go: the role a surface plays (application window, popup, cursor, drag
//! icon, lock screen), the double-buffered surface state, and the configure/acknowledge
//! handshake through which the compositor and its clients agree on window states.
//!
//! It does not draw anything. Client messages reach a [`state::Compositor`] as
//! [`wayland::protocol::Request`]s, either through the `wayland-server` bindings of
//! [`wayland::frontend`] or fed directly by a headless embedder, and the resulting
//! [`wayland::protocol::ClientEvent`]s go back to the clients. The rendering and input layers
//! follow the [`state::ShellEvent`] notifications and read the surface stack through the
//! [`state::Compositor`] or a [`state::StateReader`].
//!
//! ## Structure of the crate
//!
//! - [`state`] holds the compositor context and its public entry points.
//! - [`wayland`] contains the protocol handlers, one module per protocol, and their
//!   `wayland-server` bindings.
//! - [`output`] tracks the outputs surfaces are placed on.
//! - [`config`] holds the policy knobs of the shell.
//!
//! ## General principles
//!
//! ### State handling
//!
//! All the state lives in a single [`state::State`] behind a lock. Every request or server
//! action is a synchronous state transition taking that lock once. Notifications are queued
//! during the transition and delivered to subscribers after the lock is released, so they
//! can call back into the compositor.
//!
//! A client breaking the protocol gets a [`wayland::protocol::ClientEvent::Error`] and is
//! disconnected, its resources being destroyed as if it had gone away.
//!
//! ### Logging
//!
//! Trellis makes extensive use of [`tracing`] for its internal logging.
//!
//! For release builds it is recommended to limit the log level during compile time.
//! This can be done by adding a dependency to [`tracing`] and enabling the corresponding features.
//! For example to enable `trace` messages for debug builds, but limit release builds to `debug` add
//! the following in your binary crate `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tracing = { version = "0.1", features = ["max_level_trace", "release_max_level_debug"] }
//! ```
//!
//! The hot paths (commits, popup placement) are additionally annotated for [`profiling`].

pub mod config;
pub mod output;
pub mod state;
pub mod utils;
pub mod wayland;

/// Reexports of the crates used in the public API
pub mod reexports {
    pub use wayland_protocols;
    pub use wayland_server;
}
