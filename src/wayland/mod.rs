//! Protocol-related utilities
//!
//! This module contains the handlers implementing the wayland protocol extensions supported
//! by this crate, and the request and event types clients exchange with them.
//!
//! - [`compositor`] handles `wl_surface`: double-buffered state, commits and the surface tree.
//! - [`shell`] handles the surface roles, most notably the `xdg_shell` ones.
//! - [`seat`] handles the pointer focus, the cursor image and drag and drop icons.
//! - [`session_lock`] handles `ext_session_lock_v1`.
//!
//! Requests are described by [`protocol::Request`] and fed to
//! [`Compositor::dispatch`](crate::state::Compositor::dispatch). Events meant for clients are
//! queued per client as [`protocol::ClientEvent`]s. [`frontend`] binds all of this to the
//! `wayland-server` globals.

pub mod compositor;
pub mod frontend;
pub mod protocol;
pub mod seat;
pub mod session_lock;
pub mod shell;
