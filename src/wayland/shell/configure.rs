//! Configure/acknowledge bookkeeping
//!
//! Roles negotiating their state with the client (toplevels and popups) send their
//! suggestions as *configures*, each tagged with a fresh [`Serial`]. The client answers
//! with `ack_configure(serial)`, which supersedes every configure sent before that one.
//!
//! [`ConfigureQueue`] is the FIFO of configures that were sent but not acknowledged yet.
//! [`ConfigureTracker`] layers the role bookkeeping on top of it: the state the server
//! wants to send next, the last acknowledged state and the current one.

use std::collections::VecDeque;

use crate::utils::{Serial, SerialCounter};

/// A configure sent to the client
#[derive(Debug, Clone, PartialEq)]
pub struct Configure<S> {
    /// Serial the client has to acknowledge
    pub serial: Serial,
    /// The state suggested by this configure
    pub state: S,
}

/// Failure to match an acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigureError {
    /// The acknowledged serial does not match any pending configure
    #[error("serial {0} does not match any pending configure")]
    UnknownSerial(Serial),
}

/// The configures sent to a role and not acknowledged yet, oldest first
#[derive(Debug)]
pub struct ConfigureQueue<S> {
    pending: VecDeque<Configure<S>>,
}

impl<S> Default for ConfigureQueue<S> {
    fn default() -> Self {
        ConfigureQueue {
            pending: VecDeque::new(),
        }
    }
}

impl<S> ConfigureQueue<S> {
    /// Allocate a serial for `state` and append it to the queue
    pub fn send(&mut self, serials: &SerialCounter, state: S) -> Serial {
        let serial = serials.next_serial();
        debug_assert!(self.pending.back().map(|c| c.serial < serial).unwrap_or(true));
        self.pending.push_back(Configure { serial, state });
        serial
    }

    /// Match an acknowledgement
    ///
    /// Every configure up to and including `serial` is removed from the queue, and the one
    /// carrying `serial` is returned. An unknown serial leaves the queue untouched.
    pub fn ack(&mut self, serial: Serial) -> Result<Configure<S>, ConfigureError> {
        let idx = self
            .pending
            .iter()
            .position(|c| c.serial == serial)
            .ok_or(ConfigureError::UnknownSerial(serial))?;
        self.pending
            .drain(..=idx)
            .last()
            .ok_or(ConfigureError::UnknownSerial(serial))
    }

    /// The most recently sent configure
    pub fn last(&self) -> Option<&Configure<S>> {
        self.pending.back()
    }

    /// Serials still waiting for an acknowledgement, oldest first
    pub fn serials(&self) -> impl Iterator<Item = Serial> + '_ {
        self.pending.iter().map(|c| c.serial)
    }

    /// Number of configures waiting for an acknowledgement
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether every configure has been acknowledged
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every pending configure
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Configure state of a role
#[derive(Debug)]
pub struct ConfigureTracker<S> {
    /// Has the client acknowledged at least one configure
    pub configured: bool,
    /// Serial of the last acknowledged configure
    pub configure_serial: Option<Serial>,
    /// Has the initial configure been sent
    pub initial_configure_sent: bool,
    queue: ConfigureQueue<S>,
    /// The state the server wants to send with the next configure
    pub server_pending: Option<S>,
    /// The state of the last acknowledged configure
    pub last_acked: Option<S>,
    /// The state currently in effect
    pub current: S,
}

impl<S: Default> Default for ConfigureTracker<S> {
    fn default() -> Self {
        ConfigureTracker {
            configured: false,
            configure_serial: None,
            initial_configure_sent: false,
            queue: ConfigureQueue::default(),
            server_pending: None,
            last_acked: None,
            current: S::default(),
        }
    }
}

impl<S: Clone + PartialEq> ConfigureTracker<S> {
    /// The state the client will know about once it processed every configure sent so far
    pub fn current_server_state(&self) -> &S {
        self.queue
            .last()
            .map(|c| &c.state)
            .or(self.last_acked.as_ref())
            .unwrap_or(&self.current)
    }

    /// Whether the server-side pending state differs from what was last sent
    pub fn has_pending_changes(&self) -> bool {
        self.server_pending
            .as_ref()
            .map(|s| s != self.current_server_state())
            .unwrap_or(false)
    }

    /// Mutate the state the next configure will carry
    pub fn with_pending_state<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut S) -> T,
    {
        let pending = match self.server_pending.take() {
            Some(pending) => pending,
            None => self.current_server_state().clone(),
        };
        f(self.server_pending.insert(pending))
    }

    /// Send a configure if it would tell the client something new
    ///
    /// The first configure is always sent.
    pub fn send_pending(&mut self, serials: &SerialCounter) -> Option<Configure<S>> {
        if self.initial_configure_sent && !self.has_pending_changes() {
            self.server_pending = None;
            return None;
        }
        Some(self.send(serials))
    }

    /// Send a configure unconditionally
    pub fn send(&mut self, serials: &SerialCounter) -> Configure<S> {
        let state = self
            .server_pending
            .take()
            .unwrap_or_else(|| self.current_server_state().clone());
        let serial = self.queue.send(serials, state.clone());
        self.initial_configure_sent = true;
        Configure { serial, state }
    }

    /// Handle an acknowledgement from the client
    pub fn ack(&mut self, serial: Serial) -> Result<Configure<S>, ConfigureError> {
        let configure = self.queue.ack(serial)?;
        self.configured = true;
        self.configure_serial = Some(serial);
        self.last_acked = Some(configure.state.clone());
        self.current = configure.state.clone();
        Ok(configure)
    }

    /// Forget the whole negotiation, as after the role got unmapped
    pub fn reset(&mut self)
    where
        S: Default,
    {
        *self = ConfigureTracker::default();
    }

    /// The queue of configures waiting for an acknowledgement
    pub fn pending_configures(&self) -> &ConfigureQueue<S> {
        &self.queue
    }
}
