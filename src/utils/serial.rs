use std::sync::atomic::{AtomicU32, Ordering};

/// A serial type, whose comparison takes into account the wrapping-around behavior of the
/// underlying counter.
///
/// Two serials are compared as sequence numbers: if they are more than half of the `u32`
/// range apart, the counter is assumed to have wrapped between them.
#[derive(Debug, Copy, Clone, Hash)]
pub struct Serial(pub(crate) u32);

impl PartialEq for Serial {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Serial {}

impl PartialOrd for Serial {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let distance = if self.0 > other.0 {
            self.0 - other.0
        } else {
            other.0 - self.0
        };
        if distance < u32::MAX / 2 {
            self.0.partial_cmp(&other.0)
        } else {
            // wrap-around occurred, invert comparison
            other.0.partial_cmp(&self.0)
        }
    }
}

impl From<u32> for Serial {
    #[inline]
    fn from(n: u32) -> Self {
        Serial(n)
    }
}

impl From<Serial> for u32 {
    #[inline]
    fn from(serial: Serial) -> u32 {
        serial.0
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serial {
    /// Checks if a serial was generated after or is equal to another given serial
    pub fn is_no_older_than(&self, other: &Serial) -> bool {
        other <= self
    }
}

/// A counter for generating serials, for use in the client protocol
///
/// One counter is owned by each [`Compositor`](crate::state::Compositor), which hands
/// it down to every configure queue it drives. Serials handed out by a single counter
/// are unique for as long as less than `u32::MAX / 2` of them are in flight.
///
/// The counter will wrap around on overflow, skipping `0`.
#[derive(Debug)]
pub struct SerialCounter {
    serial: AtomicU32,
}

impl Default for SerialCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialCounter {
    /// Create a new counter, starting at `1`
    pub fn new() -> Self {
        SerialCounter {
            serial: AtomicU32::new(1),
        }
    }

    /// Create a counter whose next serial is `initial`
    ///
    /// Mostly useful to exercise the wrap-around behaviour.
    pub fn starting_at(initial: u32) -> Self {
        SerialCounter {
            serial: AtomicU32::new(initial),
        }
    }

    /// Retrieve the next serial from the counter
    pub fn next_serial(&self) -> Serial {
        let _ = self
            .serial
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::SeqCst);
        Serial(self.serial.fetch_add(1, Ordering::AcqRel))
    }
}
