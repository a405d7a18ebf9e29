//! Animation-finished listeners.
//!
//! A unit raises its completion interrupt when a once-notify animation ends.
//! The host's interrupt plumbing calls `MulticolorLed::handle_interrupt`,
//! which fans the event out to every registered listener.

use std::fmt;

use serde::Serialize;

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Identifies the unit whose animation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AnimationFinished {
    pub bus_address: u8,
    pub position: u32,
}

impl fmt::Display for AnimationFinished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "animation finished on bus 0x{:02X} unit {}",
            self.bus_address, self.position
        )
    }
}

type Listener<T> = Box<dyn Fn(&T)>;

/// Ordered listener list; `T` is the payload passed to each listener.
pub(crate) struct Listeners<T> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Listeners {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Listeners<T> {
    pub(crate) fn add(&mut self, listener: impl Fn(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Invoke every listener in registration order.
    pub(crate) fn emit(&self, payload: &T) {
        for (_, listener) in &self.entries {
            listener(payload);
        }
    }
}
