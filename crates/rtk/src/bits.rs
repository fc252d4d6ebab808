//! Event groups.
//!
//! An [`EventBits`] group holds up to 32 flag bits. Producers (button
//! handlers, interrupt shims, other tasks) set bits; a consumer task blocks
//! until any bit of interest is set and takes those bits, clearing them on
//! read.

use core::time::Duration;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct EventBits {
    bits: Mutex<u32>,
    changed: Condvar,
}

impl EventBits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `bits` and wake any waiting task. Returns the group value after
    /// the update.
    pub fn set(&self, bits: u32) -> u32 {
        let mut value = self.bits.lock();
        *value |= bits;
        let current = *value;
        drop(value);
        self.changed.notify_all();
        current
    }

    /// Clear `bits`. Returns the group value before the update.
    pub fn clear(&self, bits: u32) -> u32 {
        let mut value = self.bits.lock();
        let previous = *value;
        *value &= !bits;
        previous
    }

    pub fn get(&self) -> u32 {
        *self.bits.lock()
    }

    /// Wait until any bit in `mask` is set, then clear and return the set
    /// bits within `mask`.
    ///
    /// `None` waits forever. On timeout the result is `0` and nothing is
    /// cleared.
    pub fn wait_any(&self, mask: u32, timeout: Option<Duration>) -> u32 {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut value = self.bits.lock();
        loop {
            let hit = *value & mask;
            if hit != 0 {
                *value &= !hit;
                return hit;
            }
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut value, deadline).timed_out() {
                        let hit = *value & mask;
                        *value &= !hit;
                        return hit;
                    }
                }
                None => self.changed.wait(&mut value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_returns_and_clears_matched_bits() {
        let group = EventBits::new();
        group.set(0b101);

        assert_eq!(group.wait_any(0b001, Some(Duration::ZERO)), 0b001);
        // Bits outside the mask are left for other readers.
        assert_eq!(group.get(), 0b100);
    }

    #[test]
    fn wait_times_out_with_zero() {
        let group = EventBits::new();
        group.set(0b1000);

        assert_eq!(group.wait_any(0b0111, Some(Duration::from_millis(10))), 0);
        assert_eq!(group.get(), 0b1000);
    }

    #[test]
    fn setter_wakes_blocked_waiter() {
        let group = Arc::new(EventBits::new());

        let waiter = {
            let group = Arc::clone(&group);
            thread::spawn(move || group.wait_any(0b110, None))
        };

        thread::sleep(Duration::from_millis(10));
        group.set(0b010);

        assert_eq!(waiter.join().unwrap(), 0b010);
        assert_eq!(group.get(), 0);
    }

    #[test]
    fn clear_reports_previous_value() {
        let group = EventBits::new();
        group.set(0b11);

        assert_eq!(group.clear(0b01), 0b11);
        assert_eq!(group.get(), 0b10);
    }
}
