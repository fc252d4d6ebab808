//! Discrete on/off indicator outputs.

use std::sync::atomic::{AtomicU32, Ordering};

use log::warn;

/// Largest number of indicators a bank can drive.
pub const MAX_INDICATORS: u8 = 32;

/// Output sink for a row of indicators addressed by index.
///
/// There is no read path on real hardware; [`IndicatorSink::snapshot`] is
/// the last value written.
pub trait IndicatorSink: Send + Sync {
    fn set(&self, index: u8, on: bool);
    fn toggle(&self, index: u8);
    fn all_off(&self);
    /// Bitmask of the indicators currently on.
    fn snapshot(&self) -> u32;

    fn is_on(&self, index: u8) -> bool {
        index < MAX_INDICATORS && self.snapshot() & (1 << index) != 0
    }
}

/// Indicator bank kept in a single atomic bitmask.
#[derive(Debug)]
pub struct IndicatorBank {
    count: u8,
    state: AtomicU32,
}

impl IndicatorBank {
    pub fn new(count: u8) -> Self {
        Self {
            count: count.min(MAX_INDICATORS),
            state: AtomicU32::new(0),
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    fn mask(&self, index: u8) -> Option<u32> {
        if index < self.count {
            Some(1 << index)
        } else {
            warn!("indicator {index} out of range (bank has {})", self.count);
            None
        }
    }
}

impl IndicatorSink for IndicatorBank {
    fn set(&self, index: u8, on: bool) {
        if let Some(mask) = self.mask(index) {
            if on {
                self.state.fetch_or(mask, Ordering::SeqCst);
            } else {
                self.state.fetch_and(!mask, Ordering::SeqCst);
            }
        }
    }

    fn toggle(&self, index: u8) {
        if let Some(mask) = self.mask(index) {
            self.state.fetch_xor(mask, Ordering::SeqCst);
        }
    }

    fn all_off(&self) {
        self.state.store(0, Ordering::SeqCst);
    }

    fn snapshot(&self) -> u32 {
        self.state.load(Ordering::SeqCst)
    }
}
