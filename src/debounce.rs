//! Decide which keypress samples become key clicks.
//!
//! With a button repeat rate of 0, a short press arrives as two samples, the
//! first with duration 0 and the second with the time held; a long press
//! arrives as a run of samples all with duration 0. With a nonzero repeat
//! rate every sample counts, its duration growing from 0 until release.
//! Non-repeatable bindings then only click when the binding changes.

use crate::{
    bindings::{BindingEntry, BindingTable},
    cec::Keypress,
};
use evdev::KeyCode;
use std::sync::Arc;

pub struct Debouncer {
    table: Arc<BindingTable>,
    repeat_rate_ms: u32,
    last_entry: Option<BindingEntry>,
}

impl Debouncer {
    pub fn new(table: Arc<BindingTable>, repeat_rate_ms: u32) -> Self {
        Debouncer {
            table,
            repeat_rate_ms,
            last_entry: None,
        }
    }

    /// Process one sample, returning the key to click, if any
    pub fn feed(&mut self, press: Keypress) -> Option<KeyCode> {
        let Some(entry) = self.table.resolve(press.code) else {
            log::debug!("{}: no binding", press.code);
            return None;
        };

        let accepted = self.repeat_rate_ms != 0 || press.duration_ms == 0;
        let click = accepted && (entry.repeatable || self.last_entry != Some(entry));

        // updated even when the sample is gated
        self.last_entry = Some(entry);

        if click {
            log::debug!("{} ({}ms): click", press.code, press.duration_ms);
            Some(entry.key)
        } else {
            log::debug!("{} ({}ms): ignored", press.code, press.duration_ms);
            None
        }
    }

    #[cfg(test)]
    fn last_entry(&self) -> Option<BindingEntry> {
        self.last_entry
    }
}
