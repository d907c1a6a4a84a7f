//! Turn HDMI-CEC remote control button presses into keyboard events.
//!
//! Samples arrive from a CEC adapter as `(code, duration)` pairs, are
//! resolved through a [`bindings::BindingTable`], filtered by the
//! [`debounce::Debouncer`] and emitted as key clicks on a uinput device. The
//! [`daemon::Daemon`] owns both devices.

pub mod bindings;
pub mod cec;
pub mod daemon;
pub mod debounce;
mod error;
pub mod uinput;

pub use error::Error;
