//! HDMI-CEC bus access. The daemon only needs a narrow slice of CEC: find an
//! adapter, receive remote control key presses, ask the TV whether it is on
//! and claim the active source.

use std::{fmt, io, path::PathBuf};

mod codes;
mod keypress;
mod linux;

pub use codes::UserControlCode;
pub use keypress::KeyTracker;
pub use linux::{KernelAdapter, KernelCec};

/// One raw sample reported by the bus: a button and how long it has been held
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Keypress {
    pub code: UserControlCode,
    pub duration_ms: u32,
}

impl Keypress {
    pub fn new(code: UserControlCode, duration_ms: u32) -> Self {
        Keypress { code, duration_ms }
    }
}

/// Sink for keypress samples. The adapter never invokes it concurrently
/// with itself.
pub type KeypressCallback = Box<dyn FnMut(Keypress) + Send>;

/// Called at most once, when the adapter stops receiving because of an error
/// it cannot recover from, such as the adapter being unplugged
pub type ErrorCallback = Box<dyn FnOnce(io::Error) + Send>;

/// CEC logical address (0 to 15)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LogicalAddress(pub u8);

impl LogicalAddress {
    pub const TV: LogicalAddress = LogicalAddress(0);
    pub const BROADCAST: LogicalAddress = LogicalAddress(15);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerStatus {
    On,
    Standby,
    InTransitionStandbyToOn,
    InTransitionOnToStandby,
    Unknown,
}

impl From<u8> for PowerStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => PowerStatus::On,
            1 => PowerStatus::Standby,
            2 => PowerStatus::InTransitionStandbyToOn,
            3 => PowerStatus::InTransitionOnToStandby,
            _ => PowerStatus::Unknown,
        }
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerStatus::On => "on",
            PowerStatus::Standby => "standby",
            PowerStatus::InTransitionStandbyToOn => "in transition from standby to on",
            PowerStatus::InTransitionOnToStandby => "in transition from on to standby",
            PowerStatus::Unknown => "unknown",
        })
    }
}

/// A CEC adapter found on the system, not yet opened
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AdapterDescriptor {
    /// Name of the adapter, usually "cec" followed by a number
    pub name: String,
    /// Path of the character device
    pub path: PathBuf,
    /// Name of the kernel driver, if known
    pub driver: String,
}

/// Settings handed to the adapter when opening it
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AdapterConfig {
    /// Name shown on the TV's menu for this device
    pub osd_name: String,
    /// Interval between repeated samples of a held button; 0 disables repeats
    pub button_repeat_rate_ms: u32,
    /// A held button is released after this long without a repeat from the remote
    pub button_release_delay_ms: u32,
    /// A second press of the same button within this time after release is ignored
    pub double_tap_timeout_ms: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            osd_name: String::from("ceckey"),
            button_repeat_rate_ms: 0,
            button_release_delay_ms: 500,
            double_tap_timeout_ms: 200,
        }
    }
}

/// Access to the CEC adapters of a system
pub trait CecBus {
    type Adapter: CecAdapter + Send + 'static;

    /// List the adapters present. An empty list is not an error.
    fn discover(&self) -> io::Result<Vec<AdapterDescriptor>>;

    /// Open an adapter. The callback receives keypress samples until the
    /// returned adapter is dropped or `on_error` is called; dropping the
    /// adapter closes it.
    fn open(
        &self,
        descriptor: &AdapterDescriptor,
        config: &AdapterConfig,
        callback: KeypressCallback,
        on_error: ErrorCallback,
    ) -> io::Result<Self::Adapter>;
}

/// An open CEC adapter
pub trait CecAdapter {
    /// Ask a device on the bus for its power status
    fn power_status(&mut self, address: LogicalAddress) -> io::Result<PowerStatus>;

    /// Tell the TV to switch to our input
    fn set_active_source(&mut self) -> io::Result<()>;
}
