//! Synthetic keyboard through /dev/uinput

use evdev::{uinput::VirtualDevice, AttributeSet, EventType, InputEvent, KeyCode};
use std::{collections::HashSet, io};

/// Creates the keyboard device
pub trait OutputBackend {
    type Device: KeySink + Send + 'static;

    /// Create a keyboard which can emit exactly the given keys. Dropping the
    /// device destroys it.
    fn create(&self, keys: &HashSet<KeyCode>) -> io::Result<Self::Device>;
}

/// A keyboard device
pub trait KeySink {
    /// Press and release a key
    fn click(&mut self, key: KeyCode) -> io::Result<()>;
}

/// Keyboards created with uinput
pub struct Uinput {
    name: String,
}

impl Uinput {
    pub fn new(name: &str) -> Self {
        Uinput {
            name: name.to_owned(),
        }
    }
}

impl OutputBackend for Uinput {
    type Device = Keyboard;

    fn create(&self, keys: &HashSet<KeyCode>) -> io::Result<Keyboard> {
        let mut set = AttributeSet::<KeyCode>::new();

        for key in keys {
            set.insert(*key);
        }

        let device = VirtualDevice::builder()?
            .name(&self.name)
            .with_keys(&set)?
            .build()?;

        log::debug!("created uinput device {} with {} keys", self.name, keys.len());

        Ok(Keyboard { device })
    }
}

pub struct Keyboard {
    device: VirtualDevice,
}

impl KeySink for Keyboard {
    fn click(&mut self, key: KeyCode) -> io::Result<()> {
        // emit() adds the SYN_REPORT
        self.device
            .emit(&[InputEvent::new(EventType::KEY.0, key.code(), 1)])?;
        self.device
            .emit(&[InputEvent::new(EventType::KEY.0, key.code(), 0)])
    }
}
