use super::{AdapterConfig, Keypress, UserControlCode};
use std::time::{Duration, Instant};

/// Turns USER_CONTROL_PRESSED and USER_CONTROL_RELEASED messages into
/// keypress samples.
///
/// With a repeat rate of 0, a press is reported with duration 0, every
/// repeated press of the held button again with duration 0, and the release
/// with the (nonzero) time the button was held. With a nonzero repeat rate,
/// the press is reported with duration 0 and then again every repeat interval
/// with the time held so far, until the button is released.
pub struct KeyTracker {
    repeat_rate: Duration,
    release_delay: Duration,
    double_tap_timeout: Duration,
    held: Option<Held>,
    last_release: Option<(UserControlCode, Instant)>,
}

struct Held {
    code: UserControlCode,
    pressed: Instant,
    last_seen: Instant,
    next_repeat: Option<Instant>,
}

impl KeyTracker {
    pub fn new(config: &AdapterConfig) -> Self {
        KeyTracker {
            repeat_rate: Duration::from_millis(config.button_repeat_rate_ms.into()),
            release_delay: Duration::from_millis(config.button_release_delay_ms.into()),
            double_tap_timeout: Duration::from_millis(config.double_tap_timeout_ms.into()),
            held: None,
            last_release: None,
        }
    }

    pub fn press(&mut self, code: UserControlCode, now: Instant, emit: &mut dyn FnMut(Keypress)) {
        if let Some(held) = &mut self.held {
            if held.code == code {
                held.last_seen = now;
                if self.repeat_rate.is_zero() {
                    emit(Keypress::new(code, 0));
                }
                return;
            }
        }

        if self.held.is_some() {
            self.release(now, emit);
        }

        if let Some((last, released)) = self.last_release {
            if last == code && now.saturating_duration_since(released) < self.double_tap_timeout {
                log::debug!("{code}: ignoring double tap");
                return;
            }
        }

        emit(Keypress::new(code, 0));

        self.held = Some(Held {
            code,
            pressed: now,
            last_seen: now,
            next_repeat: if self.repeat_rate.is_zero() {
                None
            } else {
                Some(now + self.repeat_rate)
            },
        });
    }

    pub fn release(&mut self, now: Instant, emit: &mut dyn FnMut(Keypress)) {
        if let Some(held) = self.held.take() {
            emit(Keypress::new(held.code, millis(now - held.pressed)));

            self.last_release = Some((held.code, now));
        }
    }

    /// Generate repeats and release a button the remote has gone quiet on
    pub fn expire(&mut self, now: Instant, emit: &mut dyn FnMut(Keypress)) {
        let Some(held) = &mut self.held else {
            return;
        };

        if now >= held.last_seen + self.release_delay {
            log::trace!("{}: no repeat from remote, releasing", held.code);
            self.release(now, emit);
            return;
        }

        if let Some(next) = held.next_repeat {
            if now >= next {
                held.next_repeat = Some(now + self.repeat_rate);
                emit(Keypress::new(held.code, millis(now - held.pressed)));
            }
        }
    }

    /// When [`KeyTracker::expire`] next has something to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.held.as_ref().map(|held| {
            let release = held.last_seen + self.release_delay;

            match held.next_repeat {
                Some(repeat) => repeat.min(release),
                None => release,
            }
        })
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis())
        .unwrap_or(u32::MAX)
        .max(1)
}
