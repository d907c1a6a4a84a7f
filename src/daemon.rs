//! Own the CEC adapter and the keyboard device, and connect the two

use crate::{
    bindings::BindingTable,
    cec::{
        AdapterConfig, CecAdapter, CecBus, ErrorCallback, Keypress, LogicalAddress, PowerStatus,
    },
    debounce::Debouncer,
    uinput::{KeySink, OutputBackend},
    Error,
};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

/// When to make the TV switch to our input on start
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DisableActivateSource {
    /// Always activate the source
    #[default]
    Never,
    /// Never activate the source
    Always,
    /// Activate the source only if the TV is already on
    IfTvOff,
}

impl fmt::Display for DisableActivateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisableActivateSource::Never => "never",
            DisableActivateSource::Always => "always",
            DisableActivateSource::IfTvOff => "if_tv_off",
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct DaemonConfig {
    pub adapter: AdapterConfig,
    pub disable_activate_source: DisableActivateSource,
}

enum State<A, D> {
    Stopped,
    /// The keyboard exists but the adapter could not be opened
    OutputOnly { device: Arc<Mutex<D>> },
    Running { adapter: A, device: Arc<Mutex<D>> },
}

impl<A, D> Default for State<A, D> {
    fn default() -> Self {
        State::Stopped
    }
}

/// Brings the keyboard and the CEC adapter up and down. Both `start()` and
/// `stop()` may be called repeatedly and from different threads; the devices
/// are stopped when the daemon is dropped.
///
/// If the adapter fails while running, the error is kept for `failure()` and
/// the failure hook is called from the adapter's thread. The daemon does not
/// stop itself; that is left to whoever owns it.
pub struct Daemon<B: CecBus, O: OutputBackend> {
    bus: B,
    output: O,
    table: Arc<BindingTable>,
    config: DaemonConfig,
    state: Mutex<State<B::Adapter, O::Device>>,
    failure: Arc<Mutex<Option<Error>>>,
    on_failure: Arc<dyn Fn() + Send + Sync>,
}

impl<B: CecBus, O: OutputBackend> Daemon<B, O> {
    pub fn new(bus: B, output: O, table: BindingTable, config: DaemonConfig) -> Self {
        Daemon {
            bus,
            output,
            table: Arc::new(table),
            config,
            state: Mutex::new(State::Stopped),
            failure: Arc::new(Mutex::new(None)),
            on_failure: Arc::new(|| ()),
        }
    }

    /// Call `hook` when the adapter fails while running
    pub fn with_failure_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_failure = Arc::new(hook);
        self
    }

    /// The error the adapter failed with, if any. Taking it clears it.
    pub fn failure(&self) -> Option<Error> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock(), State::Running { .. })
    }

    pub fn start(&self) -> Result<(), Error> {
        let mut state = self.lock();

        let device = match std::mem::take(&mut *state) {
            running @ State::Running { .. } => {
                *state = running;
                log::warn!("already started");
                return Ok(());
            }
            State::OutputOnly { device } => device,
            State::Stopped => {
                let keys = self.table.output_keys();
                let device = self
                    .output
                    .create(&keys)
                    .map_err(Error::external("failed to create keyboard"))?;

                log::info!("keyboard created with {} keys", keys.len());

                Arc::new(Mutex::new(device))
            }
        };

        // from here on a failure leaves the keyboard for stop() to destroy
        *state = State::OutputOnly {
            device: Arc::clone(&device),
        };

        let adapters = self
            .bus
            .discover()
            .map_err(Error::external("failed to discover cec adapters"))?;

        let Some(descriptor) = adapters.first() else {
            return Err(Error::NoAdaptersFound);
        };

        let mut debouncer = Debouncer::new(
            Arc::clone(&self.table),
            self.config.adapter.button_repeat_rate_ms,
        );
        let sink = Arc::clone(&device);

        let callback = Box::new(move |press: Keypress| {
            if let Some(key) = debouncer.feed(press) {
                let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);

                if let Err(e) = sink.click(key) {
                    log::error!("failed to emit key {}: {e}", key.code());
                }
            }
        });

        let on_error: ErrorCallback = Box::new({
            let failure = Arc::clone(&self.failure);
            let hook = Arc::clone(&self.on_failure);
            let context = descriptor.path.display().to_string();

            move |source: std::io::Error| {
                *failure.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(Error::External { context, source });
                hook();
            }
        });

        let mut adapter = self
            .bus
            .open(descriptor, &self.config.adapter, callback, on_error)
            .map_err(Error::external(descriptor.path.display().to_string()))?;

        log::info!("{}: opened {}", descriptor.name, descriptor.path.display());

        self.activate_source(&mut adapter)
            .map_err(Error::external(descriptor.path.display().to_string()))?;

        *state = State::Running { adapter, device };

        Ok(())
    }

    pub fn stop(&self) {
        let mut state = self.lock();

        match std::mem::take(&mut *state) {
            State::Stopped => {
                log::debug!("already stopped");
            }
            State::OutputOnly { device } => {
                drop(device);
                log::info!("keyboard destroyed");
            }
            State::Running { adapter, device } => {
                // closing the adapter joins its callback, so the keyboard is
                // not in use when it goes
                drop(adapter);
                drop(device);
                log::info!("stopped");
            }
        }
    }

    fn activate_source(&self, adapter: &mut B::Adapter) -> std::io::Result<()> {
        let activate = match self.config.disable_activate_source {
            DisableActivateSource::Never => true,
            DisableActivateSource::Always => false,
            DisableActivateSource::IfTvOff => {
                let status = adapter.power_status(LogicalAddress::TV)?;

                log::info!("tv power status: {status}");

                status == PowerStatus::On
            }
        };

        if activate {
            log::info!("setting active source");
            adapter.set_active_source()
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<B::Adapter, O::Device>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: CecBus, O: OutputBackend> Drop for Daemon<B, O> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bindings::default_bindings,
        cec::{AdapterDescriptor, KeypressCallback, UserControlCode},
    };
    use evdev::KeyCode;
    use std::{
        collections::HashSet,
        io::{self, ErrorKind},
        path::PathBuf,
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct Calls {
        discovered: AtomicUsize,
        opened: AtomicUsize,
        closed: AtomicUsize,
        power_queries: AtomicUsize,
        activated: AtomicUsize,
        created: AtomicUsize,
        destroyed: AtomicUsize,
        keys: Mutex<Option<HashSet<KeyCode>>>,
        clicks: Mutex<Vec<KeyCode>>,
        callback: Mutex<Option<KeypressCallback>>,
        on_error: Mutex<Option<ErrorCallback>>,
        fail_open: AtomicBool,
        fail_create: AtomicBool,
    }

    impl Calls {
        fn count(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }

        fn press(&self, code: UserControlCode, duration_ms: u32) {
            let mut callback = self.callback.lock().unwrap();

            (callback.as_mut().unwrap())(Keypress::new(code, duration_ms));
        }

        fn fail(&self, err: io::Error) {
            let on_error = self.on_error.lock().unwrap().take();

            (on_error.unwrap())(err);
        }
    }

    struct MockBus {
        calls: Arc<Calls>,
        adapters: usize,
        tv: PowerStatus,
    }

    struct MockAdapter {
        calls: Arc<Calls>,
        tv: PowerStatus,
    }

    impl CecBus for MockBus {
        type Adapter = MockAdapter;

        fn discover(&self) -> io::Result<Vec<AdapterDescriptor>> {
            self.calls.discovered.fetch_add(1, Ordering::SeqCst);

            Ok((0..self.adapters)
                .map(|n| AdapterDescriptor {
                    name: format!("cec{n}"),
                    path: PathBuf::from(format!("/dev/cec{n}")),
                    driver: String::from("mock"),
                })
                .collect())
        }

        fn open(
            &self,
            descriptor: &AdapterDescriptor,
            _config: &AdapterConfig,
            callback: KeypressCallback,
            on_error: ErrorCallback,
        ) -> io::Result<MockAdapter> {
            assert_eq!(descriptor.name, "cec0");

            if self.calls.fail_open.load(Ordering::SeqCst) {
                return Err(io::Error::from(ErrorKind::PermissionDenied));
            }

            self.calls.opened.fetch_add(1, Ordering::SeqCst);
            *self.calls.callback.lock().unwrap() = Some(callback);
            *self.calls.on_error.lock().unwrap() = Some(on_error);

            Ok(MockAdapter {
                calls: Arc::clone(&self.calls),
                tv: self.tv,
            })
        }
    }

    impl CecAdapter for MockAdapter {
        fn power_status(&mut self, address: LogicalAddress) -> io::Result<PowerStatus> {
            assert_eq!(address, LogicalAddress::TV);

            self.calls.power_queries.fetch_add(1, Ordering::SeqCst);

            Ok(self.tv)
        }

        fn set_active_source(&mut self) -> io::Result<()> {
            self.calls.activated.fetch_add(1, Ordering::SeqCst);

            Ok(())
        }
    }

    impl Drop for MockAdapter {
        fn drop(&mut self) {
            self.calls.callback.lock().unwrap().take();
            self.calls.on_error.lock().unwrap().take();
            self.calls.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockOutput {
        calls: Arc<Calls>,
    }

    struct MockKeyboard {
        calls: Arc<Calls>,
    }

    impl OutputBackend for MockOutput {
        type Device = MockKeyboard;

        fn create(&self, keys: &HashSet<KeyCode>) -> io::Result<MockKeyboard> {
            if self.calls.fail_create.load(Ordering::SeqCst) {
                return Err(io::Error::from(ErrorKind::NotFound));
            }

            self.calls.created.fetch_add(1, Ordering::SeqCst);
            *self.calls.keys.lock().unwrap() = Some(keys.clone());

            Ok(MockKeyboard {
                calls: Arc::clone(&self.calls),
            })
        }
    }

    impl KeySink for MockKeyboard {
        fn click(&mut self, key: KeyCode) -> io::Result<()> {
            self.calls.clicks.lock().unwrap().push(key);

            Ok(())
        }
    }

    impl Drop for MockKeyboard {
        fn drop(&mut self) {
            self.calls.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn daemon(
        adapters: usize,
        tv: PowerStatus,
        policy: DisableActivateSource,
    ) -> (Daemon<MockBus, MockOutput>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());

        let daemon = Daemon::new(
            MockBus {
                calls: Arc::clone(&calls),
                adapters,
                tv,
            },
            MockOutput {
                calls: Arc::clone(&calls),
            },
            default_bindings(),
            DaemonConfig {
                disable_activate_source: policy,
                ..Default::default()
            },
        );

        (daemon, calls)
    }

    #[test]
    fn start_twice() {
        let (daemon, calls) = daemon(2, PowerStatus::On, DisableActivateSource::Never);

        assert!(!daemon.is_running());
        daemon.start().unwrap();
        assert!(daemon.is_running());
        daemon.start().unwrap();
        assert!(daemon.is_running());

        assert_eq!(Calls::count(&calls.created), 1);
        assert_eq!(Calls::count(&calls.discovered), 1);
        assert_eq!(Calls::count(&calls.opened), 1);
        assert_eq!(Calls::count(&calls.activated), 1);
        assert_eq!(
            *calls.keys.lock().unwrap(),
            Some(default_bindings().output_keys())
        );
    }

    #[test]
    fn stop_when_stopped() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Never);

        daemon.stop();
        assert_eq!(Calls::count(&calls.closed), 0);
        assert_eq!(Calls::count(&calls.destroyed), 0);

        daemon.start().unwrap();
        daemon.stop();
        daemon.stop();
        assert!(!daemon.is_running());

        assert_eq!(Calls::count(&calls.closed), 1);
        assert_eq!(Calls::count(&calls.destroyed), 1);

        // can be started again
        daemon.start().unwrap();
        assert_eq!(Calls::count(&calls.created), 2);
        assert_eq!(Calls::count(&calls.opened), 2);
    }

    #[test]
    fn no_adapters() {
        let (daemon, calls) = daemon(0, PowerStatus::On, DisableActivateSource::Never);

        assert!(matches!(daemon.start(), Err(Error::NoAdaptersFound)));
        assert!(!daemon.is_running());
        assert_eq!(Calls::count(&calls.created), 1);
        assert_eq!(Calls::count(&calls.destroyed), 0);
        assert_eq!(Calls::count(&calls.opened), 0);

        // retrying reuses the keyboard
        assert!(matches!(daemon.start(), Err(Error::NoAdaptersFound)));
        assert_eq!(Calls::count(&calls.created), 1);

        daemon.stop();
        assert_eq!(Calls::count(&calls.destroyed), 1);
        assert_eq!(Calls::count(&calls.closed), 0);
    }

    #[test]
    fn create_fails() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Never);

        calls.fail_create.store(true, Ordering::SeqCst);

        let Err(Error::External { context, source }) = daemon.start() else {
            panic!("start should fail");
        };

        assert_eq!(context, "failed to create keyboard");
        assert_eq!(source.kind(), ErrorKind::NotFound);
        assert!(!daemon.is_running());
        assert_eq!(Calls::count(&calls.discovered), 0);
        assert_eq!(Calls::count(&calls.opened), 0);

        daemon.stop();
        assert_eq!(Calls::count(&calls.destroyed), 0);
        assert_eq!(Calls::count(&calls.closed), 0);

        calls.fail_create.store(false, Ordering::SeqCst);
        daemon.start().unwrap();
        assert_eq!(Calls::count(&calls.created), 1);
    }

    #[test]
    fn open_fails() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Never);

        calls.fail_open.store(true, Ordering::SeqCst);

        let Err(Error::External { context, source }) = daemon.start() else {
            panic!("start should fail");
        };

        assert_eq!(context, "/dev/cec0");
        assert_eq!(source.kind(), ErrorKind::PermissionDenied);
        assert!(!daemon.is_running());
        assert_eq!(Calls::count(&calls.created), 1);
        assert_eq!(Calls::count(&calls.destroyed), 0);
        assert!(calls.callback.lock().unwrap().is_none());

        daemon.stop();
        daemon.stop();
        assert_eq!(Calls::count(&calls.destroyed), 1);
        assert_eq!(Calls::count(&calls.closed), 0);
    }

    #[test]
    fn adapter_failure() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Always);
        let hooked = Arc::new(AtomicUsize::new(0));

        let daemon = daemon.with_failure_hook({
            let hooked = Arc::clone(&hooked);

            move || {
                hooked.fetch_add(1, Ordering::SeqCst);
            }
        });

        daemon.start().unwrap();
        assert!(daemon.failure().is_none());

        // ENODEV, as when the adapter is unplugged
        calls.fail(io::Error::from_raw_os_error(19));

        assert_eq!(Calls::count(&hooked), 1);

        let Some(Error::External { context, source }) = daemon.failure() else {
            panic!("failure should be recorded");
        };

        assert_eq!(context, "/dev/cec0");
        assert_eq!(source.raw_os_error(), Some(19));
        assert!(daemon.failure().is_none());

        // stopping is up to the owner
        assert!(daemon.is_running());
        daemon.stop();
        assert_eq!(Calls::count(&calls.closed), 1);
        assert_eq!(Calls::count(&calls.destroyed), 1);
    }

    #[test]
    fn dropped_daemon_stops() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Never);

        daemon.start().unwrap();
        drop(daemon);

        assert_eq!(Calls::count(&calls.closed), 1);
        assert_eq!(Calls::count(&calls.destroyed), 1);
    }

    #[test]
    fn activate_source_policy() {
        for (policy, tv, queries, activated) in [
            (DisableActivateSource::Never, PowerStatus::Standby, 0, 1),
            (DisableActivateSource::Always, PowerStatus::On, 0, 0),
            (DisableActivateSource::IfTvOff, PowerStatus::On, 1, 1),
            (DisableActivateSource::IfTvOff, PowerStatus::Standby, 1, 0),
            (DisableActivateSource::IfTvOff, PowerStatus::Unknown, 1, 0),
        ] {
            let (daemon, calls) = daemon(1, tv, policy);

            daemon.start().unwrap();

            assert_eq!(Calls::count(&calls.power_queries), queries, "{policy} {tv}");
            assert_eq!(Calls::count(&calls.activated), activated, "{policy} {tv}");
        }
    }

    #[test]
    fn keypresses_become_clicks() {
        let (daemon, calls) = daemon(1, PowerStatus::On, DisableActivateSource::Always);

        daemon.start().unwrap();

        calls.press(UserControlCode::UP, 0);
        calls.press(UserControlCode::UP, 0);
        calls.press(UserControlCode::SELECT, 0);
        calls.press(UserControlCode::SELECT, 150);
        calls.press(UserControlCode::PLAY, 0);
        calls.press(UserControlCode::EXIT, 0);

        assert_eq!(
            *calls.clicks.lock().unwrap(),
            [
                KeyCode::KEY_UP,
                KeyCode::KEY_UP,
                KeyCode::KEY_ENTER,
                KeyCode::KEY_ESC
            ]
        );

        daemon.stop();
        assert!(calls.callback.lock().unwrap().is_none());
    }
}
