use ceckey::{
    cec::{AdapterConfig, KernelCec},
    daemon::{Daemon, DaemonConfig},
    uinput::Uinput,
};
use nix::{
    sys::signal::{kill, SigSet, Signal},
    unistd::Pid,
};

pub fn run(args: &crate::Run) {
    let table = super::binding_table(&args.bindings);

    if table.is_empty() {
        log::warn!("no bindings, no keys will be sent");
    }

    // Block before any thread is spawned, so the signals are only seen by
    // the sigwait below
    let mut signals = SigSet::empty();
    signals.add(Signal::SIGINT);
    signals.add(Signal::SIGTERM);
    signals.add(Signal::SIGHUP);

    if let Err(e) = signals.thread_block() {
        log::error!("failed to block signals: {e}");
        std::process::exit(1);
    }

    let config = DaemonConfig {
        adapter: AdapterConfig {
            osd_name: args.name.clone(),
            button_repeat_rate_ms: args.button_repeat_rate,
            button_release_delay_ms: args.button_release_delay,
            double_tap_timeout_ms: args.double_tap_timeout,
        },
        disable_activate_source: args.disable_activate_source.into(),
    };

    log::debug!(
        "repeat rate {}ms, release delay {}ms, double tap timeout {}ms, disable activate source {}",
        config.adapter.button_repeat_rate_ms,
        config.adapter.button_release_delay_ms,
        config.adapter.double_tap_timeout_ms,
        config.disable_activate_source
    );

    let daemon = Daemon::new(KernelCec, Uinput::new(&args.name), table, config)
        .with_failure_hook(|| {
            // wake up the sigwait below
            if let Err(e) = kill(Pid::this(), Signal::SIGTERM) {
                log::error!("failed to signal shutdown: {e}");
            }
        });

    if let Err(e) = daemon.start() {
        log::error!("{e}");
        // exit does not run destructors
        daemon.stop();
        std::process::exit(1);
    }

    match signals.wait() {
        Ok(signal) => log::info!("{}: shutting down", signal.as_str()),
        Err(e) => log::error!("failed to wait for signals: {e}"),
    }

    let failure = daemon.failure();

    daemon.stop();

    if let Some(e) = failure {
        log::error!("{e}");
        std::process::exit(1);
    }
}
