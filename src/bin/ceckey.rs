use ceckey::daemon::DisableActivateSource;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Metadata, Record};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ceckey",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "HDMI-CEC remote control to keyboard",
    subcommand_required = true
)]
struct App {
    /// Increase message verbosity
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Silence all warnings
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send key presses for remote control buttons until interrupted
    Run(Run),
    /// Print the bindings from remote control buttons to keys
    Bindings(Bindings),
    /// List CEC adapters
    List,
}

#[derive(Args)]
struct BindingArgs {
    /// Bindings to use
    #[arg(
        long = "keys",
        short = 'k',
        value_enum,
        default_value_t = Keys::Default,
        conflicts_with = "KEYMAP",
        help_heading = "BINDINGS"
    )]
    keys: Keys,

    /// RetroArch configuration to take the retropie bindings from
    #[arg(
        long = "retroarch-config",
        default_value = "/opt/retropie/configs/all/retroarch.cfg",
        help_heading = "BINDINGS"
    )]
    retroarch_config: PathBuf,

    /// Load bindings from toml keymap
    #[arg(long = "keymap", short = 'm', name = "KEYMAP", help_heading = "BINDINGS")]
    keymap: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Keys {
    /// Select, exit and the arrow keys
    Default,
    /// Player 1 keys from the RetroArch configuration
    Retropie,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivateSource {
    /// Always make the TV switch to this input on start
    Never,
    /// Never switch the TV's input
    Always,
    /// Only switch the TV's input if it is on
    #[value(name = "if_tv_off")]
    IfTvOff,
}

impl From<ActivateSource> for DisableActivateSource {
    fn from(value: ActivateSource) -> Self {
        match value {
            ActivateSource::Never => DisableActivateSource::Never,
            ActivateSource::Always => DisableActivateSource::Always,
            ActivateSource::IfTvOff => DisableActivateSource::IfTvOff,
        }
    }
}

#[derive(Args)]
struct Run {
    #[clap(flatten)]
    bindings: BindingArgs,

    /// Interval in milliseconds at which a held button repeats, 0 to disable
    #[arg(
        long = "button-repeat-rate",
        value_name = "MS",
        default_value_t = 0,
        help_heading = "TIMING"
    )]
    button_repeat_rate: u32,

    /// Release a held button after this many milliseconds without a repeat
    #[arg(
        long = "button-release-delay",
        value_name = "MS",
        default_value_t = 500,
        help_heading = "TIMING"
    )]
    button_release_delay: u32,

    /// Ignore a second press of a button within this many milliseconds
    #[arg(
        long = "double-tap-timeout",
        value_name = "MS",
        default_value_t = 200,
        help_heading = "TIMING"
    )]
    double_tap_timeout: u32,

    /// When not to make the TV switch to this input on start
    #[arg(
        long = "disable-activate-source",
        value_enum,
        default_value_t = ActivateSource::Never
    )]
    disable_activate_source: ActivateSource,

    /// Name shown on the TV and given to the keyboard device
    #[arg(long = "name", default_value = "ceckey")]
    name: String,
}

#[derive(Args)]
struct Bindings {
    #[clap(flatten)]
    bindings: BindingArgs,
}

impl App {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }

        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() {
    let args = App::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(args.log_level());
    }

    match &args.command {
        Commands::Run(run) => commands::run::run(run),
        Commands::Bindings(bindings) => commands::bindings::bindings(bindings),
        Commands::List => commands::list::list(),
    }
}

/// Writes `level: message` to stderr. Debug and trace messages from other
/// crates are dropped.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info || metadata.target().starts_with("ceckey")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}: {}",
                record.level().as_str().to_ascii_lowercase(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
