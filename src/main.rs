use clap::{ArgGroup, Parser, ValueEnum};
use flowline::enrich::types::ColorMode;
use flowline::reader::source::LogSource;
use flowline::reader::types::MalformedPolicy;
use flowline::web_interface::types::AppState;
use flowline::web_interface::web_server::WebServer;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flowline")]
#[command(version = "0.1.0")]
#[command(about = "Render Zeek conn logs as an interactive flow timeline")]
#[command(group(ArgGroup::new("input").required(true).args(["filename", "stdin"])))]
struct Args {
    /// The conn log file to read. Re-read on every page load.
    filename: Option<PathBuf>,

    /// Read the conn log from stdin instead of a file.
    ///
    /// Stdin is consumed by the first page load; reload from a file if you
    /// need repeated renders.
    #[arg(long)]
    stdin: bool,

    /// Minimum duration, in seconds, of flows to display
    #[arg(long, default_value_t = 0.0)]
    min_duration: f64,

    /// Port for the web interface
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// How flows are colored
    #[arg(long, value_enum, default_value_t = ColorModeArg::Pair)]
    color_mode: ColorModeArg,

    /// Fail on malformed records instead of skipping them with a warning
    #[arg(long)]
    strict: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ColorModeArg {
    /// One color per source address
    Source,
    /// One base color per source/destination pair, shaded per destination port
    Pair,
}

impl From<ColorModeArg> for ColorMode {
    fn from(arg: ColorModeArg) -> Self {
        match arg {
            ColorModeArg::Source => ColorMode::PerSource,
            ColorModeArg::Pair => ColorMode::PerPair,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let source = match (&args.filename, args.stdin) {
        (_, true) => LogSource::stdin(),
        (Some(path), false) => LogSource::file(path.clone()),
        // The clap input group guarantees one of the two.
        (None, false) => {
            error!("A filename or --stdin is required");
            std::process::exit(2);
        }
    };

    let state = AppState {
        source,
        min_duration: args.min_duration,
        color_mode: args.color_mode.into(),
        policy: if args.strict {
            MalformedPolicy::Abort
        } else {
            MalformedPolicy::Skip
        },
    };

    info!("Serving conn flow timeline on http://127.0.0.1:{}", args.port);

    let server = WebServer::new(state);
    if let Err(e) = server.start(args.port).await {
        error!("Web server failed: {}, exiting...", e);
        std::process::exit(1);
    }
}
