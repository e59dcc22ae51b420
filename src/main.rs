//! Command line front end: resolve frames and build uncertainty ellipses.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trackmarks::{
    geographic_point, resolve_optimal_frame, Distance, Ellipse, Error, DEFAULT_ELLIPSE_ORIENTATION,
    DEFAULT_ELLIPSE_RESOLUTION,
};

#[derive(Parser, Debug)]
#[command(name = "trackmarks")]
#[command(about = "Geodetic uncertainty ellipses on WGS84", long_about = None)]
struct Args {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the optimal projected frame for a point
    Frame {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
    /// Print the polygon of an uncertainty ellipse as JSON
    Ellipse {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Semi-major axis, e.g. "2 nmi" or "3704m"
        #[arg(long)]
        semi_major: Distance,
        /// Semi-minor axis
        #[arg(long)]
        semi_minor: Distance,
        /// Clockwise rotation of the major axis in degrees
        #[arg(long, default_value_t = DEFAULT_ELLIPSE_ORIENTATION, allow_hyphen_values = true)]
        orientation: f64,
        /// Segments per quarter of the boundary
        #[arg(long, default_value_t = DEFAULT_ELLIPSE_RESOLUTION)]
        resolution: u32,
    },
}

fn run(command: Command) -> Result<Value, Error> {
    match command {
        Command::Frame { lon, lat } => {
            let point = geographic_point(lon, lat)?;
            let frame = resolve_optimal_frame(point);

            Ok(json!({
                "frame": frame.to_string(),
                "proj": frame.to_proj_string(),
            }))
        }
        Command::Ellipse {
            lon,
            lat,
            semi_major,
            semi_minor,
            orientation,
            resolution,
        } => {
            let centroid = geographic_point(lon, lat)?;
            let ellipse = Ellipse::create(centroid, semi_major, semi_minor, orientation)?;
            let polygon = ellipse.regenerate(resolution, true)?;
            debug!(vertices = polygon.exterior().0.len(), "Built ellipse");

            let ring: Vec<[f64; 2]> = polygon.exterior().coords().map(|c| [c.x, c.y]).collect();

            Ok(json!({
                "frame": resolve_optimal_frame(centroid).to_string(),
                "semi_major_m": semi_major.meters(),
                "semi_minor_m": semi_minor.meters(),
                "orientation": orientation,
                "exterior": ring,
            }))
        }
    }
}

/// `RUST_LOG`-style directives win when they parse; otherwise `--verbose`
/// picks between debug and warn.
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };

    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args.verbose, directives.as_deref()))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    match run(args.command) {
        Ok(value) => {
            println!("{value:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
