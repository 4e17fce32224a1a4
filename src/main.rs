use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use solarpin::config::PickerConfig;
use solarpin::estimate::mock_estimate;
use solarpin::location::{
    format_coords, parse_coordinates, BuiltinGeocoder, Coordinate, Geocoder, Geolocator, IpGeolocator,
    NominatimGeocoder, Suggestion,
};
use solarpin::map::{HeadlessSurface, ScreenPoint, ViewportSize};
use solarpin::picker::{LocationPicker, Notice, PickerEvent, PickerHandle, PickerHost, Selection};

/// Solarpin: pick a site for a rooftop solar estimate.
///
/// Accepts place names or literal coordinates, suggests matches as you type,
/// and resolves map clicks and your approximate position to a coordinate.
///
/// Examples:
///   solarpin search "San Francisco"
///   solarpin search "37.7749, -122.4194"
///   solarpin suggest berl
///   solarpin --offline pick
///   solarpin serve --port 3000
#[derive(Parser)]
#[command(name = "solarpin", version, about, long_about = None)]
struct Cli {
    /// Use the built-in gazetteer and skip IP geolocation.
    #[arg(long, global = true)]
    offline: bool,

    /// Config file (defaults to ~/.solarpin/config.json when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve text to a single location.
    Search { query: String },
    /// List suggestions for partial text.
    Suggest { query: String },
    /// Approximate current position.
    Here,
    /// Interactive picker driven by stdin commands.
    Pick {
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Mock solar estimate for a coordinate.
    Estimate {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("solarpin=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PickerConfig::load_from(path)?,
        None => PickerConfig::load()?,
    };
    config.offline |= cli.offline;

    let geocoder = build_geocoder(&config);
    let geolocator = build_geolocator(&config);

    match cli.command {
        Command::Search { query } => {
            let found = resolve_query(geocoder.as_ref(), &query)?;
            eprintln!("  {}", format_coords(found.coordinate.lat(), found.coordinate.lng()));
            print_json(&found)
        }
        Command::Suggest { query } => {
            print_json(&suggest_query(geocoder.as_ref(), &query, config.suggestion_limit))
        }
        Command::Here => {
            let at = geolocator.locate().map_err(|e| anyhow::anyhow!(Notice::from(e)))?;
            eprintln!("  {}", format_coords(at.lat(), at.lng()));
            print_json(&at)
        }
        Command::Estimate { lat, lng } => {
            let Some(at) = Coordinate::new(lat, lng) else {
                bail!("Invalid coordinates. Lat: -90..90, Lng: -180..180");
            };
            print_json(&mock_estimate(at))
        }
        Command::Pick { width, height } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_picker(config, geocoder, geolocator, ViewportSize::new(width, height)))
        }
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime
                .block_on(solarpin::server::start(&host, port, geocoder, config))
                .context("server failed")
        }
    }
}

fn build_geocoder(config: &PickerConfig) -> Arc<dyn Geocoder> {
    if config.offline {
        Arc::new(BuiltinGeocoder)
    } else {
        Arc::new(NominatimGeocoder::new(config.geocoder_url.clone(), &config.user_agent))
    }
}

fn build_geolocator(config: &PickerConfig) -> Arc<dyn Geolocator> {
    let mut geolocator = IpGeolocator::new(config.geolocation_url.clone(), &config.user_agent);
    geolocator.set_offline(config.offline);
    Arc::new(geolocator)
}

fn resolve_query(geocoder: &dyn Geocoder, query: &str) -> anyhow::Result<Suggestion> {
    let query = query.trim();
    if query.is_empty() {
        bail!("No location specified.");
    }
    if let Some(at) = parse_coordinates(query) {
        return Ok(Suggestion::new(query, at));
    }
    let found = geocoder.search(query, 1).map_err(|e| {
        tracing::warn!(error = %e, "search failed");
        anyhow::anyhow!(Notice::SearchFailed)
    })?;
    found
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!(Notice::LocationNotFound))
}

/// Best-effort like the picker: empty or coordinate input and lookup
/// failures all produce an empty list.
fn suggest_query(geocoder: &dyn Geocoder, query: &str, limit: usize) -> Vec<Suggestion> {
    let query = query.trim();
    if query.is_empty() || parse_coordinates(query).is_some() {
        return Vec::new();
    }
    geocoder.search(query, limit).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "suggestion lookup failed");
        Vec::new()
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Interactive picker ──────────────────────────────────────────

/// Prints selections as JSON to stdout and everything else to stderr.
struct ConsoleHost;

impl PickerHost for ConsoleHost {
    fn on_location_select(&mut self, selection: &Selection) {
        match serde_json::to_string(selection) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "cannot serialize selection"),
        }
    }

    fn show_notice(&mut self, notice: &Notice) {
        eprintln!("  ! {}", notice);
    }

    fn suggestions_changed(&mut self, suggestions: &[Suggestion], visible: bool) {
        if !visible {
            return;
        }
        for (i, s) in suggestions.iter().enumerate() {
            eprintln!("  [{}] {}", i, s.label);
        }
    }
}

const PICK_HELP: &str = "commands: type <text> | enter | pick <n> | click <x> <y> | resize <w> <h> | here | focus | blur | show | quit";

async fn run_picker(
    config: PickerConfig,
    geocoder: Arc<dyn Geocoder>,
    geolocator: Arc<dyn Geolocator>,
    viewport: ViewportSize,
) -> anyhow::Result<()> {
    let picker = LocationPicker::new(HeadlessSurface::new(), ConsoleHost, &config);
    let handle = PickerHandle::spawn(picker, geocoder, geolocator, config.debounce());
    handle.send(PickerEvent::Resized(viewport))?;
    eprintln!("  {}", PICK_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "show" {
            print_json(&handle.snapshot().await?)?;
            continue;
        }
        match parse_pick_command(line) {
            Ok(event) => handle.send(event)?,
            Err(msg) => eprintln!("  {}", msg),
        }
    }

    handle.unmount().await;
    Ok(())
}

fn parse_pick_command(line: &str) -> Result<PickerEvent, String> {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match cmd {
        "type" => Ok(PickerEvent::Input(rest.to_string())),
        "enter" => Ok(PickerEvent::Submit),
        "focus" => Ok(PickerEvent::Focus),
        "blur" => Ok(PickerEvent::Blur),
        "here" => Ok(PickerEvent::UseCurrentLocation),
        "pick" => rest
            .parse()
            .map(PickerEvent::PickSuggestion)
            .map_err(|_| "usage: pick <n>".to_string()),
        "click" => parse_pair(rest, "usage: click <x> <y>")
            .map(|(x, y)| PickerEvent::Click(ScreenPoint::new(x, y))),
        "resize" => parse_pair(rest, "usage: resize <width> <height>")
            .map(|(w, h)| PickerEvent::Resized(ViewportSize::new(w, h))),
        _ => Err(PICK_HELP.to_string()),
    }
}

fn parse_pair<T: FromStr>(text: &str, usage: &str) -> Result<(T, T), String> {
    let mut parts = text.split_whitespace().map(str::parse::<T>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
        _ => Err(usage.to_string()),
    }
}
