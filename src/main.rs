use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use fieldpin::picker::{
    ConfirmedLocation, Coordinate, LocationResolver, PickerConfig, PickerError, PickerEvent,
    PickerHandle,
};
use fieldpin::providers::{IpPosition, Nominatim};

/// Fieldpin — pick a field location on a map, headlessly.
///
/// Runs one picking session against the live providers: opens at the
/// device position (IP-based), optionally settles at the coordinate you
/// give, waits for the resolved address, confirms, and prints the
/// confirmed location as JSON.
///
/// Examples:
///   fieldpin
///   fieldpin --lat -37.788289 --lon 175.312474
///   fieldpin --lat -37.78 --lon 175.31 --debounce-ms 250
#[derive(Parser)]
#[command(name = "fieldpin", version, about, long_about = None)]
struct Cli {
    /// Latitude to settle the map at (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude to settle the map at (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Debounce window in milliseconds.
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,

    /// Give up if the session has not confirmed within this long.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settle = match (cli.lat, cli.lon) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
                std::process::exit(1);
            }
            Some(Coordinate::new(lat, lon))
        }
        _ => None,
    };

    let handle = LocationResolver::spawn(
        Arc::new(IpPosition::new()),
        Arc::new(Nominatim::new()),
        PickerConfig {
            debounce_window: Duration::from_millis(cli.debounce_ms),
            ..Default::default()
        },
    );

    let session = run_session(handle, settle);
    let confirmed = match tokio::time::timeout(Duration::from_secs(cli.timeout_secs), session).await
    {
        Ok(Ok(confirmed)) => confirmed,
        Ok(Err(message)) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Error: Session did not confirm within {}s", cli.timeout_secs);
            std::process::exit(1);
        }
    };

    // JSON to stdout, banner to stderr.
    match serde_json::to_string_pretty(&confirmed) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Drive one open → settle → confirm cycle.
async fn run_session(
    mut handle: PickerHandle,
    mut settle: Option<Coordinate>,
) -> Result<ConfirmedLocation, String> {
    handle.open().await;

    while let Some(event) = handle.next_event().await {
        match event {
            PickerEvent::Opened { region } => {
                eprintln!("  \u{1F4CD} Opened at {}", region.center);
            }
            PickerEvent::PermissionDenied { .. } => {
                return Err(format!(
                    "{}. Grant location access in system settings and retry.",
                    PickerError::PermissionDenied
                ));
            }
            PickerEvent::AddressResolved(address) => {
                eprintln!(
                    "  \u{1F3E0} {} \u{2014} {} {}",
                    address.label, address.city, address.postal_code
                );
            }
            PickerEvent::Fetching(false) => match settle.take() {
                // First resolution done: move to the requested spot,
                // or confirm where we are.
                Some(coordinate) => handle.region_settled(coordinate).await,
                None => handle.confirm().await,
            },
            PickerEvent::Confirmed(confirmed) => return Ok(confirmed),
            PickerEvent::Fetching(true)
            | PickerEvent::Recentered { .. }
            | PickerEvent::Closed => {}
        }
    }

    Err("Picker stopped before confirming".into())
}
