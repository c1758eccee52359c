use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{bail, Result, WrapErr};
use ride_core::config::SimConfig;
use ride_core::geo::Location;
use ride_core::notifications::{Notification, NotificationId};
use ride_core::passenger::{Preference, RideStatus, Shortcut};
use ride_core::session::{DriverApp, PassengerApp};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ride_demo",
    about = "Headless ride lifecycle simulation",
    long_about = "Runs scripted passenger and driver sessions against the\n\
                  ride lifecycle engine and prints their timelines."
)]
struct Cli {
    /// JSON config file; every field is optional
    #[arg(long, global = true, env = "RIDE_DEMO_CONFIG")]
    config: Option<PathBuf>,
    /// Seed for request generation
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book one ride and follow it until the session resets
    Passenger {
        /// Destination shortcut
        #[arg(value_enum, long, default_value_t = Destination::Work)]
        to: Destination,
        /// Ride option id (moto, economy, comfort)
        #[arg(long, default_value = "economy")]
        option: String,
        /// Destination latitude; overrides --to together with --lng
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Turn music on once the driver is on the way
        #[arg(long)]
        music: bool,
        /// Cancel this many ms after requesting
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
    /// Go online and accept every request for a number of rides
    Driver {
        #[arg(long, default_value_t = 3)]
        rides: usize,
        /// Reject every n-th request (0 disables)
        #[arg(long, default_value_t = 0)]
        reject_every: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Destination {
    Home,
    Work,
}

impl From<Destination> for Shortcut {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Home => Shortcut::Home,
            Destination::Work => Shortcut::Work,
        }
    }
}

const PASSENGER_LIMIT_MS: u64 = 30 * 60 * 1000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_path(path)
            .wrap_err_with(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    match cli.command {
        Commands::Passenger {
            to,
            option,
            lat,
            lng,
            music,
            cancel_after_ms,
        } => {
            let destination = lat.zip(lng).map(|(lat, lng)| Location::new(lat, lng));
            run_passenger(config, to.into(), destination, &option, music, cancel_after_ms)
        }
        Commands::Driver {
            rides,
            reject_every,
        } => run_driver(config, rides, reject_every),
    }
}

fn print_notifications(seen: &mut Option<NotificationId>, log: &[Notification]) {
    let after = *seen;
    for notification in log.iter().filter(|n| Some(n.id) > after) {
        println!(
            "{:>8} ms  [{:?}] {}",
            notification.emitted_at, notification.kind, notification.message
        );
        *seen = Some(notification.id);
    }
}

fn run_passenger(
    config: SimConfig,
    shortcut: Shortcut,
    destination: Option<Location>,
    option: &str,
    music: bool,
    cancel_after_ms: Option<u64>,
) -> Result<()> {
    let brand = config.brand.clone();
    let mut app = PassengerApp::from_config(config);
    match destination {
        Some(point) => app.select_point(point),
        None => app.choose_shortcut(shortcut),
    }
    app.select_option(option);

    let session = app.session();
    let chosen = session.selected_option();
    println!(
        "{} from {} to {}: {} Kz",
        chosen.display_name(&brand),
        session.user_location().label(),
        session.destination().map(Location::label).unwrap_or_default(),
        session.quoted_price()
    );
    if let Some(tip) = session.ride_tip() {
        println!("tip: {tip}");
    }

    app.request_ride();
    if app.status() != RideStatus::Requesting {
        bail!("ride request was refused");
    }

    let mut seen = None;
    let mut status = app.status();
    info!(?status, "ride requested");
    let mut music_pending = music;
    while app.now() < PASSENGER_LIMIT_MS {
        if cancel_after_ms.is_some_and(|after| app.now() >= after) && app.status().is_active() {
            app.cancel();
        }
        if music_pending && app.status() == RideStatus::Matched {
            app.toggle_preference(Preference::Music);
            music_pending = false;
        }
        app.advance_by(app.config().tick_ms);
        print_notifications(&mut seen, app.notifications().log());
        if app.status() != status {
            status = app.status();
            println!("{:>8} ms  status -> {:?}", app.now(), status);
        }
        if status == RideStatus::Idle {
            break;
        }
    }

    let history = app.history();
    for ride in &history.rides {
        println!(
            "{:?} {} ride, {} Kz, match {:?} ms, pickup {:?} ms, trip {:?} ms",
            ride.outcome,
            ride.option_id,
            ride.fare_kz,
            ride.time_to_match(),
            ride.time_to_pickup(),
            ride.trip_duration()
        );
    }
    Ok(())
}

fn run_driver(config: SimConfig, rides: usize, reject_every: usize) -> Result<()> {
    let mut app = DriverApp::from_config(config);
    let mut seen = None;
    app.toggle_online().wrap_err("going online")?;

    let mut offered = 0;
    let mut completed = 0;
    while completed < rides {
        let window = app.config().dispatch_delay_max_ms;
        app.advance_by(window);
        print_notifications(&mut seen, app.notifications().log());

        let Some(request) = app.pending_request().cloned() else {
            bail!("no request generated within {window} ms");
        };
        offered += 1;
        println!(
            "{:>8} ms  request {} from {} ({:.1}) {:.1} km, {} Kz",
            app.now(),
            request.id,
            request.passenger_name,
            request.rating,
            request.distance_km,
            request.price
        );

        if reject_every > 0 && offered % reject_every == 0 {
            app.reject(request.id)?;
            println!("{:>8} ms  rejected {}", app.now(), request.id);
            continue;
        }
        app.accept(request.id)?;
        app.advance_by(10 * 60 * 1000);
        app.complete()?;
        completed += 1;
        print_notifications(&mut seen, app.notifications().log());
    }

    app.toggle_online()?;
    print_notifications(&mut seen, app.notifications().log());
    let ledger = app.ledger();
    println!(
        "earnings {} Kz after {} trips ({} Kz from trips), acceptance {:.0}%",
        app.earnings(),
        ledger.trips.len(),
        ledger.trip_earnings(),
        ledger.acceptance_rate().unwrap_or(0.0) * 100.0
    );
    Ok(())
}
