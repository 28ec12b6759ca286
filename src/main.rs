use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use skycast_core::Config;
use skycast_dashboard::{AutoRefresh, WeatherSession};
use skycast_store::{
    AlertCondition, AlertType, Feature, FileStorage, NewAlert, PreferencesUpdate, StateStorage,
    Theme,
};
use skycast_weather::{ForecastSnapshot, MapLayer};

#[derive(Parser)]
#[command(name = "skycast", version, about = "Weather dashboard in the terminal")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Current conditions
    Current {
        location: Option<String>,
        /// Ignore cached data
        #[arg(long)]
        fresh: bool,
    },
    /// Daily forecast
    Forecast {
        location: Option<String>,
        #[arg(long)]
        days: Option<u8>,
    },
    /// Look up places by name
    Search { query: String },
    /// Saved locations
    #[command(subcommand)]
    Locations(LocationsCommand),
    /// Threshold alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),
    /// Theme, preferences and feature toggles
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Store a WeatherAPI key ("demo" for sample data)
    SetKey { key: String },
    /// Print the URL of a map overlay tile
    Tile {
        layer: MapLayer,
        zoom: u8,
        x: u32,
        y: u32,
    },
    /// Keep refreshing until Ctrl-C
    Watch { location: Option<String> },
}

#[derive(Subcommand)]
enum LocationsCommand {
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },
    /// Save the best search match for QUERY
    Add { query: String },
    Remove { id: String },
    Favorite { id: String },
    /// Make a saved location the current one
    Select { id: String },
}

#[derive(Subcommand)]
enum AlertsCommand {
    List,
    Add {
        #[arg(long)]
        location: Option<String>,
        #[arg(long = "type")]
        alert_type: AlertType,
        #[arg(long)]
        condition: AlertCondition,
        #[arg(long)]
        threshold: f64,
        #[arg(long, default_value = "")]
        message: String,
        /// Create the alert switched off
        #[arg(long)]
        inactive: bool,
    },
    Remove { id: String },
    Toggle { id: String },
}

#[derive(Subcommand)]
enum PrefsCommand {
    Show,
    Theme { theme: Theme },
    /// Flip a feature flag (maps, charts, alerts, offline)
    Toggle { feature: Feature },
    AutoRefresh {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::load_validated()?.0);
    };

    let config = Config::load_from(path)?;
    config.validate().ensure_valid()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(session: &WeatherSession) {
    let Some(summary) = session.weather_summary() else {
        println!("No weather data yet.");
        return;
    };
    let kind = session
        .current_condition()
        .map(|c| c.description())
        .unwrap_or_default();

    println!("{}", session.current_location());
    println!(
        "  {}°C ({}), feels like {}°C",
        summary.temperature, summary.condition, summary.feels_like
    );
    println!("  Wind {} km/h {}", summary.wind_speed, summary.wind_direction);
    println!(
        "  Humidity {}%  Pressure {} mb  Visibility {} km  UV {}",
        summary.humidity, summary.pressure, summary.visibility, summary.uv
    );
    println!("  Sky: {}", kind);
}

fn print_forecast(forecast: &ForecastSnapshot) {
    println!("{}, {}", forecast.location.name, forecast.location.country);
    for day in &forecast.forecast.forecast_day {
        println!(
            "  {}  {:>5.1}°C / {:>5.1}°C  rain {:>3}%  {}",
            day.date,
            day.day.mintemp_c,
            day.day.maxtemp_c,
            day.day.daily_chance_of_rain,
            day.day.condition.text
        );
    }
}

async fn run(command: Command, session: Arc<WeatherSession>, json: bool) -> Result<()> {
    match command {
        Command::Current { location, fresh } => {
            let snapshot = session.fetch_current(location.as_deref(), !fresh).await?;
            if json {
                print_json(&snapshot)?;
            } else {
                print_summary(&session);
            }
        }
        Command::Forecast { location, days } => {
            let forecast = session.fetch_forecast(location.as_deref(), days, true).await?;
            if json {
                print_json(&forecast)?;
            } else {
                print_forecast(&forecast);
            }
        }
        Command::Search { query } => {
            let results = session.search_locations(&query).await;
            if let Some(error) = session.last_error() {
                bail!(error);
            }
            if json {
                print_json(&results)?;
            } else {
                for location in results {
                    println!("{} ({})", location.display_name(), location.country);
                }
            }
        }
        Command::Locations(cmd) => run_locations(cmd, &session, json).await?,
        Command::Alerts(cmd) => run_alerts(cmd, &session, json)?,
        Command::Prefs(cmd) => run_prefs(cmd, &session, json)?,
        Command::SetKey { key } => {
            session.set_api_key(&key);
            if session.client().is_configured() {
                println!("API key saved.");
            } else {
                println!("API key cleared, using demo data.");
            }
        }
        Command::Tile { layer, zoom, x, y } => {
            println!("{}", session.client().map_tile_url(layer, zoom, x, y)?);
        }
        Command::Watch { location } => watch(session, location).await?,
    }
    Ok(())
}

async fn run_locations(cmd: LocationsCommand, session: &WeatherSession, json: bool) -> Result<()> {
    match cmd {
        LocationsCommand::List { favorites } => {
            let saved = if favorites {
                session.favorites()
            } else {
                session.saved_locations()
            };
            if json {
                return print_json(&saved);
            }
            let current = session.current_location();
            for location in saved {
                let star = if location.is_favorite { "*" } else { " " };
                let marker = if location.query() == current { " (current)" } else { "" };
                println!("{} {}  {}{}", star, location.id, location.query(), marker);
            }
        }
        LocationsCommand::Add { query } => {
            let results = session.search_locations(&query).await;
            let Some(best) = results.first() else {
                bail!("No location matches '{}'", query);
            };
            let saved = session.add_saved_location(best)?;
            println!("Saved {} as {}", saved.query(), saved.id);
        }
        LocationsCommand::Remove { id } => session.remove_saved_location(&id),
        LocationsCommand::Favorite { id } => {
            if !session.toggle_favorite(&id) {
                bail!("No saved location with id {}", id);
            }
        }
        LocationsCommand::Select { id } => match session.select_saved_location(&id) {
            Some(query) => println!("Current location: {}", query),
            None => bail!("No saved location with id {}", id),
        },
    }
    Ok(())
}

fn run_alerts(cmd: AlertsCommand, session: &WeatherSession, json: bool) -> Result<()> {
    match cmd {
        AlertsCommand::List => {
            let alerts = session.alerts();
            if json {
                return print_json(&alerts);
            }
            for alert in alerts {
                println!(
                    "{} {}  {} {:?} {:?} {}{}  {}",
                    if alert.is_active { "on " } else { "off" },
                    alert.id,
                    alert.location,
                    alert.alert_type,
                    alert.condition,
                    alert.threshold,
                    alert.alert_type.unit(),
                    alert.message
                );
            }
        }
        AlertsCommand::Add {
            location,
            alert_type,
            condition,
            threshold,
            message,
            inactive,
        } => {
            let alert = session.add_alert(NewAlert {
                location: location.unwrap_or_else(|| session.current_location()),
                alert_type,
                condition,
                threshold,
                message,
                is_active: !inactive,
            })?;
            println!("Created alert {}", alert.id);
        }
        AlertsCommand::Remove { id } => session.remove_alert(&id),
        AlertsCommand::Toggle { id } => {
            if !session.toggle_alert(&id) {
                bail!("No alert with id {}", id);
            }
        }
    }
    Ok(())
}

fn run_prefs(cmd: PrefsCommand, session: &WeatherSession, json: bool) -> Result<()> {
    match cmd {
        PrefsCommand::Show => {
            let prefs = session.preferences();
            if json {
                return print_json(&prefs);
            }
            println!("Theme: {:?}", prefs.theme);
            println!("Units: {:?}  Language: {}", prefs.preferences.units, prefs.preferences.language);
            println!(
                "Auto-refresh: {}  Notifications: {}",
                prefs.preferences.auto_refresh, prefs.preferences.notifications
            );
            println!(
                "Features: maps={} charts={} alerts={} offline={}",
                prefs.features.maps_enabled,
                prefs.features.charts_enabled,
                prefs.features.alerts_enabled,
                prefs.features.offline_mode
            );
        }
        PrefsCommand::Theme { theme } => session.set_theme(theme),
        PrefsCommand::Toggle { feature } => {
            let enabled = session.toggle_feature(feature);
            println!("{:?}: {}", feature, if enabled { "on" } else { "off" });
        }
        PrefsCommand::AutoRefresh { enabled } => session.update_preferences(PreferencesUpdate {
            auto_refresh: Some(enabled),
            ..Default::default()
        }),
    }
    Ok(())
}

async fn watch(session: Arc<WeatherSession>, location: Option<String>) -> Result<()> {
    if let Some(location) = location {
        session.set_current_location(&location);
    }
    if !session.auto_refresh_enabled() {
        tracing::warn!("Auto-refresh is disabled in preferences; data will not update");
    }

    session.refresh(None).await?;
    print_summary(&session);

    let mut updates = session.subscribe_updates();
    let period = session.options().refresh_interval;
    let refresher = if period.is_zero() {
        tracing::warn!("Refresh interval is 0, showing a single snapshot");
        None
    } else {
        Some(AutoRefresh::start(session.clone(), period))
    };
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!();
                print_summary(&session);
            }
        }
    }

    if let Some(refresher) = refresher {
        refresher.stop().await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    skycast_core::init()?;

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Storing state in {:?}", config.storage_dir);

    let storage: Arc<dyn StateStorage> = Arc::new(FileStorage::new(&config.storage_dir));
    let session = Arc::new(WeatherSession::from_config(&config, storage)?);

    run(cli.command, session, cli.json).await
}
