mod app;
mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;
mod ui;

use anyhow::Context;
use app::App;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datasources::{
    locate_or_default, ForecastSource, Geocoder, IpApiClient, LocationSource,
    OpenWeatherMapClient,
};
use error::WeatherlyError;
use logic::{FetchMessage, FetchOrchestrator};
use models::WeatherSnapshot;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;
use ui::components::format_degrees;
use ui::icons;
use ui::screens::DashboardScreen;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let tui_mode = cli.command.is_none();
    init_logging(&cli, tui_mode)?;

    if let Some(Commands::Init) = cli.command {
        Config::setup_interactive()?;
        return Ok(());
    }

    let config = match Config::load(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if matches!(e, WeatherlyError::MissingCredential) {
                eprintln!("Run `weatherly init` or set WEATHERLY_API_KEY");
            }
            std::process::exit(1);
        }
    };

    let owm = Arc::new(OpenWeatherMapClient::new(&config)?);
    let ip = IpApiClient::new(&config)?;

    match cli.command {
        Some(Commands::Check) => run_check(&config, owm.as_ref(), &ip).await,
        Some(Commands::Show { city }) => {
            let query = match city {
                Some(c) => c,
                None => locate_or_default(&ip, config.default_city.to_location())
                    .await
                    .name,
            };
            let (orchestrator, _rx) = FetchOrchestrator::new(owm.clone(), owm, config.units);
            let snapshot = orchestrator
                .fetch_now(&query)
                .await
                .with_context(|| format!("Failed to fetch weather for '{}'", query))?;
            print_snapshot(&snapshot, &config);
            Ok(())
        }
        Some(Commands::Init) => Ok(()),
        None => {
            let start = locate_or_default(&ip, config.default_city.to_location()).await;
            let (orchestrator, rx) = FetchOrchestrator::new(owm.clone(), owm, config.units);
            run_tui(&config, orchestrator, rx, start.name).await
        }
    }
}

/// Log to stderr for one-shot commands and to a file while the TUI owns the
/// terminal.
fn init_logging(cli: &Cli, tui_mode: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));

    if tui_mode {
        let log_path = Config::data_dir()?.join("weatherly.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Cannot open log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

async fn run_check(
    config: &Config,
    owm: &OpenWeatherMapClient,
    ip: &IpApiClient,
) -> anyhow::Result<()> {
    println!("Configuration OK (units: {})", config.units.as_query());
    let fallback = config.default_city.to_location();
    let mut failures = 0;

    match owm.resolve(&fallback.name).await {
        Ok(loc) => println!(
            "  Geocoding ({}): OK ({:.4}, {:.4})",
            fallback.name, loc.latitude, loc.longitude
        ),
        Err(e) => {
            failures += 1;
            println!("  Geocoding ({}): FAILED - {}", fallback.name, e);
        }
    }

    match owm
        .forecast(fallback.latitude, fallback.longitude, config.units)
        .await
    {
        Ok(feed) => println!("  Forecast: OK ({} samples)", feed.samples.len()),
        Err(e) => {
            failures += 1;
            println!("  Forecast: FAILED - {}", e);
        }
    }

    match ip.current_location().await {
        Ok(loc) => println!("  IP location: OK ({})", loc.display_name()),
        Err(e) => println!(
            "  IP location: UNAVAILABLE - {} (will use {})",
            e, fallback.name
        ),
    }

    if failures > 0 {
        anyhow::bail!("{} connection check(s) failed", failures);
    }
    Ok(())
}

fn print_snapshot(snapshot: &WeatherSnapshot, config: &Config) {
    let suffix = config.units.temperature_suffix();
    let now = format_degrees(snapshot.current_temperature);

    println!("{}", snapshot.city_name);
    println!(
        "  Now: {}{}  {}  Chance of rain: {}%",
        now.trim_end_matches('°'),
        suffix,
        icons::glyph(snapshot.current_icon_code.as_deref()),
        snapshot.rain_chance_percent
    );
    println!();

    let hourly: Vec<String> = snapshot
        .hourly
        .iter()
        .map(|h| format!("{} {}", h.label, format_degrees(h.temperature)))
        .collect();
    if !hourly.is_empty() {
        println!("  {}", hourly.join("  "));
        println!();
    }

    for day in &snapshot.daily {
        let temps = if day.has_temperature() {
            format!("{:.0}/{:.0}°", day.temperature_max, day.temperature_min)
        } else {
            "--/--°".to_string()
        };
        println!(
            "  {:<7}{:<10}{}",
            day.label,
            temps,
            icons::glyph(day.icon_code.as_deref())
        );
    }
}

async fn run_tui(
    config: &Config,
    orchestrator: FetchOrchestrator,
    mut rx: UnboundedReceiver<FetchMessage>,
    start_city: String,
) -> anyhow::Result<()> {
    let mut app = App::new(config.units);
    app.request_fetch(start_city);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &orchestrator, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    orchestrator.shutdown(config.shutdown_grace()).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    orchestrator: &FetchOrchestrator,
    rx: &mut UnboundedReceiver<FetchMessage>,
) -> anyhow::Result<()> {
    loop {
        if let Some(query) = app.pending_query.take() {
            let outcome = orchestrator.request(&query);
            app.on_request(&query, outcome);
        }

        while let Ok(message) = rx.try_recv() {
            app.apply(message);
        }

        terminal.draw(|f| {
            let screen = DashboardScreen::new(app.snapshot.as_ref(), app.units)
                .with_search(&app.search.buffer, app.search.editing, app.loading)
                .with_status(app.status_message.as_ref());
            f.render_widget(screen, f.area());
        })?;

        // Poll with a timeout so fetch results are picked up promptly
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    app.quit();
                } else if app.search.editing {
                    handle_search_input(app, key.code);
                } else {
                    handle_dashboard_input(app, key.code);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.search.cancel_editing(),
        KeyCode::Enter => app.submit_search(),
        KeyCode::Backspace => {
            app.search.buffer.pop();
        }
        KeyCode::Char(c) => app.search.buffer.push(c),
        _ => {}
    }
}

fn handle_dashboard_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('/') => app.search.start_editing(),
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Enter => app.submit_search(),
        _ => {}
    }
}
