use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use ratatui::{backend::CrosstermBackend, Terminal};
use ruleta::app::App;
use ruleta::config::AppConfig;
use ruleta::relay::{OpenAiCompatProvider, RelayClient};
use ruleta::roulette::{DistractorDictionary, GenerationStepper, Roulette, WallClockScheduler};
use ruleta::{replay, ui};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ruleta")]
#[command(version)]
#[command(about = "Watch a language model read your prompt and spin its token roulette", long_about = None)]
// custom help/version flags live under "Flags" below
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "\
{name} {version}
{about-section}
{usage-heading} {usage}

{all-args}
")]
struct Cli {
    /// Relay endpoint the terminal app sends prompts to
    #[arg(long, value_name = "URL")]
    relay_url: Option<String>,

    /// Address the relay binds to with --serve
    #[arg(long)]
    host: Option<String>,

    /// Port the relay listens on with --serve
    #[arg(long)]
    port: Option<u16>,

    /// Print the roulette for TEXT as JSON lines instead of opening the app
    #[arg(long, value_name = "TEXT")]
    replay: Option<String>,

    /// Seed for the random source (same seed, same roulettes)
    #[arg(long)]
    seed: Option<u64>,

    /// Run the chat relay server instead of the terminal app
    #[arg(long, default_value_t = false, help_heading = "Flags")]
    serve: bool,

    /// Print help
    #[arg(short, long, action = ArgAction::Help, help_heading = "Flags")]
    help: Option<bool>,

    /// Print version
    #[arg(short = 'V', long, action = ArgAction::Version, help_heading = "Flags")]
    version: Option<bool>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config, using defaults. Error: {}",
            e
        );
        AppConfig::default()
    });

    if let Some(url) = cli.relay_url {
        app_config.relay.url = url;
    }
    if let Some(host) = cli.host {
        app_config.relay.host = host;
    }
    if let Some(port) = cli.port {
        app_config.relay.port = port;
    }

    if cli.serve {
        return serve(&app_config);
    }

    if let Some(text) = cli.replay {
        return run_replay(&app_config, &text, cli.seed);
    }

    init_file_logging();
    tracing::info!(relay = %app_config.relay.url, "starting terminal app");

    let relay = RelayClient::new(
        app_config.relay.url.clone(),
        Duration::from_secs(app_config.relay.timeout_secs),
    )
    .context("Failed to build relay client")?;
    let mut app = App::new(&app_config, relay, cli.seed)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "terminal app stopped");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;
        app.tick();

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                    match key.code {
                        KeyCode::Esc => app.quit(),
                        KeyCode::Char('q') if ctrl => app.quit(),
                        KeyCode::Char('e') if ctrl => app.explain(),
                        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                            app.on_newline()
                        }
                        KeyCode::Enter => app.on_enter(),
                        KeyCode::Backspace => app.on_backspace(),
                        KeyCode::Left => app.on_left(),
                        KeyCode::Right => app.on_right(),
                        KeyCode::Char(c) if !ctrl => app.on_key(c),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn serve(app_config: &AppConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = &app_config.relay;
    let provider = OpenAiCompatProvider::from_settings(settings)
        .context("Failed to build upstream client")?;
    if !provider.has_api_key() {
        tracing::warn!(
            var = %settings.api_key_env,
            "no API key in environment, every chat request will fail"
        );
    }
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "relay configured");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(ruleta::relay::run_server(
        Arc::new(provider),
        &settings.host,
        settings.port,
    ))
}

fn run_replay(app_config: &AppConfig, text: &str, seed: Option<u64>) -> Result<()> {
    let dictionary = DistractorDictionary::global()?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut stepper =
        GenerationStepper::new(Roulette::new(dictionary, rng), app_config.timing.step_delay());
    let mut scheduler = WallClockScheduler::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    replay::run(&mut stepper, &mut scheduler, text, &mut out)?;
    Ok(())
}

/// The alternate screen owns stdout/stderr, so the terminal app logs to a
/// file. Logging stays off if the file can't be opened.
fn init_file_logging() {
    let Some(proj_dirs) = ProjectDirs::from("", "", "ruleta") else {
        return;
    };
    let dir = proj_dirs.data_dir();
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ruleta.log"))
    else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .try_init();
}
