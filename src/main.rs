use std::{fs::File, io, sync::Mutex, time::Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use sharkwatch::{
    config::{Args, Config},
    runtime::Executor,
    ui, App, Completion, Effect, SessionClient,
};
use tokio::{
    sync::mpsc,
    time::{Interval, MissedTickBehavior},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from(Args::parse());
    init_logging(&config)?;

    let client = SessionClient::new(&config.server, config.request_timeout)
        .context("building HTTP client")?;
    info!(server = client.base_url(), "starting monitor");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &config, client).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

async fn run(terminal: &mut Tui, config: &Config, client: SessionClient) -> anyhow::Result<()> {
    let (tx, mut completions) = mpsc::unbounded_channel::<Completion>();
    let executor = Executor::new(client, config.export_dir.clone(), tx);
    let mut app = App::new(config);
    let mut events = EventStream::new();
    let mut poll: Option<Interval> = None;

    let mut pending = app.startup();
    loop {
        for effect in pending.drain(..) {
            match effect {
                Effect::Remote(request) => executor.spawn(request),
                Effect::ArmPollTimer => {
                    let mut interval = tokio::time::interval_at(
                        tokio::time::Instant::now() + config.poll_interval,
                        config.poll_interval,
                    );
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    poll = Some(interval);
                }
                Effect::DisarmPollTimer => poll = None,
                Effect::Quit => return Ok(()),
            }
        }

        let areas = ui::layout(terminal.size()?);
        app.set_table_area(areas.table);
        app.set_detail_area(areas.detail);
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            _ = next_tick(&mut poll) => {
                pending = app.on_tick();
            }
            Some(completion) = completions.recv() => {
                pending = app.on_completion(completion, Instant::now());
            }
            maybe_event = events.next() => {
                pending = match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.on_key(key, Instant::now())
                    }
                    Some(Ok(Event::Mouse(mouse))) => app.on_mouse(mouse, Instant::now()),
                    Some(Ok(_)) => Vec::new(),
                    Some(Err(err)) => return Err(err).context("reading terminal events"),
                    None => return Ok(()),
                };
            }
        }
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}
