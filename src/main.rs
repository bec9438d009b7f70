use photoburn::cli::{AppConfig, Args};
use photoburn::domain::{MediaItem, MediaKind, PhotoFeed};
use photoburn::library::{LocalLibrary, ScanOptions};
use photoburn::logging::init_subscriber;
use photoburn::media_source::{MediaSource, MemoryLibrary};
use photoburn::session::Session;
use photoburn::store::{BurnCounter, JsonFileStore, KeyValueStore, MemoryStore};
use photoburn::tui::{
    handle_key_event, render, render_help_overlay, render_summary, viewport_width, DragTracker,
    KeyAction, PointerAction, ViewState,
};

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Frame interval while a card is moving
const ANIMATION_FRAME: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(100);

const DEMO_ITEMS: usize = 240;

fn main() -> io::Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let config: AppConfig = args.into();

    if let Err(e) = init_subscriber(config.verbosity, &config.log_file) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    run_app_with_config(&config)
}

fn build_source(config: &AppConfig) -> Arc<dyn MediaSource> {
    if config.demo {
        info!(items = DEMO_ITEMS, "Using demo library");
        return Arc::new(MemoryLibrary::new(demo_items(DEMO_ITEMS)));
    }

    info!(
        directory = %config.directory.display(),
        dry_run = config.dry_run,
        "Using local library"
    );
    Arc::new(
        LocalLibrary::new(&config.directory)
            .with_options(ScanOptions {
                recursive: config.recursive,
                show_hidden: config.show_hidden,
            })
            .with_dry_run(config.dry_run),
    )
}

fn demo_items(count: usize) -> Vec<MediaItem> {
    let base = Utc.with_ymd_and_hms(2020, 1, 1, 8, 0, 0).single().unwrap_or_else(Utc::now);
    (0..count)
        .map(|i| MediaItem {
            id: format!("demo-{}", i),
            uri: format!("memory://demo-{}", i),
            kind: if i % 7 == 0 {
                MediaKind::Video
            } else {
                MediaKind::Photo
            },
            created_at: base + ChronoDuration::hours(i as i64 * 5),
            display_name: if i % 7 == 0 {
                format!("VID_{:04}.MOV", i)
            } else {
                format!("IMG_{:04}.JPG", i)
            },
        })
        .collect()
}

fn open_store(config: &AppConfig) -> Box<dyn KeyValueStore + Send> {
    // Demo runs must not touch the real counter
    if config.demo {
        return Box::new(MemoryStore::default());
    }
    match JsonFileStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            error!(error = %e, "Falling back to in-memory store");
            Box::new(MemoryStore::default())
        }
    }
}

/// Runs the TUI application with configuration
pub fn run_app_with_config(config: &AppConfig) -> io::Result<()> {
    let feed = match config.seed {
        Some(seed) => PhotoFeed::with_seed(seed),
        None => PhotoFeed::new(),
    }
    .with_page_size(config.page_size);

    let counter = BurnCounter::load(open_store(config));

    if config.dry_run {
        println!("[DRY RUN] Burned items will not be moved to trash");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (columns, rows) = crossterm::terminal::size()?;
    let width = viewport_width(Rect::new(0, 0, columns, rows));

    let result = match Session::new(build_source(config), config.kinds.clone(), feed, counter, width)
    {
        Ok(mut session) => {
            session.start();
            run_loop(&mut terminal, &mut session).map(|()| session)
        }
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let stats = result?.finish();
    if config.dry_run {
        println!("\n[DRY RUN] Complete");
        println!("   Would have kept: {} items", stats.kept);
        println!("   Would have burned: {} items", stats.burned);
    }
    if stats.failed_deletes > 0 {
        println!(
            "{} item(s) could not be moved to trash, see the log for details",
            stats.failed_deletes
        );
    }

    Ok(())
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
) -> io::Result<()> {
    let mut view_state = ViewState::Swiping;
    let mut drag = DragTracker::new();

    loop {
        let now = Instant::now();
        session.pump();
        session.tick(now);

        terminal.draw(|frame| {
            render(frame, session);

            match view_state {
                ViewState::Help => render_help_overlay(frame),
                ViewState::Summary => {
                    render_summary(frame, session.statistics(), session.burn_count())
                }
                ViewState::Swiping => {}
            }
        })?;

        let timeout = if session.is_animating() || drag.is_dragging() {
            ANIMATION_FRAME
        } else {
            IDLE_POLL
        };
        if !event::poll(timeout)? {
            continue;
        }

        let now = Instant::now();
        match event::read()? {
            Event::Key(key) => {
                if view_state != ViewState::Swiping {
                    match view_state.dismiss() {
                        Some(next) => {
                            view_state = next;
                            continue;
                        }
                        None => break,
                    }
                }

                match handle_key_event(key) {
                    KeyAction::Quit => {
                        if session.statistics().reviewed() > 0 {
                            view_state = ViewState::Summary;
                        } else {
                            break;
                        }
                    }
                    KeyAction::Keep => {
                        session.trigger_keep(now);
                    }
                    KeyAction::Burn => {
                        session.trigger_discard(now);
                    }
                    KeyAction::Retry => {
                        session.retry_permission();
                    }
                    KeyAction::Help => view_state = ViewState::Help,
                    KeyAction::None => {}
                }
            }
            Event::Mouse(mouse) if view_state == ViewState::Swiping => match drag.handle(mouse) {
                PointerAction::Start => {
                    session.gesture_start(now);
                }
                PointerAction::Move { dx, dy } => {
                    session.gesture_update(dx, dy, now);
                }
                PointerAction::End => {
                    session.gesture_end(now);
                }
                PointerAction::None => {}
            },
            Event::Resize(columns, rows) => {
                session.set_viewport_width(viewport_width(Rect::new(0, 0, columns, rows)));
            }
            _ => {}
        }
    }

    Ok(())
}
