mod display;

use std::fs::File;
use std::io::{self, stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use display::Viewport;
use flappy_plus::compute::GameSession;
use flappy_plus::entities::SoundCue;
use flappy_plus::ports::AudioSink;
use flappy_plus::store::FileHighScoreStore;

const FRAME: Duration = Duration::from_micros(16_667); // ≈60 FPS

#[derive(Parser, Debug)]
#[command(name = "flappy_plus")]
#[command(about = "Flappy Bird in the terminal, with a guest appearance every 50 points")]
struct Args {
    /// Seed for pipe placement and cosmetics (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Where to keep the high score (defaults to the user config directory)
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Start with the classic look
    #[arg(long)]
    classic: bool,

    /// Don't ring the terminal bell for sound effects
    #[arg(long)]
    mute: bool,

    /// Write logs here; filter with FLAPPY_LOG (default "info")
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ── Sound ─────────────────────────────────────────────────────────────────────

/// The terminal has one sound: the bell. Ring it for the cues that matter.
struct TerminalBell {
    muted: bool,
}

impl AudioSink for TerminalBell {
    fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        if matches!(cue, SoundCue::Score | SoundCue::Hit | SoundCue::MarioPipe) {
            let mut err = io::stderr();
            let _ = err.write_all(b"\x07").and_then(|()| err.flush());
        }
    }
}

type Session = GameSession<FileHighScoreStore, TerminalBell>;

// ── Logging ───────────────────────────────────────────────────────────────────

/// stdout is the game screen, so logs only go to a file when asked for.
fn init_logging(path: Option<&PathBuf>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FLAPPY_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the player quits.
///
/// Input events are drained without blocking at the start of every frame and
/// applied before the tick, so intents never interleave with a simulation
/// step.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut Session,
    rx: &mpsc::Receiver<Event>,
    rng: &mut StdRng,
) -> io::Result<()> {
    loop {
        let frame_start = Instant::now();
        let view = Viewport::current()?;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, modifiers, .. }) => {
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Enter => session.handle_restart(rng),
                        KeyCode::Char(c) => session.handle_key_typed(c),
                        _ => {}
                    }
                }
                Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                    let (x, y) = view.to_playfield(column, row);
                    match kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            session.handle_pointer_down(x, y);
                        }
                        MouseEventKind::Up(MouseButton::Left) => {
                            session.handle_pointer_up();
                            session.handle_click(x, y, rng);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        session.tick(rng);
        display::render(out, view, session)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let path = match args.high_score_file.clone() {
        Some(path) => path,
        None => FileHighScoreStore::default_path().unwrap_or_else(|error| {
            warn!(%error, "falling back to the working directory for the high score");
            PathBuf::from("high_score.txt")
        }),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = GameSession::new(
        FileHighScoreStore::new(path),
        TerminalBell { muted: args.mute },
        &mut rng,
    );
    if args.classic {
        session.theme.new_graphics = false;
    }

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(EnableMouseCapture)?;
    out.execute(cursor::Hide)?;

    // Blocking reads live on their own thread; the loop only polls the channel.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = game_loop(&mut out, &mut session, &rx, &mut rng);

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
