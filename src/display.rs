//! Terminal renderer. Reads a session snapshot and scales playfield pixels
//! down to terminal cells; never mutates game state.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use flappy_plus::compute::GameSession;
use flappy_plus::entities::{
    Bird, BirdColor, Fireball, GameMode, Mario, MarioPose, Medal, Pipe, Rect, BIRD_HEIGHT,
    BIRD_WIDTH, FIREBALL_HEIGHT, FIREBALL_WIDTH, FRAME_HEIGHT, FRAME_WIDTH, GROUND_LEVEL,
    MARIO_HEIGHT, MARIO_WIDTH, PIPE_WIDTH,
};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_SKY_DAY: Color = Color::Cyan;
const C_SKY_NIGHT: Color = Color::DarkBlue;
const C_PIPE: Color = Color::Green;
const C_PIPE_CLASSIC: Color = Color::DarkGreen;
const C_GROUND: Color = Color::DarkYellow;
const C_MARIO: Color = Color::Red;
const C_FIREBALL: Color = Color::Yellow;
const C_SCORE: Color = Color::White;
const C_HINT: Color = Color::DarkGrey;
const C_BUTTON: Color = Color::Yellow;
const C_BUTTON_PRESSED: Color = Color::DarkYellow;

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Maps the playfield onto the terminal grid. Row 0 holds the HUD and the
/// last row the controls hint; everything between is playfield.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn current() -> std::io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self { cols, rows })
    }

    fn field_rows(&self) -> i32 {
        (self.rows as i32 - 2).max(1)
    }

    pub fn col(&self, x: i32) -> i32 {
        x * self.cols as i32 / FRAME_WIDTH
    }

    pub fn row(&self, y: i32) -> i32 {
        1 + y * self.field_rows() / FRAME_HEIGHT
    }

    /// Inverse of `col`/`row`: the playfield pixel at the centre of a cell.
    pub fn to_playfield(&self, col: u16, row: u16) -> (i32, i32) {
        let cell_w = FRAME_WIDTH / (self.cols as i32).max(1);
        let cell_h = FRAME_HEIGHT / self.field_rows();
        let x = col as i32 * FRAME_WIDTH / (self.cols as i32).max(1) + cell_w / 2;
        let y = (row as i32 - 1) * FRAME_HEIGHT / self.field_rows() + cell_h / 2;
        (x, y)
    }

    fn visible(&self, col: i32, row: i32) -> bool {
        col >= 0 && col < self.cols as i32 && row >= 1 && row < self.rows as i32 - 1
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write, S, A>(
    out: &mut W,
    view: Viewport,
    session: &GameSession<S, A>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_backdrop(out, view, session)?;
    for pipe in &session.pipes {
        draw_pipe(out, view, pipe, session.theme.new_graphics)?;
    }
    draw_ground(out, view, session.ground_x())?;

    if let Some(mario) = session.mario_on_stage() {
        draw_mario(out, view, mario)?;
        for fireball in &session.fireballs {
            draw_fireball(out, view, fireball)?;
        }
    }
    draw_bird(out, view, &session.bird)?;

    match session.mode {
        GameMode::Crashed => draw_game_over(out, view, session)?,
        GameMode::Ready => {
            draw_score(out, view, session.score)?;
            draw_get_ready(out, view)?;
        }
        GameMode::Playing | GameMode::MarioBonus => draw_score(out, view, session.score)?,
    }
    draw_controls_hint(out, view)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn put<W: Write>(out: &mut W, view: Viewport, col: i32, row: i32, glyph: &str) -> std::io::Result<()> {
    if view.visible(col, row) {
        out.queue(cursor::MoveTo(col as u16, row as u16))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

// ── Scenery ───────────────────────────────────────────────────────────────────

fn draw_backdrop<W: Write, S, A>(
    out: &mut W,
    view: Viewport,
    session: &GameSession<S, A>,
) -> std::io::Result<()> {
    let night = session.theme.new_graphics && session.theme.dark;
    let (color, glyphs): (Color, &[&str]) = if night {
        (C_SKY_NIGHT, &["▖", " ", "▟", "█", "▙", " ", "▗", "▄"])
    } else {
        (C_SKY_DAY, &[" ", "▁", "▃", "▅", "▃", "▁", " ", " "])
    };
    out.queue(style::SetForegroundColor(color))?;

    // A skyline strip that slides with the backdrop offset.
    let row = view.row(GROUND_LEVEL) - 1;
    let shift = -(view.col(session.backdrop_x() as i32));
    for col in 0..view.cols as i32 {
        let idx = (col + shift).rem_euclid(glyphs.len() as i32) as usize;
        put(out, view, col, row, glyphs[idx])?;
    }
    Ok(())
}

fn draw_ground<W: Write>(out: &mut W, view: Viewport, ground_x: i32) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_GROUND))?;
    let top = view.row(GROUND_LEVEL);
    let shift = -(view.col(ground_x));
    for row in top..view.rows as i32 - 1 {
        for col in 0..view.cols as i32 {
            let glyph = if row == top && (col + shift).rem_euclid(4) < 2 { "▓" } else { "░" };
            put(out, view, col, row, glyph)?;
        }
    }
    Ok(())
}

fn draw_pipe<W: Write>(out: &mut W, view: Viewport, pipe: &Pipe, new_graphics: bool) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(if new_graphics { C_PIPE } else { C_PIPE_CLASSIC }))?;

    let left = view.col(pipe.x);
    let right = view.col(pipe.x + PIPE_WIDTH).max(left + 1);
    let upper = pipe.upper_bound();
    let lower = pipe.lower_bound();
    let ground = view.row(GROUND_LEVEL);

    let spans = [
        (view.row(upper.y.max(0)), view.row(upper.bottom())),
        (view.row(lower.y), view.row(lower.bottom()).min(ground)),
    ];
    for (top, bottom) in spans {
        for row in top..bottom {
            for col in left..right {
                put(out, view, col, row, "█")?;
            }
        }
    }
    Ok(())
}

// ── Actors ────────────────────────────────────────────────────────────────────

fn draw_bird<W: Write>(out: &mut W, view: Viewport, bird: &Bird) -> std::io::Result<()> {
    let color = match bird.color {
        BirdColor::Yellow => Color::Yellow,
        BirdColor::Blue => Color::Blue,
        BirdColor::Red => Color::Red,
    };
    out.queue(style::SetForegroundColor(color))?;

    // Wing cycle mid, down, mid, up.
    let wing = ["─", "╲", "─", "╱"][bird.wing_frame % 4];
    let col = view.col(bird.x() + BIRD_WIDTH / 2) - 1;
    let row = view.row(bird.y() + BIRD_HEIGHT / 2);
    put(out, view, col, row, wing)?;
    put(out, view, col + 1, row, "●")?;
    put(out, view, col + 2, row, "▸")?;
    Ok(())
}

fn draw_mario<W: Write>(out: &mut W, view: Viewport, mario: &Mario) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_MARIO))?;
    let col = view.col(mario.x() + MARIO_WIDTH / 2);
    let head = view.row(mario.y());
    let feet = view.row(mario.y() + MARIO_HEIGHT).max(head + 1);
    let (hat, body) = match mario.pose {
        MarioPose::Throwing => ("M", "╋━"),
        MarioPose::Jumping | MarioPose::FinalJumping => ("M", "╳"),
        MarioPose::Entering | MarioPose::Standing => ("M", "╂"),
    };
    put(out, view, col, head, hat)?;
    for row in head + 1..feet {
        put(out, view, col, row, body)?;
    }
    Ok(())
}

fn draw_fireball<W: Write>(out: &mut W, view: Viewport, fireball: &Fireball) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_FIREBALL))?;
    let bounds = fireball.bounds();
    put(
        out,
        view,
        view.col(bounds.x + FIREBALL_WIDTH / 2),
        view.row(bounds.y + FIREBALL_HEIGHT / 2),
        "✹",
    )
}

// ── HUD ───────────────────────────────────────────────────────────────────────

fn centred<W: Write>(out: &mut W, view: Viewport, row: u16, text: &str, color: Color) -> std::io::Result<()> {
    let col = (view.cols / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn draw_score<W: Write>(out: &mut W, view: Viewport, score: u32) -> std::io::Result<()> {
    centred(out, view, 0, &score.to_string(), C_SCORE)
}

fn draw_get_ready<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    let row = view.row(180).max(0) as u16;
    centred(out, view, row, "╔═══════════════╗", Color::Green)?;
    centred(out, view, row + 1, "║   GET READY   ║", Color::Green)?;
    centred(out, view, row + 2, "╚═══════════════╝", Color::Green)?;
    centred(out, view, row + 4, "SPACE to flap", Color::White)
}

fn medal_line(medal: Option<Medal>) -> (&'static str, Color) {
    match medal {
        Some(Medal::Platinum) => ("◉ PLATINUM", Color::White),
        Some(Medal::Gold) => ("◉ GOLD", Color::Yellow),
        Some(Medal::Silver) => ("◉ SILVER", Color::Grey),
        Some(Medal::Bronze) => ("◉ BRONZE", Color::DarkYellow),
        None => ("", Color::DarkGrey),
    }
}

fn draw_game_over<W: Write, S, A>(
    out: &mut W,
    view: Viewport,
    session: &GameSession<S, A>,
) -> std::io::Result<()> {
    let row = view.row(130).max(0) as u16;
    centred(out, view, row, "╔════════════════════╗", Color::Red)?;
    centred(out, view, row + 1, "║     GAME  OVER     ║", Color::Red)?;
    centred(out, view, row + 2, "╚════════════════════╝", Color::Red)?;

    centred(out, view, row + 4, &format!("Score: {:>6}", session.score), Color::Yellow)?;
    let best = if session.is_new_high_score() {
        format!("Best:  {:>6}  NEW", session.high_score)
    } else {
        format!("Best:  {:>6}", session.high_score)
    };
    centred(out, view, row + 5, &best, Color::Yellow)?;

    let (medal, medal_color) = medal_line(session.medal());
    if !medal.is_empty() {
        centred(out, view, row + 6, medal, medal_color)?;
    }

    draw_restart_button(out, view, session.restart_button(), session.is_restart_button_pressed())
}

fn draw_restart_button<W: Write>(
    out: &mut W,
    view: Viewport,
    button: Rect,
    pressed: bool,
) -> std::io::Result<()> {
    // Pressed buttons sink a few pixels.
    let y = if pressed { button.y + 3 } else { button.y };
    let row = view.row(y + button.height / 2).max(0) as u16;
    let color = if pressed { C_BUTTON_PRESSED } else { C_BUTTON };
    centred(out, view, row, "[ ▶ PLAY AGAIN ]", color)
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("SPACE : Flap   ENTER / click : Play again   Q : Quit"))?;
    Ok(())
}
