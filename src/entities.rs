//! Game entity types and their per-tick motion.
//!
//! Coordinates are playfield pixels with the origin at the top-left corner
//! and `y` growing downward. Positions that drive physics are `f64`; collision
//! boxes truncate them to whole pixels.

use core::ops::Range;

use rand::Rng;

// ── Playfield ─────────────────────────────────────────────────────────────────

pub const FRAME_WIDTH: i32 = 500;
pub const FRAME_HEIGHT: i32 = 700;
/// Top edge of the ground strip. The bird crashes when its feet reach it.
pub const GROUND_LEVEL: i32 = 577;
/// Horizontal scroll speed of pipes and ground. Must be negative (leftward).
pub const SCROLL_VELOCITY: i32 = -3;

/// The region the bird is allowed to occupy.
pub const fn playfield() -> Rect {
    Rect::new(0, 0, FRAME_WIDTH, GROUND_LEVEL)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Edge-inclusive overlap test: rectangles that merely touch intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Half-open point test, `[x, x + width) × [y, y + height)`.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

// ── Modes, cues and cosmetics ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameMode {
    /// Bird hovers in place waiting for the first flap.
    #[default]
    Ready,
    Playing,
    Crashed,
    /// Playing, with the Mario interlude in progress.
    MarioBonus,
}

impl GameMode {
    /// Playing and MarioBonus share physics, scoring and collisions.
    pub fn is_active(self) -> bool {
        matches!(self, GameMode::Playing | GameMode::MarioBonus)
    }
}

/// Sound effects the session asks the audio collaborator to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Fly,
    Score,
    Hit,
    Die,
    Swoosh,
    MarioPipe,
    MarioFireball,
    MarioJump,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BirdColor {
    #[default]
    Yellow,
    Blue,
    Red,
}

impl BirdColor {
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => BirdColor::Yellow,
            1 => BirdColor::Blue,
            _ => BirdColor::Red,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Medal {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Medal {
    pub fn for_score(score: u32) -> Option<Medal> {
        match score {
            40.. => Some(Medal::Platinum),
            30..=39 => Some(Medal::Gold),
            20..=29 => Some(Medal::Silver),
            10..=19 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

/// Cosmetic variant. Affects scroll wrap points and the restart button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// `false` selects the classic look (yellow bird, small button).
    pub new_graphics: bool,
    /// Night backdrop; only visible with new graphics.
    pub dark: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self { new_graphics: true, dark: false }
    }
}

// ── Bird ──────────────────────────────────────────────────────────────────────

pub const BIRD_WIDTH: i32 = 55;
pub const BIRD_HEIGHT: i32 = 38;
pub const BIRD_START_X: f64 = 120.0;
pub const BIRD_START_Y: f64 = 310.0;
/// Upward velocity applied by a flap (negative is up).
pub const FLY_VELOCITY: f64 = -10.5;
pub const GRAVITY: f64 = 0.7;
/// Wing cycle: mid, down, mid, up.
pub const WING_FRAMES: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub y_velocity: f64,
    pub wing_frame: usize,
    pub color: BirdColor,
}

impl Default for Bird {
    fn default() -> Self {
        Self::new()
    }
}

impl Bird {
    /// A bird hovering at the ready-phase position.
    pub fn new() -> Self {
        Self {
            x: BIRD_START_X,
            y: BIRD_START_Y,
            y_velocity: 0.0,
            wing_frame: 0,
            color: BirdColor::Yellow,
        }
    }

    pub fn x(&self) -> i32 {
        self.x as i32
    }

    pub fn y(&self) -> i32 {
        self.y as i32
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x(), self.y(), BIRD_WIDTH, BIRD_HEIGHT)
    }

    pub fn intersects(&self, rect: &Rect) -> bool {
        self.bounds().intersects(rect)
    }

    pub fn fly(&mut self) {
        self.y_velocity = FLY_VELOCITY;
    }

    /// One tick of gravity, clamped to `bounds`. Hitting either edge stops
    /// vertical motion.
    pub fn update(&mut self, bounds: &Rect) {
        self.y_velocity += GRAVITY;
        self.y += self.y_velocity;

        let floor = f64::from(bounds.bottom() - BIRD_HEIGHT);
        let ceiling = f64::from(bounds.y);
        if self.y > floor {
            self.y = floor;
            self.y_velocity = 0.0;
        } else if self.y < ceiling {
            self.y = ceiling;
            self.y_velocity = 0.0;
        }
    }

    pub fn animate(&mut self) {
        self.wing_frame = (self.wing_frame + 1) % WING_FRAMES;
    }

    /// Back to the ready-phase hover. Color is left alone.
    pub fn reset(&mut self) {
        self.x = BIRD_START_X;
        self.y = BIRD_START_Y;
        self.y_velocity = 0.0;
        self.wing_frame = 0;
    }
}

// ── Pipe ──────────────────────────────────────────────────────────────────────

pub const PIPE_WIDTH: i32 = 94;
pub const PIPE_HEIGHT: i32 = 1050;
/// Height of each collision segment (upper and lower).
pub const PIPE_SEGMENT_HEIGHT: i32 = 445;
/// Distance from the top of the upper segment to the top of the lower one.
/// The gap the bird flies through is `PIPE_LOWER_OFFSET - PIPE_SEGMENT_HEIGHT`.
pub const PIPE_LOWER_OFFSET: i32 = 605;
/// New pipes appear this far past the right edge.
pub const PIPE_SPAWN_MARGIN: i32 = 200;
/// Fixed gap offset of the pipe Mario climbs out of.
pub const MARIO_PIPE_SHIFT: i32 = -330;

const SHIFT_HEADROOM: i32 = 300;
const SHIFT_LIFT: i32 = 370;

/// Stable handle for a pipe, assigned by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Pipe {
    pub id: PipeId,
    pub x: i32,
    /// Position before the latest `update`, for crossing detection.
    pub previous_x: i32,
    /// Vertical offset of the upper segment. Fixed for the pipe's lifetime.
    pub shift: i32,
    pub x_velocity: i32,
}

impl Pipe {
    /// Range of random gap offsets for a playfield. Every offset in it leaves
    /// the gap reachable.
    pub fn shift_range(bounds: &Rect) -> Range<i32> {
        -SHIFT_LIFT..(bounds.bottom() - SHIFT_HEADROOM - SHIFT_LIFT)
    }

    pub fn random(id: PipeId, bounds: &Rect, x_velocity: i32, rng: &mut impl Rng) -> Self {
        let span = f64::from(bounds.bottom() - SHIFT_HEADROOM);
        let shift = (rng.gen::<f64>() * span) as i32 - SHIFT_LIFT;
        debug_assert!(
            Self::shift_range(bounds).contains(&shift),
            "pipe shift {shift} outside {:?}",
            Self::shift_range(bounds)
        );
        Self::with_shift(id, bounds, x_velocity, shift)
    }

    pub fn with_shift(id: PipeId, bounds: &Rect, x_velocity: i32, shift: i32) -> Self {
        let x = bounds.right() + PIPE_SPAWN_MARGIN;
        Self { id, x, previous_x: x, shift, x_velocity }
    }

    pub fn update(&mut self) {
        self.previous_x = self.x;
        self.x += self.x_velocity;
    }

    pub fn upper_bound(&self) -> Rect {
        Rect::new(self.x, self.shift, PIPE_WIDTH, PIPE_SEGMENT_HEIGHT)
    }

    pub fn lower_bound(&self) -> Rect {
        Rect::new(
            self.x,
            self.shift + PIPE_LOWER_OFFSET,
            PIPE_WIDTH,
            PIPE_SEGMENT_HEIGHT,
        )
    }

    /// True on the one tick the pipe moves from ahead of `bird_x` to at or
    /// behind it.
    pub fn crossed(&self, bird_x: i32) -> bool {
        self.previous_x > bird_x && self.x <= bird_x
    }

    pub fn park(&mut self) {
        self.x_velocity = 0;
    }

    pub fn release(&mut self, x_velocity: i32) {
        self.x_velocity = x_velocity;
    }

    pub fn is_parked(&self) -> bool {
        self.x_velocity == 0
    }

    pub fn is_off_screen(&self) -> bool {
        self.x < -PIPE_WIDTH
    }
}

// ── Fireball ──────────────────────────────────────────────────────────────────

pub const FIREBALL_WIDTH: i32 = 24;
pub const FIREBALL_HEIGHT: i32 = 27;
pub const FIREBALL_SPEED: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Fireball {
    pub x: f64,
    pub y: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
}

impl Fireball {
    /// A fireball leaving `(from_x, from_y)` toward where the target is now.
    /// It does not home.
    pub fn aimed(from_x: i32, from_y: i32, target_x: i32, target_y: i32, speed: f64) -> Self {
        let dx = f64::from(target_x - from_x);
        let dy = f64::from(target_y - from_y);
        let angle = dy.atan2(dx);
        Self {
            x: f64::from(from_x),
            y: f64::from(from_y),
            x_velocity: speed * angle.cos(),
            y_velocity: speed * angle.sin(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, FIREBALL_WIDTH, FIREBALL_HEIGHT)
    }

    pub fn update(&mut self) {
        self.x += self.x_velocity;
        self.y += self.y_velocity;
    }

    pub fn is_off_screen(&self) -> bool {
        !self
            .bounds()
            .intersects(&Rect::new(0, 0, FRAME_WIDTH, FRAME_HEIGHT))
    }
}

// ── Mario ─────────────────────────────────────────────────────────────────────

pub const MARIO_WIDTH: i32 = 41;
pub const MARIO_HEIGHT: i32 = 74;
const MARIO_CLIMB_VELOCITY: f64 = -1.0;
const MARIO_JUMP_VELOCITY: f64 = -7.0;
const MARIO_LEAP_VELOCITY: f64 = -5.0;
const MARIO_GRAVITY: f64 = 0.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarioPose {
    /// Climbing out of the lower pipe.
    #[default]
    Entering,
    Standing,
    Throwing,
    Jumping,
    /// Leaping off the pipe toward the bird; ends below the ground.
    FinalJumping,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mario {
    pub x: f64,
    pub y: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
    pub pose: MarioPose,
}

impl Mario {
    pub fn x(&self) -> i32 {
        self.x as i32
    }

    pub fn y(&self) -> i32 {
        self.y as i32
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x(), self.y(), MARIO_WIDTH, MARIO_HEIGHT)
    }

    /// Put Mario at the mouth of `pipe`'s lower segment, climbing.
    pub fn start(&mut self, pipe: &Pipe) -> SoundCue {
        self.pose = MarioPose::Entering;
        self.x = f64::from(pipe.x + PIPE_WIDTH / 2 - MARIO_WIDTH / 2);
        self.y = f64::from(pipe.lower_bound().y);
        self.x_velocity = 0.0;
        self.y_velocity = MARIO_CLIMB_VELOCITY;
        SoundCue::MarioPipe
    }

    pub fn stand(&mut self) {
        self.pose = MarioPose::Standing;
    }

    pub fn throw(&mut self) -> SoundCue {
        self.pose = MarioPose::Throwing;
        SoundCue::MarioFireball
    }

    pub fn jump(&mut self) -> SoundCue {
        self.pose = MarioPose::Jumping;
        self.y_velocity = MARIO_JUMP_VELOCITY;
        SoundCue::MarioJump
    }

    pub fn final_jump(&mut self) -> SoundCue {
        self.pose = MarioPose::FinalJumping;
        self.x_velocity = MARIO_LEAP_VELOCITY;
        self.y_velocity = MARIO_JUMP_VELOCITY;
        SoundCue::MarioJump
    }

    /// Advance one tick. `pipe_top` is the top edge of the lower segment
    /// Mario stands on. Returns the cue of any transition it caused.
    pub fn update(&mut self, pipe_top: i32) -> Option<SoundCue> {
        self.x += self.x_velocity;
        self.y += self.y_velocity;

        let standing_y = f64::from(pipe_top - MARIO_HEIGHT);
        match self.pose {
            MarioPose::Entering if self.y <= standing_y => Some(self.jump()),
            MarioPose::Jumping => {
                if self.y >= standing_y {
                    self.y_velocity = 0.0;
                    self.pose = MarioPose::Standing;
                } else {
                    self.y_velocity += MARIO_GRAVITY;
                }
                None
            }
            MarioPose::FinalJumping => {
                self.y_velocity += MARIO_GRAVITY;
                None
            }
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.y > f64::from(GROUND_LEVEL)
    }
}
