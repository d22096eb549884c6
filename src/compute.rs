//! The game session: per-tick simulation, input intents and mode changes.
//!
//! The host owns a `GameSession`, calls `tick` once per frame and forwards
//! input intents between ticks. All randomness comes through the `rng`
//! argument so callers control determinism (tests use a seeded RNG).

use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, info};

use crate::codes::{CodeAction, CodeBuffer};
use crate::entities::{
    playfield, Bird, BirdColor, Fireball, GameMode, Mario, Medal, Pipe, PipeId, Rect, SoundCue,
    Theme, BIRD_HEIGHT, FIREBALL_SPEED, FRAME_WIDTH, GROUND_LEVEL, MARIO_PIPE_SHIFT,
    SCROLL_VELOCITY,
};
use crate::ports::{AudioSink, HighScoreStore};

// ── Tuning ────────────────────────────────────────────────────────────────────

/// Wing animation runs on every Nth frame.
pub const WING_CADENCE: u64 = 7;
/// A bonus starts whenever `(score + BONUS_LEAD) % BONUS_INTERVAL == 0`,
/// i.e. at 47, 97, 147...
pub const BONUS_INTERVAL: u32 = 50;
pub const BONUS_LEAD: u32 = 3;

/// Spawn the next pipe once the newest one is left of this.
const PIPE_SPAWN_X: i32 = FRAME_WIDTH - 80;
/// Mario's pipe waits for more room than a regular one.
const MARIO_PIPE_SPAWN_X: i32 = FRAME_WIDTH - 200;
/// Mario's pipe stops here and Mario climbs out.
const MARIO_PIPE_PARK_X: i32 = FRAME_WIDTH - 185;

const BACKDROP_SPEED: f64 = SCROLL_VELOCITY as f64 / 8.0;
const DARK_BACKDROP_WRAP: f64 = -320.0;
const DAY_BACKDROP_WRAP: f64 = -240.0;
const NEW_GROUND_WRAP: i32 = -30;
const CLASSIC_GROUND_WRAP: i32 = -20;

pub const NEW_RESTART_BUTTON: Rect = Rect::new(158, 475, 184, 103);
pub const CLASSIC_RESTART_BUTTON: Rect = Rect::new(179, 500, 142, 50);

// ── Cue sheet ─────────────────────────────────────────────────────────────────

/// Frame offsets are counted from the tick Mario climbed out of his pipe.
const THROW_OFFSETS: [u64; 6] = [160, 170, 180, 280, 290, 300];
const STAND_OFFSETS: [u64; 6] = [165, 175, 185, 285, 295, 305];
const JUMP_OFFSET: u64 = 220;
const FINAL_JUMP_OFFSET: u64 = 350;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarioCue {
    Throw,
    Stand,
    Jump,
    FinalJump,
}

/// What Mario does `offset` frames into his act, if anything.
pub fn cue_at(offset: u64) -> Option<MarioCue> {
    if THROW_OFFSETS.contains(&offset) {
        Some(MarioCue::Throw)
    } else if STAND_OFFSETS.contains(&offset) {
        Some(MarioCue::Stand)
    } else if offset == JUMP_OFFSET {
        Some(MarioCue::Jump)
    } else if offset == FINAL_JUMP_OFFSET {
        Some(MarioCue::FinalJump)
    } else {
        None
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Everything needed to play one game, round after round.
///
/// Entity state is public so a renderer can read it and tests can arrange
/// it. Collaborators and bookkeeping stay private.
pub struct GameSession<S, A> {
    pub bird: Bird,
    /// Oldest (leftmost) pipe first. Never empty between ticks.
    pub pipes: VecDeque<Pipe>,
    pub fireballs: Vec<Fireball>,
    pub mario: Mario,
    pub mode: GameMode,
    pub score: u32,
    pub high_score: u32,
    pub frame: u64,
    pub theme: Theme,

    mario_pipe_id: Option<PipeId>,
    /// Set once Mario has climbed out; `None` while his pipe is on its way.
    mario_start_frame: Option<u64>,
    new_high_score: bool,
    backdrop_x: f64,
    ground_x: i32,
    restart_button_pressed: bool,
    codes: CodeBuffer,
    next_pipe_id: u64,

    store: S,
    audio: A,
}

impl<S, A> GameSession<S, A> {
    pub fn is_new_high_score(&self) -> bool {
        self.new_high_score
    }

    /// Medal earned by the best score so far.
    pub fn medal(&self) -> Option<Medal> {
        Medal::for_score(self.high_score)
    }

    pub fn backdrop_x(&self) -> f64 {
        self.backdrop_x
    }

    pub fn ground_x(&self) -> i32 {
        self.ground_x
    }

    pub fn restart_button(&self) -> Rect {
        if self.theme.new_graphics {
            NEW_RESTART_BUTTON
        } else {
            CLASSIC_RESTART_BUTTON
        }
    }

    pub fn is_restart_button_pressed(&self) -> bool {
        self.restart_button_pressed
    }

    /// Mario, while he is out of his pipe.
    pub fn mario_on_stage(&self) -> Option<&Mario> {
        (self.mode == GameMode::MarioBonus && self.mario_start_frame.is_some())
            .then_some(&self.mario)
    }

    pub fn mario_pipe(&self) -> Option<&Pipe> {
        let id = self.mario_pipe_id?;
        self.pipes.iter().find(|p| p.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }
}

impl<S: HighScoreStore, A: AudioSink> GameSession<S, A> {
    /// A fresh session in Ready mode with one pipe waiting off screen.
    pub fn new(mut store: S, audio: A, rng: &mut impl Rng) -> Self {
        let high_score = store.read_high_score();
        let mut session = Self {
            bird: Bird::new(),
            pipes: VecDeque::new(),
            fireballs: Vec::new(),
            mario: Mario::default(),
            mode: GameMode::Ready,
            score: 0,
            high_score,
            frame: 0,
            theme: Theme {
                new_graphics: true,
                dark: rng.gen_bool(0.5),
            },
            mario_pipe_id: None,
            mario_start_frame: None,
            new_high_score: false,
            backdrop_x: 0.0,
            ground_x: 0,
            restart_button_pressed: false,
            codes: CodeBuffer::default(),
            next_pipe_id: 0,
            store,
            audio,
        };
        session.bird.color = BirdColor::random(rng);
        session.push_random_pipe(rng);
        info!(high_score, "session created");
        session
    }

    // ── Input intents ─────────────────────────────────────────────────────────

    /// Flap. The first flap of a round starts it. Ignored after a crash.
    pub fn handle_fly(&mut self) {
        if self.mode == GameMode::Crashed {
            return;
        }
        self.bird.fly();
        self.audio.play(SoundCue::Fly);
        if self.mode == GameMode::Ready {
            self.mode = GameMode::Playing;
            info!("round started");
        }
    }

    /// Start a new round. Only honoured once the bird has crashed.
    pub fn handle_restart(&mut self, rng: &mut impl Rng) {
        if self.mode != GameMode::Crashed {
            return;
        }
        self.score = 0;
        self.mode = GameMode::Ready;
        self.new_high_score = false;
        self.theme.dark = rng.gen_bool(0.5);

        self.bird.reset();
        self.bird.color = BirdColor::random(rng);
        self.fireballs.clear();
        self.mario = Mario::default();
        self.mario_start_frame = None;
        self.mario_pipe_id = None;
        self.pipes.clear();
        self.push_random_pipe(rng);

        self.restart_button_pressed = false;
        self.audio.play(SoundCue::Swoosh);
        info!("round restarted");
    }

    /// A typed character. Space flaps; anything else feeds the code buffer.
    pub fn handle_key_typed(&mut self, c: char) {
        if c == ' ' && self.mode != GameMode::Crashed {
            self.handle_fly();
            return;
        }
        match self.codes.push(c) {
            Some(CodeAction::ToggleGraphics) => {
                self.theme.new_graphics = !self.theme.new_graphics;
                info!(new_graphics = self.theme.new_graphics, "graphics toggled");
            }
            Some(CodeAction::ResetHighScore) => {
                self.high_score = 0;
                self.store.write_high_score(0);
                info!("high score reset");
            }
            None => {}
        }
    }

    pub fn handle_pointer_down(&mut self, x: i32, y: i32) {
        self.restart_button_pressed = self.restart_button().contains(x, y);
    }

    pub fn handle_pointer_up(&mut self) {
        self.restart_button_pressed = false;
    }

    /// A click on the restart button restarts a crashed round.
    pub fn handle_click(&mut self, x: i32, y: i32, rng: &mut impl Rng) {
        if self.mode == GameMode::Crashed && self.restart_button().contains(x, y) {
            self.handle_restart(rng);
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────────

    /// Advance the simulation by one frame.
    pub fn tick(&mut self, rng: &mut impl Rng) {
        self.frame += 1;

        // ── 1. Backdrop ───────────────────────────────────────────────────────
        self.scroll_backdrop();

        // ── 2. Ground collision ───────────────────────────────────────────────
        if self.mode.is_active() && self.bird.y() + BIRD_HEIGHT >= GROUND_LEVEL {
            self.crash();
        }

        // ── 3. Mario's act ────────────────────────────────────────────────────
        if self.mode == GameMode::MarioBonus {
            self.run_bonus();
        }

        // ── 4. Pipes: move, score, collide ────────────────────────────────────
        self.advance_pipes();

        // ── 5–6. Pipe lifecycle ───────────────────────────────────────────────
        self.spawn_pipe(rng);
        self.retire_pipe();

        // ── 7. Ground ─────────────────────────────────────────────────────────
        self.scroll_ground();

        // ── 8. Bird ───────────────────────────────────────────────────────────
        self.advance_bird();
    }

    fn scroll_backdrop(&mut self) {
        if self.mode == GameMode::Crashed {
            return;
        }
        let wrap = if self.theme.new_graphics && self.theme.dark {
            DARK_BACKDROP_WRAP
        } else {
            DAY_BACKDROP_WRAP
        };
        self.backdrop_x = if self.backdrop_x < wrap {
            0.0
        } else {
            self.backdrop_x + BACKDROP_SPEED
        };
    }

    fn scroll_ground(&mut self) {
        if self.mode == GameMode::Crashed {
            return;
        }
        let wrap = if self.theme.new_graphics {
            NEW_GROUND_WRAP
        } else {
            CLASSIC_GROUND_WRAP
        };
        self.ground_x = if self.ground_x < wrap {
            0
        } else {
            self.ground_x + SCROLL_VELOCITY
        };
    }

    fn run_bonus(&mut self) {
        let Some(start) = self.mario_start_frame else {
            return;
        };
        let Some(pipe_top) = self.mario_pipe().map(|p| p.lower_bound().y) else {
            return;
        };

        match cue_at(self.frame.saturating_sub(start)) {
            Some(MarioCue::Throw) => {
                self.fireballs.push(Fireball::aimed(
                    self.mario.x(),
                    self.mario.y(),
                    self.bird.x(),
                    self.bird.y(),
                    FIREBALL_SPEED,
                ));
                let cue = self.mario.throw();
                self.audio.play(cue);
                debug!(frame = self.frame, "mario throws");
            }
            Some(MarioCue::Stand) => self.mario.stand(),
            Some(MarioCue::Jump) => {
                let cue = self.mario.jump();
                self.audio.play(cue);
            }
            Some(MarioCue::FinalJump) => {
                let cue = self.mario.final_jump();
                self.audio.play(cue);
                debug!(frame = self.frame, "mario leaps");
            }
            None => {}
        }

        let mut burned = false;
        for fireball in &mut self.fireballs {
            burned |= self.bird.intersects(&fireball.bounds());
            fireball.update();
        }
        self.fireballs.retain(|f| !f.is_off_screen());
        if burned {
            self.crash();
        }

        // Mario landing on the bird bounces him off and ends the round.
        if self.bird.intersects(&self.mario.bounds()) {
            let cue = self.mario.jump();
            self.audio.play(cue);
            self.crash();
        }

        if let Some(cue) = self.mario.update(pipe_top) {
            self.audio.play(cue);
        }

        if self.mode == GameMode::MarioBonus && self.mario.is_finished() {
            self.end_bonus();
        }
    }

    fn advance_pipes(&mut self) {
        let bird_x = self.bird.x();
        for i in 0..self.pipes.len() {
            if self.mode.is_active() {
                self.pipes[i].update();
            }

            if self.mode.is_active() && self.pipes[i].crossed(bird_x) {
                self.score_point();
            }

            let pipe = &self.pipes[i];
            if self.mode.is_active()
                && (self.bird.intersects(&pipe.upper_bound())
                    || self.bird.intersects(&pipe.lower_bound()))
            {
                self.crash();
            }

            if Some(self.pipes[i].id) == self.mario_pipe_id {
                self.steer_mario_pipe(i);
            }
        }
    }

    fn score_point(&mut self) {
        self.score += 1;
        self.audio.play(SoundCue::Score);
        debug!(score = self.score, "pipe passed");
        if self.mode == GameMode::Playing && (self.score + BONUS_LEAD) % BONUS_INTERVAL == 0 {
            self.begin_bonus();
        }
    }

    /// Park Mario's pipe when it reaches its mark; let it go once he's gone.
    fn steer_mario_pipe(&mut self, index: usize) {
        let pipe = &mut self.pipes[index];
        if self.mode == GameMode::MarioBonus && !pipe.is_parked() && pipe.x < MARIO_PIPE_PARK_X {
            pipe.park();
            let cue = self.mario.start(pipe);
            self.audio.play(cue);
            self.mario_start_frame = Some(self.frame);
            info!(frame = self.frame, "mario enters");
        } else if self.mode == GameMode::Playing && pipe.is_parked() {
            pipe.release(SCROLL_VELOCITY);
        }
    }

    fn begin_bonus(&mut self) {
        // An earlier Mario pipe still on screen becomes an ordinary pipe.
        if let Some(id) = self.mario_pipe_id.take() {
            if let Some(pipe) = self.pipes.iter_mut().find(|p| p.id == id) {
                pipe.release(SCROLL_VELOCITY);
            }
        }
        self.mode = GameMode::MarioBonus;
        self.mario = Mario::default();
        self.mario_start_frame = None;
        self.fireballs.clear();
        info!(score = self.score, "bonus started");
    }

    fn end_bonus(&mut self) {
        self.mode = GameMode::Playing;
        self.mario_start_frame = None;
        self.fireballs.clear();
        info!(score = self.score, "bonus finished");
    }

    fn spawn_pipe(&mut self, rng: &mut impl Rng) {
        let last_x = self.pipes.back().map_or(i32::MIN, |p| p.x);
        match self.mode {
            GameMode::Playing if last_x < PIPE_SPAWN_X => self.push_random_pipe(rng),
            GameMode::MarioBonus if self.mario_pipe_id.is_none() && last_x < MARIO_PIPE_SPAWN_X => {
                let id = self.allocate_pipe_id();
                self.pipes.push_back(Pipe::with_shift(
                    id,
                    &playfield(),
                    SCROLL_VELOCITY,
                    MARIO_PIPE_SHIFT,
                ));
                self.mario_pipe_id = Some(id);
                debug!(?id, "mario pipe spawned");
            }
            _ => {}
        }
    }

    fn retire_pipe(&mut self) {
        if self.pipes.len() < 2 {
            return;
        }
        if self.pipes.front().is_some_and(Pipe::is_off_screen) {
            if let Some(pipe) = self.pipes.pop_front() {
                if Some(pipe.id) == self.mario_pipe_id {
                    self.mario_pipe_id = None;
                }
                debug!(id = ?pipe.id, "pipe retired");
            }
        }
    }

    fn advance_bird(&mut self) {
        if !self.theme.new_graphics {
            self.bird.color = BirdColor::Yellow;
        }
        let flap = self.frame % WING_CADENCE == 0;
        match self.mode {
            GameMode::Ready => {
                if flap {
                    self.bird.animate();
                }
            }
            GameMode::Playing | GameMode::MarioBonus => {
                if flap {
                    self.bird.animate();
                }
                self.bird.update(&playfield());
            }
            GameMode::Crashed => self.bird.update(&playfield()),
        }
    }

    /// End the round. Only the first crash of a round counts.
    fn crash(&mut self) {
        if !self.mode.is_active() {
            return;
        }
        self.mode = GameMode::Crashed;
        if self.score > self.high_score {
            self.new_high_score = true;
            self.high_score = self.score;
            self.store.write_high_score(self.score);
        }
        self.audio.play(SoundCue::Die);
        self.audio.play(SoundCue::Hit);
        info!(score = self.score, high_score = self.high_score, "bird crashed");
    }

    fn allocate_pipe_id(&mut self) -> PipeId {
        let id = PipeId(self.next_pipe_id);
        self.next_pipe_id += 1;
        id
    }

    fn push_random_pipe(&mut self, rng: &mut impl Rng) {
        let id = self.allocate_pipe_id();
        let pipe = Pipe::random(id, &playfield(), SCROLL_VELOCITY, rng);
        debug!(?id, shift = pipe.shift, "pipe spawned");
        self.pipes.push_back(pipe);
    }
}
