use flappy_plus::compute::*;
use flappy_plus::entities::*;
use flappy_plus::ports::{AudioSink, HighScoreStore, MemoryStore, NullAudio, RecordingAudio};

use rand::rngs::StdRng;
use rand::SeedableRng;

type TestSession = GameSession<MemoryStore, RecordingAudio>;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_session(stored_high_score: u32) -> TestSession {
    GameSession::new(
        MemoryStore::with_score(stored_high_score),
        RecordingAudio::default(),
        &mut seeded_rng(),
    )
}

/// A pipe whose gap (245..405) lets the ready-height bird through.
fn open_pipe(id: u64, x: i32) -> Pipe {
    let mut pipe = Pipe::with_shift(PipeId(id), &playfield(), SCROLL_VELOCITY, -200);
    pipe.x = x;
    pipe.previous_x = x;
    pipe
}

/// Playing, with a single pipe one tick away from passing the bird.
fn about_to_score(score: u32) -> TestSession {
    let mut s = make_session(0);
    s.mode = GameMode::Playing;
    s.score = score;
    s.pipes.clear();
    let x = s.bird.x() + 2;
    s.pipes.push_back(open_pipe(1_000, x));
    s
}

fn crash_on_ground(s: &mut TestSession, rng: &mut StdRng) {
    s.bird.y = f64::from(GROUND_LEVEL - BIRD_HEIGHT);
    s.tick(rng);
    assert_eq!(s.mode, GameMode::Crashed);
}

/// Keep the bird at the top-left, clear of Mario and his pipe.
fn pin_bird(s: &mut TestSession) {
    s.bird.y = 0.0;
    s.bird.y_velocity = 0.0;
}

/// Enter the bonus with the sky cleared for Mario's pipe.
fn into_bonus() -> (TestSession, StdRng) {
    let mut rng = seeded_rng();
    let mut s = about_to_score(46);
    s.tick(&mut rng);
    assert_eq!(s.mode, GameMode::MarioBonus);
    s.pipes.clear();
    (s, rng)
}

// ── new ───────────────────────────────────────────────────────────────────────

#[test]
fn new_session_is_ready_with_one_pipe() {
    let s = make_session(7);
    assert_eq!(s.mode, GameMode::Ready);
    assert_eq!(s.score, 0);
    assert_eq!(s.high_score, 7);
    assert_eq!(s.pipes.len(), 1);
    assert_eq!(s.pipes[0].x, FRAME_WIDTH + PIPE_SPAWN_MARGIN);
    assert_eq!(s.bird.x(), 120);
    assert_eq!(s.bird.y(), 310);
    assert!(s.theme.new_graphics);
    assert!(!s.is_new_high_score());
    assert!(s.audio().played.is_empty());
}

#[test]
fn same_seed_same_session() {
    let a = GameSession::new(MemoryStore::default(), RecordingAudio::default(), &mut StdRng::seed_from_u64(7));
    let b = GameSession::new(MemoryStore::default(), RecordingAudio::default(), &mut StdRng::seed_from_u64(7));
    assert_eq!(a.pipes, b.pipes);
    assert_eq!(a.theme, b.theme);
    assert_eq!(a.bird, b.bird);
}

#[test]
fn boxed_collaborators_work() {
    let store: Box<dyn HighScoreStore> = Box::new(MemoryStore::with_score(3));
    let audio: Box<dyn AudioSink> = Box::new(NullAudio);
    let mut s = GameSession::new(store, audio, &mut seeded_rng());
    assert_eq!(s.high_score, 3);
    s.handle_fly();
    s.tick(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::Playing);
}

// ── Ready ─────────────────────────────────────────────────────────────────────

#[test]
fn ready_bird_hovers_and_flaps() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    for _ in 0..20 {
        s.tick(&mut rng);
    }
    assert_eq!(s.frame, 20);
    assert_eq!(s.bird.y(), 310);
    assert_eq!(s.pipes[0].x, FRAME_WIDTH + PIPE_SPAWN_MARGIN);
    assert_eq!(s.bird.wing_frame, 2); // frames 7 and 14
    assert_eq!(s.mode, GameMode::Ready);
}

#[test]
fn first_flap_starts_round() {
    let mut s = make_session(0);
    s.handle_fly();
    assert_eq!(s.mode, GameMode::Playing);
    assert_eq!(s.bird.y_velocity, FLY_VELOCITY);
    assert_eq!(s.audio().played, vec![SoundCue::Fly]);
}

#[test]
fn flap_then_tick_rises() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.handle_fly();
    s.tick(&mut rng);
    assert!(s.bird.y < BIRD_START_Y);
}

#[test]
fn flap_ignored_after_crash() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.mode = GameMode::Playing;
    crash_on_ground(&mut s, &mut rng);
    let velocity = s.bird.y_velocity;
    s.handle_fly();
    assert_eq!(s.mode, GameMode::Crashed);
    assert_eq!(s.bird.y_velocity, velocity);
    assert_eq!(s.audio().count(SoundCue::Fly), 0);
}

// ── Scoring ───────────────────────────────────────────────────────────────────

#[test]
fn score_increments_once_per_crossing() {
    let mut s = about_to_score(0);
    let mut rng = seeded_rng();
    s.tick(&mut rng);
    assert_eq!(s.score, 1);
    assert_eq!(s.audio().count(SoundCue::Score), 1);

    s.tick(&mut rng);
    s.tick(&mut rng);
    assert_eq!(s.score, 1);
    assert_eq!(s.mode, GameMode::Playing);
}

#[test]
fn pipe_already_behind_bird_does_not_score() {
    let mut s = about_to_score(0);
    s.pipes[0] = open_pipe(1_000, 50);
    s.tick(&mut seeded_rng());
    assert_eq!(s.pipes[0].x, 47);
    assert_eq!(s.score, 0);
}

#[test]
fn no_scoring_while_ready() {
    let mut s = about_to_score(0);
    s.mode = GameMode::Ready;
    s.tick(&mut seeded_rng());
    assert_eq!(s.score, 0);
    assert_eq!(s.pipes[0].x, s.bird.x() + 2);
}

#[test]
fn bonus_starts_when_score_reaches_47() {
    let mut s = about_to_score(46);
    s.tick(&mut seeded_rng());
    assert_eq!(s.score, 47);
    assert_eq!(s.mode, GameMode::MarioBonus);
}

#[test]
fn no_bonus_before_47() {
    let mut s = about_to_score(45);
    s.tick(&mut seeded_rng());
    assert_eq!(s.score, 46);
    assert_eq!(s.mode, GameMode::Playing);
}

#[test]
fn second_bonus_at_97() {
    let mut s = about_to_score(96);
    s.tick(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::MarioBonus);
}

// ── Crashing ──────────────────────────────────────────────────────────────────

#[test]
fn hitting_a_pipe_crashes() {
    let mut s = about_to_score(0);
    // Upper segment reaches y=345, through the bird at 310..348.
    let mut pipe = Pipe::with_shift(PipeId(1_000), &playfield(), SCROLL_VELOCITY, -100);
    pipe.x = 150;
    pipe.previous_x = 150;
    s.pipes[0] = pipe;
    s.tick(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::Crashed);
    assert_eq!(s.audio().count(SoundCue::Die), 1);
    assert_eq!(s.audio().count(SoundCue::Hit), 1);
}

#[test]
fn touching_a_pipe_edge_crashes() {
    let mut s = about_to_score(0);
    // After the tick the pipe's left edge sits on the bird's right edge.
    let bird_right = s.bird.bounds().right();
    let mut pipe = Pipe::with_shift(PipeId(1_000), &playfield(), SCROLL_VELOCITY, -100);
    pipe.x = bird_right + 3;
    pipe.previous_x = pipe.x;
    s.pipes[0] = pipe;
    s.tick(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::Crashed);
}

#[test]
fn reaching_the_ground_crashes() {
    let mut s = make_session(0);
    s.mode = GameMode::Playing;
    crash_on_ground(&mut s, &mut seeded_rng());
}

#[test]
fn crash_counts_once_per_round() {
    let mut s = about_to_score(0);
    let mut pipe = Pipe::with_shift(PipeId(1_000), &playfield(), SCROLL_VELOCITY, -370);
    pipe.x = 150;
    pipe.previous_x = 150;
    s.pipes[0] = pipe;
    // On the ground and inside the lower segment at once.
    s.bird.y = f64::from(GROUND_LEVEL - BIRD_HEIGHT);
    s.tick(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::Crashed);
    assert_eq!(s.audio().count(SoundCue::Die), 1);
}

#[test]
fn new_high_score_is_saved() {
    let mut s = make_session(10);
    s.mode = GameMode::Playing;
    s.score = 12;
    crash_on_ground(&mut s, &mut seeded_rng());
    assert!(s.is_new_high_score());
    assert_eq!(s.high_score, 12);
    assert_eq!(s.store().score, 12);
    assert_eq!(s.store().writes, 1);
}

#[test]
fn lower_score_is_not_saved() {
    let mut s = make_session(10);
    s.mode = GameMode::Playing;
    s.score = 8;
    crash_on_ground(&mut s, &mut seeded_rng());
    assert!(!s.is_new_high_score());
    assert_eq!(s.high_score, 10);
    assert_eq!(s.store().writes, 0);
}

#[test]
fn crashed_world_freezes_but_bird_settles() {
    let mut s = about_to_score(0);
    let mut rng = seeded_rng();
    s.mode = GameMode::Crashed;
    s.bird.y = 100.0;
    let pipe_x = s.pipes[0].x;
    let ground_x = s.ground_x();
    let backdrop_x = s.backdrop_x();
    for _ in 0..200 {
        s.tick(&mut rng);
    }
    assert_eq!(s.pipes[0].x, pipe_x);
    assert_eq!(s.ground_x(), ground_x);
    assert_eq!(s.backdrop_x(), backdrop_x);
    assert_eq!(s.bird.y(), GROUND_LEVEL - BIRD_HEIGHT);
    assert_eq!(s.mode, GameMode::Crashed);
}

// ── Restart ───────────────────────────────────────────────────────────────────

#[test]
fn restart_resets_round_shape() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.mode = GameMode::Playing;
    s.score = 5;
    s.pipes.push_back(open_pipe(1_000, 300));
    s.pipes.push_back(open_pipe(1_001, 400));
    s.fireballs.push(Fireball::aimed(0, 0, 10, 10, FIREBALL_SPEED));
    crash_on_ground(&mut s, &mut rng);
    assert!(s.is_new_high_score());

    s.handle_restart(&mut rng);
    assert_eq!(s.mode, GameMode::Ready);
    assert_eq!(s.score, 0);
    assert_eq!(s.pipes.len(), 1);
    assert!(s.fireballs.is_empty());
    assert_eq!(s.bird.x(), 120);
    assert_eq!(s.bird.y(), 310);
    assert_eq!(s.bird.y_velocity, 0.0);
    assert!(!s.is_new_high_score());
    assert_eq!(s.high_score, 5);
    assert!(s.mario_pipe().is_none());
    assert_eq!(s.audio().count(SoundCue::Swoosh), 1);
}

#[test]
fn restart_ignored_unless_crashed() {
    let mut s = about_to_score(3);
    s.handle_restart(&mut seeded_rng());
    assert_eq!(s.mode, GameMode::Playing);
    assert_eq!(s.score, 3);
    assert_eq!(s.audio().count(SoundCue::Swoosh), 0);
}

#[test]
fn restart_twice_same_shape() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    for _ in 0..2 {
        s.mode = GameMode::Playing;
        crash_on_ground(&mut s, &mut rng);
        s.handle_restart(&mut rng);
        assert_eq!(s.mode, GameMode::Ready);
        assert_eq!(s.pipes.len(), 1);
        assert_eq!(s.score, 0);
    }
}

// ── Pipe lifecycle ────────────────────────────────────────────────────────────

#[test]
fn next_pipe_spawns_past_threshold() {
    let mut s = about_to_score(0);
    s.pipes[0] = open_pipe(1_000, FRAME_WIDTH - 79);
    s.tick(&mut seeded_rng());
    assert_eq!(s.pipes.len(), 2);
    assert_eq!(s.pipes[1].x, FRAME_WIDTH + PIPE_SPAWN_MARGIN);
}

#[test]
fn no_spawn_before_threshold() {
    let mut s = about_to_score(0);
    s.pipes[0] = open_pipe(1_000, FRAME_WIDTH - 70);
    s.tick(&mut seeded_rng());
    assert_eq!(s.pipes.len(), 1);
}

#[test]
fn off_screen_pipe_is_retired() {
    let mut s = about_to_score(0);
    s.pipes[0] = open_pipe(1_000, -PIPE_WIDTH + 1);
    s.pipes.push_back(open_pipe(1_001, 300));
    s.tick(&mut seeded_rng());
    assert_eq!(s.pipes[0].id, PipeId(1_001));
    // 300 → 297 is past the spawn threshold, so a fresh pipe follows.
    assert_eq!(s.pipes.len(), 2);
}

#[test]
fn last_pipe_is_never_retired() {
    let mut s = make_session(0);
    s.pipes[0] = open_pipe(1_000, -500);
    s.tick(&mut seeded_rng());
    assert_eq!(s.pipes.len(), 1);
}

#[test]
fn long_run_keeps_pipe_invariants() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    let mut rounds = 0;
    for _ in 0..20_000 {
        match s.mode {
            GameMode::Crashed => {
                s.handle_restart(&mut rng);
                rounds += 1;
            }
            _ => {
                // Flap whenever the bird sinks below the next gap's middle.
                let bird_x = s.bird.x();
                let target = s
                    .pipes
                    .iter()
                    .find(|p| p.x + PIPE_WIDTH >= bird_x)
                    .map_or(300, |p| p.upper_bound().bottom() + 80);
                if s.bird.y() + BIRD_HEIGHT / 2 > target + 20 && s.bird.y_velocity >= 0.0 {
                    s.handle_fly();
                }
            }
        }
        s.tick(&mut rng);

        assert!(!s.pipes.is_empty());
        assert!(s.pipes.len() <= 6, "pipes piled up: {}", s.pipes.len());
        for pipe in &s.pipes {
            assert!(pipe.upper_bound().bottom() < pipe.lower_bound().y);
        }
        assert!(s.bird.y >= 0.0 && s.bird.y() <= GROUND_LEVEL - BIRD_HEIGHT);
    }
    assert!(rounds > 0 || s.score > 0);
}

// ── Scrolling ─────────────────────────────────────────────────────────────────

#[test]
fn ground_scrolls_and_wraps() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.tick(&mut rng);
    assert_eq!(s.ground_x(), -3);
    for _ in 0..10 {
        s.tick(&mut rng);
    }
    assert_eq!(s.ground_x(), -33);
    s.tick(&mut rng);
    assert_eq!(s.ground_x(), 0);
}

#[test]
fn classic_ground_wraps_sooner_and_bird_turns_yellow() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.theme.new_graphics = false;
    s.bird.color = BirdColor::Blue;
    for _ in 0..7 {
        s.tick(&mut rng);
    }
    assert_eq!(s.ground_x(), -21);
    s.tick(&mut rng);
    assert_eq!(s.ground_x(), 0);
    assert_eq!(s.bird.color, BirdColor::Yellow);
}

#[test]
fn backdrop_drifts_slowly() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.tick(&mut rng);
    s.tick(&mut rng);
    assert!((s.backdrop_x() + 0.75).abs() < 1e-9);
}

// ── Key codes & pointer ───────────────────────────────────────────────────────

#[test]
fn space_key_flaps() {
    let mut s = make_session(0);
    s.handle_key_typed(' ');
    assert_eq!(s.mode, GameMode::Playing);
}

#[test]
fn graphics_code_toggles_theme_and_button() {
    let mut s = make_session(0);
    for c in "retro".chars() {
        s.handle_key_typed(c);
    }
    assert!(!s.theme.new_graphics);
    assert_eq!(s.restart_button(), CLASSIC_RESTART_BUTTON);
    for c in "retro".chars() {
        s.handle_key_typed(c);
    }
    assert!(s.theme.new_graphics);
    assert_eq!(s.restart_button(), NEW_RESTART_BUTTON);
}

#[test]
fn reset_code_clears_high_score() {
    let mut s = make_session(33);
    for c in "reset".chars() {
        s.handle_key_typed(c);
    }
    assert_eq!(s.high_score, 0);
    assert_eq!(s.store().score, 0);
    assert_eq!(s.store().writes, 1);
    assert_eq!(s.mode, GameMode::Ready);
}

#[test]
fn restart_button_press_and_click() {
    let mut s = make_session(0);
    let mut rng = seeded_rng();
    s.mode = GameMode::Playing;
    crash_on_ground(&mut s, &mut rng);

    let button = s.restart_button();
    s.handle_pointer_down(button.x + 1, button.y + 1);
    assert!(s.is_restart_button_pressed());
    s.handle_pointer_up();
    assert!(!s.is_restart_button_pressed());

    s.handle_click(button.x - 1, button.y + 1, &mut rng);
    assert_eq!(s.mode, GameMode::Crashed);
    s.handle_click(button.x + 1, button.y + 1, &mut rng);
    assert_eq!(s.mode, GameMode::Ready);
}

#[test]
fn click_does_nothing_mid_round() {
    let mut s = about_to_score(2);
    let button = s.restart_button();
    s.handle_click(button.x + 1, button.y + 1, &mut seeded_rng());
    assert_eq!(s.mode, GameMode::Playing);
    assert_eq!(s.score, 2);
}

#[test]
fn medal_follows_high_score() {
    assert_eq!(make_session(0).medal(), None);
    assert_eq!(make_session(25).medal(), Some(Medal::Silver));
}

// ── Mario bonus ───────────────────────────────────────────────────────────────

#[test]
fn cue_sheet_offsets() {
    for offset in [160, 170, 180, 280, 290, 300] {
        assert_eq!(cue_at(offset), Some(MarioCue::Throw), "offset {offset}");
    }
    for offset in [165, 175, 185, 285, 295, 305] {
        assert_eq!(cue_at(offset), Some(MarioCue::Stand), "offset {offset}");
    }
    assert_eq!(cue_at(220), Some(MarioCue::Jump));
    assert_eq!(cue_at(350), Some(MarioCue::FinalJump));
    assert_eq!(cue_at(0), None);
    assert_eq!(cue_at(161), None);
    assert_eq!(cue_at(351), None);
}

#[test]
fn mario_pipe_spawns_once_and_parks() {
    let (mut s, mut rng) = into_bonus();
    pin_bird(&mut s);
    s.tick(&mut rng);
    let pipe = s.mario_pipe().expect("mario pipe spawned");
    assert_eq!(pipe.shift, MARIO_PIPE_SHIFT);
    assert_eq!(pipe.x, FRAME_WIDTH + PIPE_SPAWN_MARGIN);
    assert_eq!(s.pipes.len(), 1);
    assert!(s.mario_on_stage().is_none());

    while s.mario_on_stage().is_none() {
        pin_bird(&mut s);
        s.tick(&mut rng);
        assert_eq!(s.pipes.len(), 1, "only the mario pipe while it approaches");
        assert!(s.frame < 1_000);
    }
    let pipe = s.mario_pipe().expect("mario pipe still live");
    assert!(pipe.is_parked());
    assert_eq!(pipe.x, 313);
    assert_eq!(s.audio().count(SoundCue::MarioPipe), 1);

    // Parked means parked.
    for _ in 0..10 {
        pin_bird(&mut s);
        s.tick(&mut rng);
    }
    assert_eq!(s.mario_pipe().map(|p| p.x), Some(313));
}

#[test]
fn mario_act_runs_to_completion() {
    let (mut s, mut rng) = into_bonus();
    let mut thrown = 0;
    while s.mode == GameMode::MarioBonus {
        pin_bird(&mut s);
        s.tick(&mut rng);
        thrown += s.fireballs.len();
        // Dodge everything; this test is about the schedule.
        s.fireballs.clear();
        assert!(s.frame < 2_000, "bonus never ended");
    }
    assert_eq!(s.mode, GameMode::Playing);
    assert_eq!(thrown, 6);
    assert_eq!(s.audio().count(SoundCue::MarioPipe), 1);
    assert_eq!(s.audio().count(SoundCue::MarioFireball), 6);
    // Hop onto the pipe, the mid-act jump and the final leap.
    assert_eq!(s.audio().count(SoundCue::MarioJump), 3);
    assert!(s.mario_on_stage().is_none());
    let pipe = s.mario_pipe().expect("mario pipe still on screen");
    assert!(!pipe.is_parked());
}

#[test]
fn fireball_hit_ends_round() {
    let (mut s, mut rng) = into_bonus();
    while s.mode == GameMode::MarioBonus {
        pin_bird(&mut s);
        s.tick(&mut rng);
        assert!(s.frame < 2_000, "fireball never arrived");
    }
    assert_eq!(s.mode, GameMode::Crashed);
    assert!(s.audio().count(SoundCue::MarioFireball) >= 1);
    assert_eq!(s.audio().count(SoundCue::Die), 1);
    assert!(s.mario_on_stage().is_none());
}

#[test]
fn touching_mario_ends_round() {
    let (mut s, mut rng) = into_bonus();
    while s.mario_on_stage().is_none() {
        pin_bird(&mut s);
        s.tick(&mut rng);
    }
    let (x, y) = (s.mario.x, s.mario.y);
    s.bird.x = x;
    s.bird.y = y;
    s.tick(&mut rng);
    assert_eq!(s.mode, GameMode::Crashed);
    assert_eq!(s.audio().count(SoundCue::MarioJump), 1);
    assert_eq!(s.audio().count(SoundCue::Die), 1);
}

#[test]
fn restart_mid_bonus_clears_mario() {
    let (mut s, mut rng) = into_bonus();
    while s.mario_on_stage().is_none() {
        pin_bird(&mut s);
        s.tick(&mut rng);
    }
    let old_pipe = s.mario_pipe().map(|p| p.id);
    crash_on_ground(&mut s, &mut rng);
    s.handle_restart(&mut rng);
    assert!(s.mario_pipe().is_none());
    assert!(s.mario_on_stage().is_none());
    assert_eq!(s.pipes.len(), 1);
    assert_ne!(Some(s.pipes[0].id), old_pipe);
    assert!(Pipe::shift_range(&playfield()).contains(&s.pipes[0].shift));
}
