//! Collaborators the session talks to but does not own the mechanics of.

use crate::entities::SoundCue;

/// Persistent best score. Implementations recover from bad data on their own;
/// the session never sees a failure.
pub trait HighScoreStore {
    /// Stored best score, or 0 when nothing usable is stored.
    fn read_high_score(&mut self) -> u32;
    /// Overwrites the stored best score.
    fn write_high_score(&mut self, score: u32);
}

/// Fire-and-forget sound playback.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

impl<T: HighScoreStore + ?Sized> HighScoreStore for Box<T> {
    fn read_high_score(&mut self) -> u32 {
        (**self).read_high_score()
    }

    fn write_high_score(&mut self, score: u32) {
        (**self).write_high_score(score);
    }
}

impl<T: AudioSink + ?Sized> AudioSink for Box<T> {
    fn play(&mut self, cue: SoundCue) {
        (**self).play(cue);
    }
}

/// In-process store. Counts writes so callers can tell whether one happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub score: u32,
    pub writes: usize,
}

impl MemoryStore {
    pub fn with_score(score: u32) -> Self {
        Self { score, writes: 0 }
    }
}

impl HighScoreStore for MemoryStore {
    fn read_high_score(&mut self) -> u32 {
        self.score
    }

    fn write_high_score(&mut self, score: u32) {
        self.score = score;
        self.writes += 1;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Keeps every cue in order. Useful for headless runs and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingAudio {
    pub played: Vec<SoundCue>,
}

impl RecordingAudio {
    pub fn count(&self, cue: SoundCue) -> usize {
        self.played.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}
