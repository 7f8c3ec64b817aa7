//! Audio feedback as a fire-and-forget capability.

use serde::{Deserialize, Serialize};

/// Feedback events the quiz emits for the host to sonify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Success,
    Wrong,
    Bonus,
}

/// Plays a cue. Implementations must not block and cannot affect game state.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, cue: SoundCue);
}

/// Player that drops every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self, _cue: SoundCue) {}
}
