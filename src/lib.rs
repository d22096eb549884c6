//! Flappy Bird with a Mario interlude: a tick-driven simulation core.
//!
//! Rendering, input devices, sound playback and file layout are left to the
//! host. The host feeds intents into a [`compute::GameSession`], ticks it at
//! 60 Hz and draws from its public state.

pub mod codes;
pub mod compute;
pub mod entities;
pub mod ports;
pub mod store;
