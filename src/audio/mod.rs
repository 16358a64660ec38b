// Audio playback module
// Uses Symphonia for decoding and cpal for output

pub mod backend;
pub mod clip;
pub mod decoder;
pub mod gain;
pub mod output;
pub mod player;
pub mod resample;
pub mod scheduler;

pub use backend::{AudioBackend, ClipHandle, DeviceBackend, HeadlessBackend};
pub use clip::{ClipLine, LoopCount};
pub use player::{ClipPlayer, PlayerState};
pub use scheduler::{LoopOutcome, LoopTask};
