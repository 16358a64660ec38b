// Musica - audio clip player
// Module declarations
pub mod audio;
pub mod commands;
pub mod error;
pub mod settings;

pub use audio::{
    AudioBackend, ClipLine, ClipPlayer, DeviceBackend, HeadlessBackend, LoopCount, LoopOutcome,
    LoopTask, PlayerState,
};
pub use error::ClipError;
pub use settings::PlayerSettings;
