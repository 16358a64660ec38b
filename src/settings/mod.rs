// Persisted player configuration

#[allow(clippy::module_inception)]
pub mod settings;

pub use settings::PlayerSettings;
