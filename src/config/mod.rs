//! Configuration loading for matchvault.

pub mod settings;

pub use settings::Settings;
