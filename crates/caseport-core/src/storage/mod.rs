pub mod settings;

pub use settings::SettingsStorage;
