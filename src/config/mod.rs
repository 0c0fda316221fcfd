mod settings;

pub use settings::{DEFAULT_SETTINGS_FILE, Settings, SettingsError};
