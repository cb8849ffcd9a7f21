pub mod document;
pub mod path_processing;
pub mod settings;

pub use document::{DocumentError, DocumentFormat, load_mapping, parse_mapping, save_mapping};
pub use path_processing::expand_tilde;
pub use settings::{SETTINGS_PATH_ENV, SettingsError, TableSettings, default_settings_path, load_settings, save_settings};
