/// Version of the crate.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_SETTINGS_KEY: &str = "ServerFeatures";
pub const SETTINGS_FILE_EXTENSION: &str = "json";
