/// Bearer token file.
pub mod credentials;
/// `parlor.toml` loading and validation.
pub mod toml_config;
