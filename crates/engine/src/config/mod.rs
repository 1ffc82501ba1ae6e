//! Binder settings: endpoint paths, placeholders and ownership policy.
//!
//! Settings are read from `<config dir>/fieldsync/settings.json` unless
//! `FIELDSYNC_CONFIG_PATH` names another file.

mod io;
mod model;

pub use io::{BASE_URL_ENV, CONFIG_PATH_ENV, default_settings_path, load_settings, load_settings_from_path};
pub use model::{BinderSettings, ConfigError, EndpointSettings, SlugSettings, validate_settings};
