//! Loading binder settings from disk and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dirs_next::config_dir;
use fieldsync_util::expand_tilde;
use url::Url;

use super::{BinderSettings, ConfigError, validate_settings};

/// Names the settings file, overriding the per-user default.
pub const CONFIG_PATH_ENV: &str = "FIELDSYNC_CONFIG_PATH";

/// Overrides `baseUrl` from the settings file.
pub const BASE_URL_ENV: &str = "FIELDSYNC_BASE_URL";

/// Returns the path the settings are loaded from by default.
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldsync")
        .join("settings.json")
}

/// Loads settings from [`default_settings_path`].
pub fn load_settings() -> anyhow::Result<BinderSettings> {
    load_settings_from_path(&default_settings_path())
}

/// Loads settings from `path`, falling back to defaults when the file is absent.
///
/// `.yaml` and `.yml` files are parsed as YAML, anything else as JSON. The
/// environment override is applied before validation.
pub fn load_settings_from_path(path: &Path) -> anyhow::Result<BinderSettings> {
    let mut settings = if path.exists() {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read settings from {}", path.display()))?;
        parse_settings(path, &content).with_context(|| format!("failed to parse settings in {}", path.display()))?
    } else {
        BinderSettings::default()
    };

    apply_environment_overrides(&mut settings)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn parse_settings(path: &Path, content: &str) -> anyhow::Result<BinderSettings> {
    let is_yaml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn apply_environment_overrides(settings: &mut BinderSettings) -> Result<(), ConfigError> {
    if let Ok(raw) = env::var(BASE_URL_ENV)
        && !raw.trim().is_empty()
    {
        let base_url = Url::parse(raw.trim()).map_err(|error| ConfigError::InvalidBaseUrl {
            url: raw.clone(),
            reason: error.to_string(),
        })?;
        settings.base_url = Some(base_url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fieldsync_types::OwnershipPolicy;

    use super::*;

    #[test]
    fn default_path_honors_environment_override() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/srv/fieldsync/page.yaml"), || {
            assert_eq!(default_settings_path(), PathBuf::from("/srv/fieldsync/page.yaml"));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().unwrap();
        temp_env::with_var_unset(BASE_URL_ENV, || {
            let settings = load_settings_from_path(&directory.path().join("absent.json")).unwrap();
            assert_eq!(settings, BinderSettings::default());
        });
    }

    #[test]
    fn yaml_files_are_supported() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("settings.yml");
        fs::write(&path, "ownership: valueEquality\nslug:\n  separator: \"_\"\nrequestTimeoutSecs: 5\n").unwrap();

        temp_env::with_var_unset(BASE_URL_ENV, || {
            let settings = load_settings_from_path(&path).unwrap();
            assert_eq!(settings.ownership, OwnershipPolicy::ValueEquality);
            assert_eq!(settings.slug.separator, '_');
            assert_eq!(settings.request_timeout_secs, 5);
        });
    }

    #[test]
    fn base_url_override_replaces_the_file_value() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("settings.json");
        fs::write(&path, r#"{ "baseUrl": "http://localhost:9000/" }"#).unwrap();

        temp_env::with_var(BASE_URL_ENV, Some("https://gospeak.example/"), || {
            let settings = load_settings_from_path(&path).unwrap();
            assert_eq!(settings.base_url.map(|url| url.to_string()), Some("https://gospeak.example/".to_string()));
        });

        temp_env::with_var(BASE_URL_ENV, Some("not a url"), || {
            assert!(load_settings_from_path(&path).is_err());
        });
    }

    #[test]
    fn invalid_settings_fail_to_load() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("settings.json");
        fs::write(&path, r#"{ "slug": { "separator": "x" } }"#).unwrap();

        temp_env::with_var_unset(BASE_URL_ENV, || {
            let error = load_settings_from_path(&path).unwrap_err();
            assert!(error.to_string().contains("slug separator"), "{error}");
        });
    }
}
