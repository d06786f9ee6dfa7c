use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use batch_core::RunnerSettings;
use batch_engine::FetchSettings;
use batch_logging::{batch_info, batch_warn};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const SETTINGS_FILENAME: &str = ".batch_settings.ron";
pub const DEFAULT_REJECTS_FILENAME: &str = "rejects.txt";

/// Contents of the RON settings file. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub show_est_time: bool,
    pub disable_cancel: bool,
    pub status_prefix: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub rejects_path: PathBuf,
    /// Preset reasons offered when rejecting a URL.
    pub reject_reasons: Vec<String>,
    pub log_destination: LogDestination,
}

impl Default for AppSettings {
    fn default() -> Self {
        let runner = RunnerSettings::default();
        let fetch = FetchSettings::default();
        Self {
            show_est_time: runner.show_est_time,
            disable_cancel: runner.disable_cancel,
            status_prefix: runner.status_prefix,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            allowed_content_types: fetch.allowed_content_types,
            rejects_path: PathBuf::from(DEFAULT_REJECTS_FILENAME),
            reject_reasons: Vec::new(),
            log_destination: LogDestination::default(),
        }
    }
}

impl AppSettings {
    pub fn runner(&self) -> RunnerSettings {
        RunnerSettings {
            show_est_time: self.show_est_time,
            disable_cancel: self.disable_cancel,
            status_prefix: self.status_prefix.clone(),
        }
    }

    pub fn fetch(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }
}

/// Result of reading the settings file.
///
/// Reading happens before the logger exists (the file picks the log
/// destination), so the outcome is kept here and logged by [`Self::log`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub settings: AppSettings,
    pub path: PathBuf,
    pub from_file: bool,
    /// Why the file was ignored, when it was present but unusable.
    pub warning: Option<String>,
}

impl LoadedSettings {
    pub fn log(&self) {
        if let Some(warning) = &self.warning {
            batch_warn!("{}", warning);
        } else if self.from_file {
            batch_info!("Loaded settings from {:?}", self.path);
        }
    }
}

/// Reads settings from `path`. Unreadable or malformed files fall back to
/// the defaults with a warning; a missing file is not worth one.
pub fn load_settings(path: &Path) -> LoadedSettings {
    let fallback = |warning: Option<String>| LoadedSettings {
        settings: AppSettings::default(),
        path: path.to_path_buf(),
        from_file: false,
        warning,
    };

    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return fallback(None),
        Err(err) => {
            return fallback(Some(format!(
                "Failed to read settings from {:?}: {}",
                path, err
            )))
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => LoadedSettings {
            settings,
            path: path.to_path_buf(),
            from_file: true,
            warning: None,
        },
        Err(err) => fallback(Some(format!(
            "Failed to parse settings from {:?}: {}",
            path, err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(&dir.path().join(SETTINGS_FILENAME));
        assert!(!loaded.from_file);
        assert_eq!(loaded.warning, None);
        let settings = loaded.settings;
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.runner(), RunnerSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(
            &path,
            r#"(
                disable_cancel: true,
                request_timeout_secs: 5,
                reject_reasons: ["Not interested", "Bad writing"],
                log_destination: Both,
            )"#,
        )
        .unwrap();

        let loaded = load_settings(&path);
        assert!(loaded.from_file);
        assert_eq!(loaded.warning, None);
        let settings = loaded.settings;
        assert!(settings.disable_cancel);
        assert!(settings.show_est_time);
        assert_eq!(settings.reject_reasons, vec!["Not interested", "Bad writing"]);
        assert_eq!(settings.log_destination, LogDestination::Both);
        assert_eq!(settings.fetch().request_timeout, Duration::from_secs(5));
        assert_eq!(settings.fetch().redirect_limit, FetchSettings::default().redirect_limit);
    }

    #[test]
    fn malformed_file_gives_defaults_and_a_warning() {
        batch_logging::initialize_for_tests();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, "(show_est_time: maybe").unwrap();

        let loaded = load_settings(&path);
        assert_eq!(loaded.settings, AppSettings::default());
        assert!(!loaded.from_file);
        let warning = loaded.warning.clone().expect("malformed file is reported");
        assert!(warning.starts_with("Failed to parse settings from"), "{warning}");
        loaded.log();
    }

    #[test]
    fn unreadable_path_gives_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(dir.path());
        assert_eq!(loaded.settings, AppSettings::default());
        let warning = loaded.warning.expect("directory cannot be read as a file");
        assert!(warning.starts_with("Failed to read settings from"), "{warning}");
    }

    #[test]
    fn settings_survive_a_ron_round_trip() {
        let settings = AppSettings {
            status_prefix: "Checked".to_string(),
            reject_reasons: vec!["Dupe".to_string()],
            ..AppSettings::default()
        };
        let text = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::new()).unwrap();
        assert_eq!(ron::from_str::<AppSettings>(&text).unwrap(), settings);
    }
}
