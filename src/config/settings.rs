use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::application::data::Threshold;
use spaceguard::ext::BestEffortPathExt;

pub const DEFAULT_SETTINGS_FILE: &str = "spaceguard.yaml";

/// User preferences read from the settings file.
///
/// ```yaml
/// threshold_mib: 5
/// relative_paths: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub threshold: Option<Threshold>,
    pub relative_paths: bool,
}

impl Settings {
    /// Reads settings from `path`. A missing file yields the defaults.
    pub async fn read(path: &Path) -> Result<Self, SettingsError> {
        debug!("Reading settings from {}", path.best_effort_path_display());
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("No settings file found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::ReadError {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            path: path.to_path_buf(),
        })?;
        contents.as_str().try_into()
    }

    fn from_mapping(mapping: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        let mut threshold_mib = None;
        let mut threshold_bytes = None;

        for (key, value) in mapping {
            let Yaml::Value(Scalar::String(key)) = key else {
                warn!("Ignoring non-string settings key: {:?}", key);
                continue;
            };

            match key.as_ref() {
                "threshold_mib" => threshold_mib = Some(non_negative_integer(key, value)?),
                "threshold_bytes" => threshold_bytes = Some(non_negative_integer(key, value)?),
                "relative_paths" => match value {
                    Yaml::Value(Scalar::Boolean(flag)) => settings.relative_paths = *flag,
                    _ => {
                        return InvalidValueSnafu {
                            key: key.to_string(),
                            expected: "a boolean",
                        }
                        .fail();
                    }
                },
                other => warn!("Ignoring unknown setting '{}'", other),
            }
        }

        settings.threshold = threshold_bytes
            .map(Threshold::from_bytes)
            .or(threshold_mib.map(Threshold::from_mib));
        Ok(settings)
    }
}

fn non_negative_integer(key: &Cow<str>, value: &Yaml) -> Result<u64, SettingsError> {
    match value {
        Yaml::Value(Scalar::Integer(number)) if *number >= 0 => Ok(number.unsigned_abs()),
        _ => InvalidValueSnafu {
            key: key.to_string(),
            expected: "a non-negative integer",
        }
        .fail(),
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents =
            Yaml::load_from_str(contents).map_err(|e| SettingsError::ParseError { source: e })?;

        match documents.first() {
            None | Some(Yaml::Value(Scalar::Null)) => Ok(Self::default()),
            Some(Yaml::Mapping(mapping)) => Self::from_mapping(mapping),
            Some(_) => Err(SettingsError::TopLevelNotMap),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Settings file {} is not valid UTF-8", path.display()))]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of the settings file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Setting '{}' should be {}", key, expected))]
    InvalidValue { key: String, expected: &'static str },
}
