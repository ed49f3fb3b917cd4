//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values supplied on the command line or through the environment.
///
/// Applied on top of the file (or the defaults) before validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(bind_address) = self.bind_address {
            config.listener.bind_address = bind_address;
        }
        if let Some(log_file) = self.log_file {
            config.logging.file_path = log_file;
        }
    }
}

/// Build the effective configuration: file (if any), then overrides, then validation.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_file() {
        let file = write_config(
            r#"
            [shutdown]
            grace_period_secs = 3
            "#,
        );
        let config = resolve_config(Some(file.path()), ConfigOverrides::default()).unwrap();
        assert_eq!(config.shutdown.grace_period_secs, 3);
    }

    #[test]
    fn reports_missing_file() {
        let err = resolve_config(Some(Path::new("/definitely/not/here.toml")), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn reports_parse_errors() {
        let file = write_config("listener = 5");
        let err = resolve_config(Some(file.path()), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_win_over_file() {
        let file = write_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"
            "#,
        );
        let overrides = ConfigOverrides {
            bind_address: Some("127.0.0.1:9100".into()),
            log_file: Some(PathBuf::from("/tmp/greeter.log")),
        };

        let config = resolve_config(Some(file.path()), overrides).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9100");
        assert_eq!(config.logging.file_path, PathBuf::from("/tmp/greeter.log"));
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = ConfigOverrides {
            bind_address: Some("nowhere".into()),
            log_file: None,
        };
        let err = resolve_config(None, overrides).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: listener.bind_address `nowhere` is not a socket address"
        );
    }
}
