//! Greeting business logic.

use crate::config::GreetingConfig;
use crate::observability::context::RequestLogger;

/// Names shorter than this (in bytes) get the advisory greeting.
pub const MIN_NAME_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GreetingError {
    #[error("name is too long: {len} bytes exceeds the limit of {max}")]
    NameTooLong { len: usize, max: usize },
}

/// Greeting policy.
#[derive(Debug, Clone, Default)]
pub struct Greeter {
    max_name_length: Option<usize>,
}

impl Greeter {
    pub fn new(config: &GreetingConfig) -> Self {
        Self {
            max_name_length: config.max_name_length,
        }
    }

    /// Build the greeting for `name`.
    ///
    /// A short name is not an error: it is logged at WARN and answered with
    /// an advisory message.
    pub fn greet(&self, logger: &RequestLogger, name: &str) -> Result<String, GreetingError> {
        logger.scoped("greeting").in_scope(|| {
            tracing::debug!(name, "greeting started");

            if let Some(max) = self.max_name_length {
                if name.len() > max {
                    return Err(GreetingError::NameTooLong {
                        len: name.len(),
                        max,
                    });
                }
            }

            if name.len() < MIN_NAME_LEN {
                tracing::warn!("name is too short: {}", name);
                return Ok(format!("Hello {name}! Your name is to short\n"));
            }

            tracing::info!("greeting {}", name);
            Ok(format!("Hi {name}"))
        })
    }
}
