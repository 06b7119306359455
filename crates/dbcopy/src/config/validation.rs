//! Configuration validation.

use super::Config;
use crate::error::{CopyError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_source(config)?;

    // Target validation
    if config.target.r#type != "sqlite" {
        return Err(CopyError::Config(format!(
            "target.type must be 'sqlite', got '{}'",
            config.target.r#type
        )));
    }
    if config.target.path.trim().is_empty() {
        return Err(CopyError::Config("target.path is required".into()));
    }

    if config.copy.progress_interval == 0 {
        return Err(CopyError::Config(
            "copy.progress_interval must be at least 1".into(),
        ));
    }

    Ok(())
}

/// Validate only the source section.
pub fn validate_source(config: &Config) -> Result<()> {
    if config.source.r#type != "mysql" {
        return Err(CopyError::Config(format!(
            "source.type must be 'mysql', got '{}'",
            config.source.r#type
        )));
    }
    if config.source.url.trim().is_empty() {
        return Err(CopyError::Config("source.url is required".into()));
    }
    if !(config.source.url.starts_with("mysql://") || config.source.url.starts_with("mariadb://"))
    {
        return Err(CopyError::Config(
            "source.url must start with mysql:// or mariadb://".into(),
        ));
    }

    Ok(())
}
