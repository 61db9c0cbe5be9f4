use crate::config::types::{
    Config, MetadataConfig, OutputConfig, RetryConfig, SiteConfig, UserAgentConfig,
    KNOWN_METADATA_FIELDS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_retry_config(&config.retry)?;
    validate_metadata_config(&config.metadata)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site configuration: seed, aliases, and path patterns
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.seed_url.is_empty() {
        return Err(ConfigError::Validation(
            "seed-url cannot be empty".to_string(),
        ));
    }

    let seed = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url: {}", e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url must be http or https, got scheme '{}'",
            seed.scheme()
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(
            "seed-url has no host".to_string(),
        ));
    }

    for alias in &config.alias_urls {
        let url = Url::parse(alias)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid alias-url '{}': {}", alias, e)))?;
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "alias-url '{}' has no host",
                alias
            )));
        }
    }

    for pattern in config.include_paths.iter().chain(&config.exclude_paths) {
        validate_path_pattern(pattern)?;
    }

    Ok(())
}

/// Validates a glob-style path pattern
fn validate_path_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "path pattern cannot be empty".to_string(),
        ));
    }

    if !pattern.starts_with('/') {
        return Err(ConfigError::InvalidPattern(format!(
            "path pattern must start with '/', got '{}'",
            pattern
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    Ok(())
}

/// Validates the metadata field selection
fn validate_metadata_config(config: &MetadataConfig) -> Result<(), ConfigError> {
    for field in &config.fields {
        if !KNOWN_METADATA_FIELDS.contains(&field.as_str()) {
            return Err(ConfigError::UnknownMetadataField(field.clone()));
        }
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_path.is_empty() {
        return Err(ConfigError::Validation(
            "state-path cannot be empty".to_string(),
        ));
    }

    if config.metadata_path.is_empty() {
        return Err(ConfigError::Validation(
            "metadata-path cannot be empty".to_string(),
        ));
    }

    if config.state_path == config.metadata_path {
        return Err(ConfigError::Validation(
            "state-path and metadata-path must be different files".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation: one '@' with non-empty local part and dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "contact-email does not look like an email address: '{}'",
            email
        )));
    }
    Ok(())
}
