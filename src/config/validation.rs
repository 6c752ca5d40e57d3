use crate::config::types::{AssetsConfig, BrowserConfig, Config, SiteConfig, VariantConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_variants(&config.variants)?;
    validate_assets_config(&config.assets)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("origin", &config.origin)?;
    validate_http_url("home_url", &config.home_url)?;
    validate_http_url("updates_url", &config.updates_url)?;

    // Navigation never leaves the origin
    for (field, value) in [
        ("home_url", &config.home_url),
        ("updates_url", &config.updates_url),
    ] {
        if !value.starts_with(&config.origin) {
            return Err(ConfigError::Validation(format!(
                "{} '{}' must start with origin '{}'",
                field, value, config.origin
            )));
        }
    }

    if config.menu_keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "menu_keyword cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser timing configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.wait_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "wait_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates variant entries
fn validate_variants(variants: &[VariantConfig]) -> Result<(), ConfigError> {
    if variants.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[variant]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for variant in variants {
        if variant.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "variant name cannot be empty".to_string(),
            ));
        }

        if !names.insert(variant.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate variant name '{}'",
                variant.name
            )));
        }

        if variant.output_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "variant '{}' output_path cannot be empty",
                variant.name
            )));
        }

        if variant.progress_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "variant '{}' progress_path cannot be empty",
                variant.name
            )));
        }

        if variant.output_path == variant.progress_path {
            return Err(ConfigError::Validation(format!(
                "variant '{}' output_path and progress_path must differ",
                variant.name
            )));
        }
    }

    Ok(())
}

/// Validates the asset utilities section
fn validate_assets_config(config: &AssetsConfig) -> Result<(), ConfigError> {
    if !(36..=1200).contains(&config.dpi) {
        return Err(ConfigError::Validation(format!(
            "dpi must be between 36 and 1200, got {}",
            config.dpi
        )));
    }

    Ok(())
}

/// Checks that a value parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
