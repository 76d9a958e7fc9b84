use crate::error::{AppError, Result};
use crate::fetch::request::placeholders;

use super::{Config, EndpointTemplates};

/// Validate a configuration and surface every problem in one message.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_api(config, &mut issues);
    validate_fetch(config, &mut issues);
    validate_series(config, &mut issues);
    validate_paths(config, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "config invalid:\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_api(config: &Config, issues: &mut Vec<String>) {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        issues.push("api.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        issues.push(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.api.api_key.trim().is_empty() {
        issues.push("api.api_key must not be empty".to_string());
    }

    validate_endpoints(&config.api.endpoints, issues);
}

fn validate_endpoints(endpoints: &EndpointTemplates, issues: &mut Vec<String>) {
    let required: [(&str, &str, &[&str]); 5] = [
        ("quote", endpoints.quote.as_str(), &["symbols"]),
        ("history", endpoints.history.as_str(), &["symbols", "from"]),
        ("intraday", endpoints.intraday.as_str(), &["frequency", "symbol"]),
        ("news", endpoints.news.as_str(), &["symbols", "limit"]),
        ("listing", endpoints.listing.as_str(), &[]),
    ];

    for (name, template, expected) in required {
        if template.trim().is_empty() {
            issues.push(format!("api.endpoints.{name} must not be empty"));
            continue;
        }

        let found = placeholders(template);
        for placeholder in expected {
            if !found.contains(placeholder) {
                issues.push(format!(
                    "api.endpoints.{name} should reference `{{{placeholder}}}`"
                ));
            }
        }

        for placeholder in &found {
            if !is_known_placeholder(placeholder) {
                issues.push(format!(
                    "api.endpoints.{name} uses unknown placeholder `{{{placeholder}}}`"
                ));
            }
        }
    }
}

fn is_known_placeholder(name: &str) -> bool {
    matches!(
        name,
        "base_url" | "api_key" | "symbols" | "symbol" | "from" | "frequency" | "limit"
    )
}

fn validate_fetch(config: &Config, issues: &mut Vec<String>) {
    let fetch = &config.fetch;
    if fetch.batch_limit == 0 {
        issues.push("fetch.batch_limit must be at least 1".to_string());
    }
    if fetch.concurrency == 0 {
        issues.push("fetch.concurrency must be at least 1".to_string());
    }
    if fetch.timeout.is_zero() {
        issues.push("fetch.timeout_secs must be greater than zero".to_string());
    }
}

fn validate_series(config: &Config, issues: &mut Vec<String>) {
    let series = &config.series;
    if series.short_window_days <= 0 {
        issues.push("series.short_window_days must be positive".to_string());
    }
    if series.long_window_days <= 0 {
        issues.push("series.long_window_days must be positive".to_string());
    }
    if series.short_window_days > series.long_window_days {
        issues.push(format!(
            "series.short_window_days ({}) exceeds series.long_window_days ({})",
            series.short_window_days, series.long_window_days
        ));
    }

    if config.news.limit == 0 {
        issues.push("news.limit must be at least 1".to_string());
    }
}

fn validate_paths(config: &Config, issues: &mut Vec<String>) {
    if config.directory.snapshot.as_os_str().is_empty() {
        issues.push("directory.snapshot must not be empty".to_string());
    }
    if config.output.dir.as_os_str().is_empty() {
        issues.push("output.dir must not be empty".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_is_valid() {
        validate_config(&Config::builtin()).expect("builtin config should be valid");
    }

    #[test]
    fn aggregates_every_issue() {
        let mut config = Config::builtin();
        config.fetch.batch_limit = 0;
        config.fetch.concurrency = 0;
        config.series.short_window_days = 300;

        let err = validate_config(&config).expect_err("validation should fail");
        let message = err.to_string();
        assert!(message.contains("batch_limit"), "unexpected error message: {message}");
        assert!(message.contains("concurrency"), "unexpected error message: {message}");
        assert!(message.contains("exceeds"), "unexpected error message: {message}");
    }

    #[test]
    fn rejects_quote_template_without_symbols() {
        let mut config = Config::builtin();
        config.api.endpoints.quote = "{base_url}/api/v3/quote?apikey={api_key}".to_string();

        let err = validate_config(&config).expect_err("validation should fail");
        assert!(
            err.to_string().contains("`{symbols}`"),
            "unexpected error message: {err}"
        );
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let mut config = Config::builtin();
        config.api.endpoints.listing = "{base_url}/list?apikey={token}".to_string();

        let err = validate_config(&config).expect_err("validation should fail");
        assert!(err.to_string().contains("unknown placeholder `{token}`"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = Config::builtin();
        config.api.base_url = "ftp://example.test".to_string();

        assert!(validate_config(&config).is_err());
    }
}
