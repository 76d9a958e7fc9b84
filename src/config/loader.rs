use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::{Context, Result};

use super::{
    validator, ApiConfig, Config, DirectoryConfig, EndpointTemplates, FetchConfig, NewsConfig,
    OutputConfig, SeriesConfig,
};

impl Config {
    /// Read a JSON config file. Omitted sections and keys fall back to the builtin values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config JSON at {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json).context("failed to parse config JSON")?;
        let config = raw.into_config();
        validator::validate_config(&config)?;
        Ok(config)
    }
}

/// The file at `path` when given, otherwise the builtin configuration.
pub fn load_or_builtin(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::builtin()),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    api: RawApiConfig,
    #[serde(default)]
    fetch: RawFetchConfig,
    #[serde(default)]
    series: RawSeriesConfig,
    #[serde(default)]
    directory: RawDirectoryConfig,
    #[serde(default)]
    news: RawNewsConfig,
    #[serde(default)]
    output: RawOutputConfig,
}

impl RawConfig {
    fn into_config(self) -> Config {
        let defaults = Config::builtin();
        Config {
            api: self.api.into_api(defaults.api),
            fetch: self.fetch.into_fetch(defaults.fetch),
            series: self.series.into_series(defaults.series),
            directory: DirectoryConfig {
                snapshot: self
                    .directory
                    .snapshot
                    .map(PathBuf::from)
                    .unwrap_or(defaults.directory.snapshot),
            },
            news: NewsConfig {
                limit: self.news.limit.unwrap_or(defaults.news.limit),
            },
            output: OutputConfig {
                dir: self
                    .output
                    .dir
                    .map(PathBuf::from)
                    .unwrap_or(defaults.output.dir),
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawApiConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    #[serde(default)]
    endpoints: RawEndpoints,
}

impl RawApiConfig {
    fn into_api(self, defaults: ApiConfig) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_key: self.api_key.unwrap_or(defaults.api_key),
            endpoints: self.endpoints.into_templates(defaults.endpoints),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawEndpoints {
    quote: Option<String>,
    history: Option<String>,
    intraday: Option<String>,
    news: Option<String>,
    listing: Option<String>,
}

impl RawEndpoints {
    fn into_templates(self, defaults: EndpointTemplates) -> EndpointTemplates {
        EndpointTemplates {
            quote: self.quote.unwrap_or(defaults.quote),
            history: self.history.unwrap_or(defaults.history),
            intraday: self.intraday.unwrap_or(defaults.intraday),
            news: self.news.unwrap_or(defaults.news),
            listing: self.listing.unwrap_or(defaults.listing),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawFetchConfig {
    batch_limit: Option<usize>,
    max_replans: Option<usize>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    max_retries: Option<usize>,
}

impl RawFetchConfig {
    fn into_fetch(self, defaults: FetchConfig) -> FetchConfig {
        FetchConfig {
            batch_limit: self.batch_limit.unwrap_or(defaults.batch_limit),
            max_replans: self.max_replans.unwrap_or(defaults.max_replans),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawSeriesConfig {
    short_window_days: Option<i64>,
    long_window_days: Option<i64>,
}

impl RawSeriesConfig {
    fn into_series(self, defaults: SeriesConfig) -> SeriesConfig {
        SeriesConfig {
            short_window_days: self.short_window_days.unwrap_or(defaults.short_window_days),
            long_window_days: self.long_window_days.unwrap_or(defaults.long_window_days),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawDirectoryConfig {
    snapshot: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawNewsConfig {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawOutputConfig {
    dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_builtin_values() {
        let config = Config::from_json("{}").unwrap();
        let builtin = Config::builtin();

        assert_eq!(config.fetch.batch_limit, builtin.fetch.batch_limit);
        assert_eq!(config.api.endpoints, builtin.api.endpoints);
        assert_eq!(config.series.long_window_days, 200);
        assert_eq!(config.directory.snapshot, builtin.directory.snapshot);
    }

    #[test]
    fn overrides_individual_keys() {
        let config = Config::from_json(
            r#"{
                "api": {"base_url": "http://localhost:8080", "api_key": "demo"},
                "fetch": {"batch_limit": 500, "timeout_secs": 5},
                "series": {"short_window_days": 20},
                "output": {"dir": "out"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.api_key, "demo");
        assert_eq!(config.fetch.batch_limit, 500);
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.max_replans, Config::builtin().fetch.max_replans);
        assert_eq!(config.series.short_window_days, 20);
        assert_eq!(config.series.long_window_days, 200);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_json(r#"{"fetch": {"batch_size": 10}}"#).unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn runs_validation_after_conversion() {
        let err = Config::from_json(r#"{"fetch": {"batch_limit": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("batch_limit"));
    }

    #[test]
    fn example_config_matches_builtin() {
        let config = Config::from_json(include_str!("../../config.example.json")).unwrap();
        let builtin = Config::builtin();

        assert_eq!(config.api.api_key, builtin.api.api_key);
        assert_eq!(config.fetch.timeout, builtin.fetch.timeout);
        assert_eq!(config.fetch.max_retries, builtin.fetch.max_retries);
        assert_eq!(config.directory.snapshot, builtin.directory.snapshot);
    }

    #[test]
    fn failed_requests_are_not_retried_unless_configured() {
        assert_eq!(Config::builtin().fetch.max_retries, 0);
        assert_eq!(Config::from_json("{}").unwrap().fetch.max_retries, 0);

        let config = Config::from_json(r#"{"fetch": {"max_retries": 3}}"#).unwrap();
        assert_eq!(config.fetch.max_retries, 3);
    }

    #[test]
    fn missing_path_falls_back_to_builtin() {
        let config = load_or_builtin(None).unwrap();
        assert_eq!(config.news.limit, 20);
    }
}
