use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Mongoose's database when the connection string names none.
const DEFAULT_DATABASE: &str = "test";

const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub gemini: GeminiSettings,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    /// Used only when `uri` carries no default database.
    pub database: String,
    /// Abort startup when the store cannot be reached.
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build from `common` plus service variables read through `lookup`.
    ///
    /// With `ENVIRONMENT=prod` only `MONGO_URI` and `GEMINI_API_KEY` must be
    /// set; every other variable keeps its default.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let mongo_uri_default = if is_prod { None } else { Some(DEFAULT_MONGO_URI) };

        Ok(RelayConfig {
            common,
            mongodb: MongoConfig {
                uri: get_var(&lookup, "MONGO_URI", mongo_uri_default)?,
                database: get_var(&lookup, "MONGO_DATABASE", Some(DEFAULT_DATABASE))?,
                fail_fast: parse_flag(&get_var(&lookup, "MONGO_FAIL_FAST", Some("false"))?)?,
            },
            gemini: GeminiSettings {
                api_key: get_var(&lookup, "GEMINI_API_KEY", None)?,
                model: get_var(&lookup, "GEMINI_MODEL", Some(DEFAULT_GEMINI_MODEL))?,
                api_base: get_var(&lookup, "GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE))?,
            },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "invalid boolean value '{}'",
            other
        ))),
    }
}

fn get_var<F>(lookup: &F, key: &str, default: Option<&str>) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match (lookup(key), default) {
        (Some(val), _) => Ok(val),
        (None, Some(def)) => Ok(def.to_string()),
        (None, None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" ON ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn dev_defaults_everything_but_the_api_key() {
        let config = RelayConfig::from_lookup(
            core_config::Config::default(),
            lookup_from(&[("GEMINI_API_KEY", "key")]),
        )
        .unwrap();

        assert_eq!(config.mongodb.uri, DEFAULT_MONGO_URI);
        assert_eq!(config.mongodb.database, DEFAULT_DATABASE);
        assert!(!config.mongodb.fail_fast);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn prod_needs_only_mongo_uri_and_api_key() {
        let config = RelayConfig::from_lookup(
            core_config::Config::default(),
            lookup_from(&[
                ("ENVIRONMENT", "prod"),
                ("MONGO_URI", "mongodb://db.internal:27017"),
                ("GEMINI_API_KEY", "key"),
            ]),
        )
        .unwrap();

        assert_eq!(config.mongodb.uri, "mongodb://db.internal:27017");
        assert_eq!(config.mongodb.database, DEFAULT_DATABASE);
        assert!(!config.mongodb.fail_fast);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
    }

    #[test]
    fn prod_rejects_missing_mongo_uri() {
        let err = RelayConfig::from_lookup(
            core_config::Config::default(),
            lookup_from(&[("ENVIRONMENT", "prod"), ("GEMINI_API_KEY", "key")]),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = RelayConfig::from_lookup(core_config::Config::default(), lookup_from(&[]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn empty_otlp_endpoint_is_ignored() {
        let config = RelayConfig::from_lookup(
            core_config::Config::default(),
            lookup_from(&[("GEMINI_API_KEY", "key"), ("OTLP_ENDPOINT", "")]),
        )
        .unwrap();

        assert!(config.otlp_endpoint.is_none());
    }
}
