//! Application configuration read from environment variables.

use std::env::{self, VarError};

use crate::date::EpochZone;
use crate::normalize::{CategoryMap, Normalizer};

/// Fallback log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// HTTP timeout for council API requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// User agent sent to council APIs.
pub const DEFAULT_USER_AGENT: &str = "binday/0.1";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while reading configuration.
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

#[derive(Debug, Clone)]
/// Settings shared by the CLI and the providers.
pub struct AppConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Timeout for a single council API request.
    pub request_timeout_secs: u64,
    /// User agent for council API requests.
    pub user_agent: String,
    /// Endpoint template overriding the provider default; contains `{uprn}`.
    pub api_url: Option<String>,
    /// Zone used to read epoch timestamps.
    pub epoch_zone: EpochZone,
    /// Category table replacing the provider default.
    pub categories: Option<CategoryMap>,
    /// `(service, icon)` pairs applied on top of the category table.
    pub icons: Vec<(String, String)>,
    /// Attribute projection replacing the provider default.
    pub attributes: Option<Vec<String>>,
}

impl AppConfig {
    /// Apply the configured overrides to a provider's default normalizer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if an icon names an unmapped
    /// service or an attribute shadows a record field.
    pub fn apply_to(&self, defaults: &Normalizer) -> Result<Normalizer, ConfigError> {
        let mut categories = self
            .categories
            .clone()
            .unwrap_or_else(|| defaults.categories().clone());

        for (service, icon) in &self.icons {
            if !categories.set_icon(service, icon.as_str()) {
                return Err(invalid("BINDAY_ICONS", format!("unmapped service {service}")));
            }
        }

        let attributes = self
            .attributes
            .clone()
            .unwrap_or_else(|| defaults.attributes().to_vec());

        Normalizer::new(categories, attributes)
            .map(|normalizer| normalizer.with_epoch_zone(self.epoch_zone))
            .map_err(|err| invalid("BINDAY_ATTRIBUTES", err.to_string()))
    }
}

/// Load configuration, reading a `.env` file first if one exists.
///
/// # Errors
///
/// Returns [`ConfigError`] if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load configuration from the process environment only.
///
/// # Errors
///
/// Returns [`ConfigError`] if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    };

    let log_level = optional("BINDAY_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
    let user_agent = optional("BINDAY_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    let request_timeout_secs = match optional("BINDAY_REQUEST_TIMEOUT_SECS") {
        Some(raw) => parse_timeout(&raw)?,
        None => DEFAULT_REQUEST_TIMEOUT_SECS,
    };

    let api_url = optional("BINDAY_API_URL");
    if let Some(url) = &api_url
        && !url.contains("{uprn}")
    {
        return Err(invalid("BINDAY_API_URL", "missing {uprn} placeholder"));
    }

    let epoch_zone = match optional("BINDAY_EPOCH_TIMEZONE") {
        Some(raw) => parse_epoch_zone(&raw)?,
        None => EpochZone::Utc,
    };

    let categories = optional("BINDAY_CATEGORIES")
        .map(|raw| {
            let pairs = parse_pairs("BINDAY_CATEGORIES", &raw)?;
            CategoryMap::from_pairs(pairs)
                .map_err(|err| invalid("BINDAY_CATEGORIES", err.to_string()))
        })
        .transpose()?;

    let icons = optional("BINDAY_ICONS")
        .map(|raw| parse_pairs("BINDAY_ICONS", &raw))
        .transpose()?
        .unwrap_or_default();

    let attributes = optional("BINDAY_ATTRIBUTES").map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    });

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        user_agent,
        api_url,
        epoch_zone,
        categories,
        icons,
        attributes,
    })
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid("BINDAY_REQUEST_TIMEOUT_SECS", "must be at least 1")),
        Ok(secs) => Ok(secs),
        Err(err) => Err(invalid("BINDAY_REQUEST_TIMEOUT_SECS", err.to_string())),
    }
}

fn parse_epoch_zone(raw: &str) -> Result<EpochZone, ConfigError> {
    match raw.to_lowercase().as_str() {
        "utc" => Ok(EpochZone::Utc),
        "local" => Ok(EpochZone::Local),
        other => Err(invalid(
            "BINDAY_EPOCH_TIMEZONE",
            format!("expected utc or local, got {other}"),
        )),
    }
}

/// Parse `KEY=value,KEY=value` lists.
fn parse_pairs(var: &str, raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| invalid(var, format!("expected KEY=value, got {entry}")))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(invalid(var, format!("empty key or value in {entry}")));
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::Category;

    fn lookup_from_map<'map>(
        map: &'map HashMap<&'map str, &'map str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'map {
        move |key| {
            map.get(key)
                .map(|value| (*value).to_owned())
                .ok_or(VarError::NotPresent)
        }
    }

    fn york_defaults() -> Normalizer {
        let categories = CategoryMap::from_pairs([("REFUSE", "blackbin"), ("RECYCLING", "box")])
            .expect("valid category map");
        Normalizer::new(categories, vec!["frequency".to_owned()]).expect("valid normalizer")
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).expect("defaults are valid");

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.api_url, None);
        assert_eq!(config.epoch_zone, EpochZone::Utc);
        assert!(config.categories.is_none());
        assert!(config.icons.is_empty());
        assert!(config.attributes.is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let map = HashMap::from([("BINDAY_LOG_LEVEL", "  "), ("BINDAY_CATEGORIES", "")]);
        let config = build_app_config(lookup_from_map(&map)).expect("blank values are ignored");

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.categories.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let map = HashMap::from([("BINDAY_REQUEST_TIMEOUT_SECS", "0")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BINDAY_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let map = HashMap::from([("BINDAY_REQUEST_TIMEOUT_SECS", "soon")]);
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn api_url_requires_placeholder() {
        let map = HashMap::from([("BINDAY_API_URL", "http://localhost:8080/collections")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BINDAY_API_URL"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn epoch_zone_is_case_insensitive() {
        let map = HashMap::from([("BINDAY_EPOCH_TIMEZONE", "Local")]);
        let config = build_app_config(lookup_from_map(&map)).expect("valid zone");
        assert_eq!(config.epoch_zone, EpochZone::Local);

        let map = HashMap::from([("BINDAY_EPOCH_TIMEZONE", "Europe/London")]);
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn category_override_is_parsed() {
        let map = HashMap::from([
            ("BINDAY_CATEGORIES", "REFUSE=grey, FOOD = caddy"),
            ("BINDAY_ICONS", "FOOD=mdi:food-apple"),
            ("BINDAY_ATTRIBUTES", "frequency, ,wasteType"),
        ]);
        let config = build_app_config(lookup_from_map(&map)).expect("valid overrides");

        let categories = config.categories.as_ref().expect("categories parsed");
        assert_eq!(categories.len(), 2);
        assert_eq!(
            categories.resolve("FOOD").map(|mapping| mapping.category.clone()),
            Ok(Category::from("caddy"))
        );
        assert_eq!(config.icons, vec![("FOOD".to_owned(), "mdi:food-apple".to_owned())]);
        assert_eq!(
            config.attributes,
            Some(vec!["frequency".to_owned(), "wasteType".to_owned()])
        );
    }

    #[test]
    fn malformed_category_pairs_are_rejected() {
        for raw in ["REFUSE", "REFUSE=", "=blackbin", "REFUSE=updated"] {
            let map = HashMap::from([("BINDAY_CATEGORIES", raw)]);
            assert!(
                build_app_config(lookup_from_map(&map)).is_err(),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn apply_to_keeps_defaults_without_overrides() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).expect("defaults are valid");

        let normalizer = config.apply_to(&york_defaults()).expect("defaults apply");

        assert_eq!(normalizer.categories(), york_defaults().categories());
        assert_eq!(normalizer.attributes(), ["frequency".to_owned()]);
    }

    #[test]
    fn apply_to_layers_icons_on_default_categories() {
        let map = HashMap::from([("BINDAY_ICONS", "RECYCLING=mdi:recycle")]);
        let config = build_app_config(lookup_from_map(&map)).expect("valid icons");

        let normalizer = config.apply_to(&york_defaults()).expect("icons apply");

        let mapping = normalizer
            .categories()
            .resolve("RECYCLING")
            .expect("recycling mapped");
        assert_eq!(mapping.icon.as_deref(), Some("mdi:recycle"));
    }

    #[test]
    fn apply_to_rejects_icon_for_unmapped_service() {
        let map = HashMap::from([("BINDAY_ICONS", "GLASS=mdi:bottle-wine")]);
        let config = build_app_config(lookup_from_map(&map)).expect("icons parse");

        let result = config.apply_to(&york_defaults());
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "BINDAY_ICONS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn apply_to_rejects_reserved_attribute() {
        let map = HashMap::from([("BINDAY_ATTRIBUTES", "frequency,last")]);
        let config = build_app_config(lookup_from_map(&map)).expect("attributes parse");

        assert!(config.apply_to(&york_defaults()).is_err());
    }
}
