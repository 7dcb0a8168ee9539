//! Provider implementation for the City of York using the council waste API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use binday_core::{
    model::{CouncilId, CouncilMeta, Councils, PropertyRef, RawServiceRecord},
    normalize::{CategoryMap, Normalizer},
    plugin::CouncilPlugin,
    ports::{PortError, SchedulePort},
};

/// Endpoint template; `{uprn}` is replaced with the property reference.
pub const DEFAULT_API_URL: &str =
    "https://waste-api.york.gov.uk/api/Collections/GetBinCollectionDataForUprn/{uprn}";

/// Upstream attributes copied into each normalized record.
pub const DEFAULT_ATTRIBUTES: [&str; 5] = [
    "binDescription",
    "binType",
    "collectionDay",
    "frequency",
    "wasteType",
];

// (service identifier, category, icon)
const DEFAULT_SERVICES: [(&str, &str, &str); 3] = [
    ("REFUSE", "blackbin", "mdi:trash-can"),
    ("RECYCLING", "box", "mdi:recycle"),
    ("GARDEN", "greenbin", "mdi:leaf"),
];

const MAX_UPRN_DIGITS: usize = 12;

/// Response body of the collection data endpoint.
#[derive(Debug, Deserialize)]
struct ServicesResponse {
    services: Vec<RawServiceRecord>,
    // the API also returns the property address, which we don't need
}

/// Collection schedule implementation for York.
pub struct YorkSchedulePort {
    client: Client,
    meta: CouncilMeta,
    api_url: String,
}

impl YorkSchedulePort {
    /// Create a new schedule port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_api_url(client, DEFAULT_API_URL)
    }

    /// Create a schedule port against a custom endpoint template.
    #[must_use]
    pub fn with_api_url<U: Into<String>>(client: Client, api_url: U) -> Self {
        Self {
            client,
            meta: council_meta(),
            api_url: api_url.into(),
        }
    }

    fn services_url(&self, property: &PropertyRef) -> Result<String, PortError> {
        let uprn = property.0.trim();
        let is_valid = !uprn.is_empty()
            && uprn.len() <= MAX_UPRN_DIGITS
            && uprn.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(PortError::InvalidPropertyRef(property.0.clone()));
        }
        Ok(self.api_url.replace("{uprn}", uprn))
    }
}

#[async_trait]
impl SchedulePort for YorkSchedulePort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn services(&self, property: &PropertyRef) -> Result<Vec<RawServiceRecord>, PortError> {
        let url = self.services_url(property)?;
        debug!(%url, "requesting York collection data");

        let req = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json");

        let response: ServicesResponse =
            fetch_json(req, &url, &format!("York services for UPRN {property}")).await?;

        Ok(response.services)
    }
}

/// Build the plugin bundle for the York provider.
#[must_use]
pub fn plugin(client: Client) -> CouncilPlugin {
    plugin_with_api_url(client, DEFAULT_API_URL)
}

/// Build the York plugin against a custom endpoint template.
#[must_use]
pub fn plugin_with_api_url<U: Into<String>>(client: Client, api_url: U) -> CouncilPlugin {
    CouncilPlugin {
        meta: council_meta(),
        schedule_port: Arc::new(YorkSchedulePort::with_api_url(client, api_url)),
        normalizer: default_normalizer(),
    }
}

/// Category map, icons, and attribute projection used for York by default.
#[must_use]
pub fn default_normalizer() -> Normalizer {
    let mut categories = CategoryMap::new();
    for (service, category, icon) in DEFAULT_SERVICES {
        categories
            .insert(service, category, Some(icon))
            .expect("York categories avoid reserved names");
    }
    let attributes = DEFAULT_ATTRIBUTES.iter().copied().map(str::to_owned).collect();
    Normalizer::new(categories, attributes).expect("York attributes avoid record fields")
}

fn council_meta() -> CouncilMeta {
    CouncilMeta {
        id: CouncilId::from(Councils::York),
        name: String::from("City of York"),
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(
    req: RequestBuilder,
    url: &str,
    context: &str,
) -> Result<T, PortError> {
    let response = req.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PortError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| PortError::Decode {
        context: context.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> YorkSchedulePort {
        YorkSchedulePort::with_api_url(Client::new(), "http://localhost/uprn/{uprn}/bins")
    }

    #[test]
    fn services_url_substitutes_uprn() {
        let url = port()
            .services_url(&PropertyRef(" 100050535540 ".to_owned()))
            .expect("valid uprn");
        assert_eq!(url, "http://localhost/uprn/100050535540/bins");
    }

    #[test]
    fn services_url_rejects_non_numeric_uprn() {
        for uprn in ["", "  ", "10005A", "1234567890123", "../admin"] {
            let result = port().services_url(&PropertyRef(uprn.to_owned()));
            assert!(
                matches!(result, Err(PortError::InvalidPropertyRef(_))),
                "{uprn:?} should be rejected"
            );
        }
    }

    #[test]
    fn default_normalizer_maps_york_services() {
        let normalizer = default_normalizer();
        let categories = normalizer.categories();

        assert_eq!(categories.len(), 3);
        let refuse = categories.resolve("REFUSE").expect("refuse mapped");
        assert_eq!(refuse.category.as_str(), "blackbin");
        assert_eq!(refuse.icon.as_deref(), Some("mdi:trash-can"));
        assert!(categories.resolve("GLASS").is_err());
        assert_eq!(normalizer.attributes().len(), DEFAULT_ATTRIBUTES.len());
    }

    #[test]
    fn plugin_is_registered_as_york() {
        let plugin = plugin(Client::new());
        assert_eq!(plugin.meta.id, CouncilId("york".to_owned()));
        assert_eq!(plugin.schedule_port.council().name, "City of York");
    }
}
