//! Region enrichment via reverse geocoding.
//!
//! Maps a coordinate to administrative-region names through a
//! Nominatim-compatible `/reverse` endpoint. A result that exists but lacks
//! the expected address fields gets sentinel "not found" text; a result
//! with no address at all is absent on both fields. Transport and service
//! failures are absorbed as absent, with a warning, so a flaky geocoder
//! never aborts a cell.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

use crate::config::Geocoding;
use crate::grid::Coordinate;

/// Sentinel for a geocoder result that lacks the region field.
pub const REGION_NOT_FOUND: &str = "region not found";
/// Sentinel for a geocoder result that lacks the subregion field.
pub const SUBREGION_NOT_FOUND: &str = "subregion not found";

/// Administrative-region names for one coordinate.
///
/// `None` means the geocoder had no result (or failed); the sentinel
/// strings mean it had a result missing that field. The two cases are
/// distinct and both flow into the output verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Regions {
    pub region: Option<String>,
    pub subregion: Option<String>,
}

impl Regions {
    /// True when the lookup produced nothing at all.
    pub fn is_absent(&self) -> bool {
        self.region.is_none() && self.subregion.is_none()
    }
}

/// Enrichment seam; the sweep runs against this trait so tests can script
/// lookups without a network.
#[async_trait]
pub trait Enricher: Send {
    async fn enrich(&self, coord: Coordinate) -> Regions;
}

/// Reverse-geocoding client for a Nominatim-compatible service.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(config: &Geocoding) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    async fn reverse(&self, coord: Coordinate) -> Result<Regions, reqwest::Error> {
        let url = format!("{}/reverse", self.base_url);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .query(&[
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
                ("format", "jsonv2".to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_regions(&body))
    }
}

#[async_trait]
impl Enricher for NominatimClient {
    /// One reverse-geocoding request per call. Failures degrade to absent.
    async fn enrich(&self, coord: Coordinate) -> Regions {
        match self.reverse(coord).await {
            Ok(regions) => regions,
            Err(e) => {
                warn!(%coord, error = %e, "reverse geocoding failed, recording absent regions");
                Regions::default()
            }
        }
    }
}

/// Pull region names out of a reverse-geocoding response body.
pub fn parse_regions(body: &serde_json::Value) -> Regions {
    let Some(address) = body.get("address").and_then(|a| a.as_object()) else {
        return Regions::default();
    };
    let field = |name: &str, missing: &str| {
        address
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or(missing)
            .to_string()
    };
    Regions {
        region: Some(field("state", REGION_NOT_FOUND)),
        subregion: Some(field("province", SUBREGION_NOT_FOUND)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NominatimClient {
        NominatimClient::new(&Geocoding {
            base_url: server.uri(),
            user_agent: "gridsweep-test".to_string(),
            language: "es".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_parse_full_address() {
        let body = serde_json::json!({
            "address": { "state": "Andalucía", "province": "Sevilla" }
        });
        let regions = parse_regions(&body);
        assert_eq!(regions.region.as_deref(), Some("Andalucía"));
        assert_eq!(regions.subregion.as_deref(), Some("Sevilla"));
    }

    #[test]
    fn test_parse_partial_address_gets_placeholders() {
        let body = serde_json::json!({ "address": { "country": "España" } });
        let regions = parse_regions(&body);
        assert_eq!(regions.region.as_deref(), Some(REGION_NOT_FOUND));
        assert_eq!(regions.subregion.as_deref(), Some(SUBREGION_NOT_FOUND));
    }

    #[test]
    fn test_parse_no_address_is_absent() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        let regions = parse_regions(&body);
        assert!(regions.is_absent());
    }

    #[tokio::test]
    async fn test_enrich_queries_reverse_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "40.25"))
            .and(query_param("lon", "-3.5"))
            .and(query_param("format", "jsonv2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "state": "Comunidad de Madrid", "province": "Madrid" }
            })))
            .mount(&server)
            .await;

        let regions = client_for(&server)
            .enrich(Coordinate::new(40.25, -3.5))
            .await;
        assert_eq!(regions.region.as_deref(), Some("Comunidad de Madrid"));
        assert_eq!(regions.subregion.as_deref(), Some("Madrid"));
    }

    #[tokio::test]
    async fn test_enrich_absorbs_service_failure_as_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let regions = client_for(&server).enrich(Coordinate::new(0.0, 0.0)).await;
        assert!(regions.is_absent());
    }
}
