//! Search target generation: expands a business type and a geographic scope
//! into map-search URLs, one per postal code where a code list is available.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::{GeoScope, SearchTarget};
use crate::transport::RetryingClient;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use url::Url;

/// Everything except `[A-Za-z0-9_.~/-]` gets percent-encoded, so spaces and
/// commas in the query phrase land as `%20` and `%2C`.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Free-tier lookup bounds for the postal-code service.
const NEARBY_RADIUS_KM: u32 = 30;
const NEARBY_MAX_ROWS: u32 = 500;

/// Expands `scope` into one [`SearchTarget`] per query phrase.
///
/// City scopes produce a single target. ZIP scopes produce one target per
/// code. Coordinate scopes resolve nearby postal codes through the GeoNames
/// API first, degrading to the single city query if the lookup fails or
/// comes back empty.
pub async fn generate_targets(
    config: &Config,
    client: &RetryingClient,
    business_type: &str,
    scope: &GeoScope,
) -> Result<Vec<SearchTarget>> {
    let business_type = business_type.trim();
    if business_type.is_empty() {
        return Err(AppError::Input("Business type must not be empty.".to_string()));
    }

    let queries = match scope {
        GeoScope::City {
            city,
            state,
            country,
        } => vec![city_query(business_type, city, state, country)],
        GeoScope::ZipCodes {
            city,
            state,
            country,
            zips,
        } => {
            if zips.is_empty() {
                return Err(AppError::Input("ZIP code list must not be empty.".to_string()));
            }
            zips.iter()
                .map(|zip| zip_query(business_type, zip, city, state, country))
                .collect()
        }
        GeoScope::Coordinates {
            city,
            state,
            country,
            latitude,
            longitude,
        } => {
            let codes = match nearby_postal_codes(config, client, *latitude, *longitude).await {
                Ok(codes) if !codes.is_empty() => codes,
                Ok(_) => {
                    tracing::warn!(target: "query",
                        "No postal codes near ({}, {}); using a single city query.",
                        latitude, longitude);
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(target: "query",
                        "Postal code lookup failed ({}); using a single city query.", e);
                    Vec::new()
                }
            };
            if codes.is_empty() {
                vec![city_query(business_type, city, state, country)]
            } else {
                codes
                    .iter()
                    .map(|(zip, place)| zip_query(business_type, zip, place, state, country))
                    .collect()
            }
        }
    };

    let mut targets = Vec::with_capacity(queries.len());
    for query in &queries {
        targets.push(SearchTarget::new(maps_url(query)?, config.max_results)?);
    }
    tracing::info!(target: "query",
        "Generated {} search target(s) for '{}'.", targets.len(), business_type);
    Ok(targets)
}

fn city_query(business_type: &str, city: &str, state: &str, country: &str) -> String {
    format!("{}, {}, {}, {}", business_type, city, state, country)
}

fn zip_query(business_type: &str, zip: &str, city: &str, state: &str, country: &str) -> String {
    format!("{}, {}, {}, {}, {}", business_type, zip, city, state, country)
}

/// Builds the map-search URL for one query phrase.
fn maps_url(query: &str) -> Result<Url> {
    let encoded = utf8_percent_encode(query, QUERY_ENCODE).to_string();
    Ok(Url::parse(&format!(
        "https://www.google.com/maps/search/{}/?hl=en&gl=US",
        encoded
    ))?)
}

#[derive(Debug, Deserialize)]
struct NearbyPostalCodesResponse {
    #[serde(rename = "postalCodes", default)]
    postal_codes: Vec<PostalCodeEntry>,
    status: Option<GeoNamesStatus>,
}

#[derive(Debug, Deserialize)]
struct PostalCodeEntry {
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
    #[serde(rename = "placeName")]
    place_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoNamesStatus {
    message: Option<String>,
}

/// Resolves postal codes around a coordinate through GeoNames.
async fn nearby_postal_codes(
    config: &Config,
    client: &RetryingClient,
    latitude: f64,
    longitude: f64,
) -> Result<Vec<(String, String)>> {
    let username = config.geonames_username.as_deref().ok_or_else(|| {
        AppError::Config(
            "A GeoNames username is required to expand a coordinate scope.".to_string(),
        )
    })?;

    let mut url = Url::parse("http://api.geonames.org/findNearbyPostalCodesJSON")?;
    url.query_pairs_mut()
        .append_pair("lat", &latitude.to_string())
        .append_pair("lng", &longitude.to_string())
        .append_pair("radius", &NEARBY_RADIUS_KM.to_string())
        .append_pair("maxRows", &NEARBY_MAX_ROWS.to_string())
        .append_pair("username", username);

    tracing::debug!(target: "query",
        "Fetching postal codes near ({}, {})...", latitude, longitude);
    let body = client.get_text(&url, config.request_timeout).await?;
    let response: NearbyPostalCodesResponse = serde_json::from_str(&body)?;

    if let Some(status) = response.status {
        return Err(AppError::Config(format!(
            "Postal code service error: {}",
            status.message.unwrap_or_else(|| "unknown".to_string())
        )));
    }

    Ok(response
        .postal_codes
        .into_iter()
        .filter_map(|entry| {
            let zip = entry.postal_code.filter(|z| !z.is_empty())?;
            let place = entry.place_name.unwrap_or_default();
            Some((zip, place))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_phrase_is_percent_encoded() {
        let url = maps_url("coffee shops, 83702, Boise, ID, US").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps/search/coffee%20shops%2C%2083702%2C%20Boise%2C%20ID%2C%20US/?hl=en&gl=US"
        );
    }

    #[tokio::test]
    async fn city_scope_yields_one_target() {
        let config = Config::default();
        let client = RetryingClient::new(&config).unwrap();
        let scope = GeoScope::City {
            city: "Boise".to_string(),
            state: "ID".to_string(),
            country: "US".to_string(),
        };
        let targets = generate_targets(&config, &client, "plumbing", &scope)
            .await
            .unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets[0]
            .url()
            .as_str()
            .contains("plumbing%2C%20Boise%2C%20ID%2C%20US"));
        assert_eq!(targets[0].max_results(), config.max_results);
    }

    #[tokio::test]
    async fn zip_scope_yields_one_target_per_code() {
        let config = Config::default();
        let client = RetryingClient::new(&config).unwrap();
        let scope = GeoScope::ZipCodes {
            city: "Boise".to_string(),
            state: "ID".to_string(),
            country: "US".to_string(),
            zips: vec!["83702".to_string(), "83703".to_string()],
        };
        let targets = generate_targets(&config, &client, "roofing", &scope)
            .await
            .unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets[0].url().as_str().contains("83702"));
        assert!(targets[1].url().as_str().contains("83703"));
    }

    #[tokio::test]
    async fn blank_business_type_is_rejected() {
        let config = Config::default();
        let client = RetryingClient::new(&config).unwrap();
        let scope = GeoScope::City {
            city: "Boise".to_string(),
            state: "ID".to_string(),
            country: "US".to_string(),
        };
        assert!(generate_targets(&config, &client, "  ", &scope)
            .await
            .is_err());
    }

    #[test]
    fn postal_code_response_parsing() {
        let body = r#"{"postalCodes":[
            {"postalCode":"83702","placeName":"Boise"},
            {"postalCode":"","placeName":"Empty"},
            {"placeName":"NoCode"}
        ]}"#;
        let parsed: NearbyPostalCodesResponse = serde_json::from_str(body).unwrap();
        let codes: Vec<(String, String)> = parsed
            .postal_codes
            .into_iter()
            .filter_map(|e| {
                let zip = e.postal_code.filter(|z| !z.is_empty())?;
                Some((zip, e.place_name.unwrap_or_default()))
            })
            .collect();
        assert_eq!(codes, vec![("83702".to_string(), "Boise".to_string())]);
    }
}
