use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{AppError, Result};

/// ip-api.com JSON response (only the fields we read)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    pub status: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
}

impl IpApiResponse {
    /// "City, Region" when the lookup succeeded
    pub fn city_label(&self) -> Option<String> {
        if self.status != "success" {
            return None;
        }
        let city = self.city.as_deref().unwrap_or("");
        let region = self.region_name.as_deref().unwrap_or("");
        if city.is_empty() && region.is_empty() {
            return None;
        }
        Some(format!("{}, {}", city, region))
    }
}

/// Whether an address is worth looking up (public, parseable)
pub fn is_public_ip(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        Ok(IpAddr::V6(v6)) => !(v6.is_loopback() || v6.is_unspecified()),
        Err(_) => false,
    }
}

/// Client for the free ip-api.com city lookup
pub struct IpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url("http://ip-api.com")
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up "City, Region" for an IP. Private and loopback addresses are
    /// skipped and yield `None`.
    pub async fn lookup_city(&self, ip: &str) -> Result<Option<String>> {
        if !is_public_ip(ip) {
            tracing::debug!("Skipping geolocation for non-public address {}", ip);
            return Ok(None);
        }

        let url = format!("{}/json/{}", self.base_url, urlencoding::encode(ip));

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Geolocation request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Geolocation API returned HTTP {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid geolocation response: {}", e))
        })?;

        Ok(body.city_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_addresses_are_skipped() {
        assert!(!is_public_ip("127.0.0.1"));
        assert!(!is_public_ip("192.168.0.10"));
        assert!(!is_public_ip("10.1.2.3"));
        assert!(!is_public_ip("::1"));
        assert!(!is_public_ip("unknown"));
        assert!(is_public_ip("200.201.88.1"));
    }

    #[test]
    fn test_city_label() {
        let ok: IpApiResponse = serde_json::from_str(
            r#"{"status":"success","city":"Maringá","regionName":"Paraná"}"#,
        )
        .unwrap();
        assert_eq!(ok.city_label(), Some("Maringá, Paraná".to_string()));

        let failed: IpApiResponse =
            serde_json::from_str(r#"{"status":"fail","message":"reserved range"}"#).unwrap();
        assert_eq!(failed.city_label(), None);
    }

    #[tokio::test]
    async fn test_lookup_skips_loopback_without_network() {
        let client = IpApiClient::new().unwrap();
        assert_eq!(client.lookup_city("127.0.0.1").await.unwrap(), None);
    }
}
