//! IP geolocation used to enrich stored request metadata

mod ip_api_client;

pub use ip_api_client::IpApiClient;
