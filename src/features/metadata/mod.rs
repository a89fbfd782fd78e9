//! Requester metadata: IP and user agent are stored with each row, the city
//! is filled in by a detached lookup after the response.

mod metadata_service;

pub use metadata_service::{MetadataService, MetadataTarget};
