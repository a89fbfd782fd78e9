//! Modules layer - Infrastructure components for external integrations
//!
//! Clients and adapters for media storage, email, CAPTCHA and geolocation.

pub mod captcha;
pub mod geolocation;
pub mod mail;
pub mod storage;
