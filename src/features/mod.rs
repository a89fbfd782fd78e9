//! Features layer - one module per area of the site

pub mod admin;
pub mod auth;
pub mod comments;
pub mod legends;
pub mod metadata;
pub mod notifications;
pub mod reports;
pub mod users;
