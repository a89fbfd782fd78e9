//! Comments on reports, per-session likes and visitor reports for moderation

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::CommentService;
