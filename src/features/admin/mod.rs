//! Admin moderation of reports and comments, behind HTTP Basic auth

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use handlers::AdminState;
pub use services::ModerationService;
