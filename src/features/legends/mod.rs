//! Campus legends: public reading, admin management with an optional image

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use handlers::LegendState;
pub use services::LegendService;
