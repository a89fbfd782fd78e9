//! Sighting reports: the public map, report pages, submission and the
//! believe/skeptic/witness interactions.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use handlers::ReportState;
pub use services::{InteractionService, ReportService, SubmissionService};
