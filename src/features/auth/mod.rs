//! Google login. The user id lives in the visitor session; accounts are
//! created on first login.

pub mod clients;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::AuthService;
