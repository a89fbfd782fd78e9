pub mod constants;
pub mod locations;
pub mod multipart;
pub mod rate_limit;
pub mod templates;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
