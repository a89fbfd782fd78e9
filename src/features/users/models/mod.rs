mod user;

pub use user::{ExternalIdentity, User, UserReportCount, USER_COLUMNS};
