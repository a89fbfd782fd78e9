mod interaction;
mod report;

pub use interaction::{InteractionCounts, InteractionKind, SessionInteraction, VoteKind};
pub use report::{CreateReport, Report, REPORT_COLUMNS};
