mod interaction_service;
mod report_service;
mod submission_service;

pub use interaction_service::InteractionService;
pub use report_service::{build_markers, ReportFilters, ReportService, REPORT_NOT_FOUND_MESSAGE};
pub use submission_service::{
    validate_submission, SubmissionForm, SubmissionService, ValidatedSubmission,
    CAPTCHA_FIELD,
};
