mod moderation_service;

pub use moderation_service::{group_comments_by_report, Approval, ModerationService};
