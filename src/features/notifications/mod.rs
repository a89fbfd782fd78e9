//! Fire-and-forget emails: new submissions go to the moderators, approvals
//! go to the report's owner.

mod notification_service;

pub use notification_service::NotificationService;
