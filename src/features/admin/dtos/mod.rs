mod admin_dtos;

pub use admin_dtos::{ModerationFilter, ModerationPanelDto, ModerationQuery};
