mod comment_service;

pub use comment_service::{resolve_author, CommentService};
