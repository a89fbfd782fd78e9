mod comment;

pub use comment::{Comment, CommentWithLikes, CreateComment, LikeAction, COMMENT_COLUMNS};
