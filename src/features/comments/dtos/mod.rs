mod comment_dto;

pub use comment_dto::{
    AdminCommentDto, CommentResponseDto, CreateCommentDto, LikeToggleResponseDto,
};
