mod user_dto;

pub use user_dto::{CurrentUserDto, RankingsDto, UserProfileDto, UserPublicDto, UserRankingDto};
