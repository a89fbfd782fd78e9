use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::dtos::{ReportResponseDto, ReportSummaryDto};
use crate::features::users::models::{User, UserReportCount};

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublicDto {
    pub id: i64,
    pub nome: String,
    pub foto_url: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl From<User> for UserPublicDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nome: u.name,
            foto_url: u.picture_url,
            criado_em: u.created_at,
        }
    }
}

/// The logged-in user, as returned by `/me`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserDto {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub foto_url: Option<String>,
}

impl From<User> for CurrentUserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nome: u.name,
            email: u.email,
            foto_url: u.picture_url,
        }
    }
}

/// Profile page: the user and their approved reports
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    pub usuario: UserPublicDto,
    pub relatos: Vec<ReportResponseDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRankingDto {
    pub id: i64,
    pub nome: String,
    pub foto_url: Option<String>,
    pub total_relatos: i64,
}

impl From<UserReportCount> for UserRankingDto {
    fn from(u: UserReportCount) -> Self {
        Self {
            id: u.id,
            nome: u.name,
            foto_url: u.picture_url,
            total_relatos: u.total_relatos,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankingsDto {
    /// Approved reports with the most believe votes
    pub mais_acreditados: Vec<ReportSummaryDto>,
    /// Approved reports with the most witness marks
    pub mais_testemunhados: Vec<ReportSummaryDto>,
    /// Users with the most approved reports
    pub usuarios_mais_ativos: Vec<UserRankingDto>,
}
