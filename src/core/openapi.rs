use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::auth::handlers as auth_handlers;
use crate::features::comments::{dtos as comments_dtos, handlers as comments_handlers};
use crate::features::legends::{dtos as legends_dtos, handlers as legends_handlers};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::list_reports,
        reports_handlers::get_report,
        reports_handlers::submit_form_options,
        reports_handlers::submit_report,
        reports_handlers::vote,
        reports_handlers::witness,
        // Comments
        comments_handlers::add_comment,
        comments_handlers::report_comment,
        comments_handlers::like_comment,
        // Legends
        legends_handlers::list_legends,
        legends_handlers::get_legend,
        legends_handlers::admin_list_legends,
        legends_handlers::create_legend,
        legends_handlers::edit_legend_form,
        legends_handlers::update_legend,
        legends_handlers::delete_legend,
        // Auth
        auth_handlers::login,
        auth_handlers::authorize,
        auth_handlers::logout,
        auth_handlers::me,
        // Users
        users_handlers::get_profile,
        users_handlers::get_rankings,
        // Admin
        admin_handlers::list_reports,
        admin_handlers::approve_report,
        admin_handlers::delete_report,
        admin_handlers::delete_comment,
        admin_handlers::unreport_comment,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reports
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportSummaryDto,
            reports_dtos::AdminReportDto,
            reports_dtos::ListReportsQuery,
            reports_dtos::MapMarkerDto,
            reports_dtos::ReportListResponseDto,
            reports_dtos::SubmitFormOptionsDto,
            reports_dtos::SubmitReportDto,
            reports_dtos::ReportDetailDto,
            reports_dtos::VoteResponseDto,
            reports_dtos::WitnessResponseDto,
            ApiResponse<reports_dtos::ReportListResponseDto>,
            ApiResponse<reports_dtos::ReportDetailDto>,
            ApiResponse<reports_dtos::SubmitFormOptionsDto>,
            ApiResponse<reports_dtos::ReportResponseDto>,
            // Comments
            comments_dtos::CommentResponseDto,
            comments_dtos::AdminCommentDto,
            comments_dtos::CreateCommentDto,
            comments_dtos::LikeToggleResponseDto,
            comments_handlers::FlaggedCommentDto,
            ApiResponse<comments_dtos::CommentResponseDto>,
            ApiResponse<comments_handlers::FlaggedCommentDto>,
            // Legends
            legends_dtos::LegendResponseDto,
            legends_dtos::LegendEditFormDto,
            legends_dtos::LegendFormDto,
            ApiResponse<legends_dtos::LegendResponseDto>,
            ApiResponse<Vec<legends_dtos::LegendResponseDto>>,
            ApiResponse<legends_dtos::LegendEditFormDto>,
            // Users
            users_dtos::UserPublicDto,
            users_dtos::CurrentUserDto,
            users_dtos::UserProfileDto,
            users_dtos::UserRankingDto,
            users_dtos::RankingsDto,
            ApiResponse<users_dtos::CurrentUserDto>,
            ApiResponse<users_dtos::UserProfileDto>,
            ApiResponse<users_dtos::RankingsDto>,
            // Admin
            admin_dtos::ModerationPanelDto,
            ApiResponse<admin_dtos::ModerationPanelDto>,
        )
    ),
    tags(
        (name = "reports", description = "Sighting reports, map markers and interactions"),
        (name = "comments", description = "Comments, likes and comment reports"),
        (name = "legends", description = "Campus legends"),
        (name = "auth", description = "Google login and the current session user"),
        (name = "users", description = "Public profiles and rankings"),
        (name = "admin", description = "Moderation (HTTP Basic auth)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Observatório API",
        version = "0.1.0",
        description = "Sighting reports, moderation and legends",
    )
)]
pub struct ApiDoc;

/// Registers the HTTP Basic scheme used by the admin routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_admin_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/vote/{id}/{tipo}"));
        assert!(doc.paths.paths.contains_key("/admin/approve/{id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("basic_auth"));
    }
}
