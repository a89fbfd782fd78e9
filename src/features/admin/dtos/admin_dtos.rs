use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::comments::dtos::AdminCommentDto;
use crate::features::reports::dtos::AdminReportDto;

/// Which reports the moderation list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModerationFilter {
    #[default]
    Pending,
    Approved,
    Flagged,
    All,
}

impl ModerationFilter {
    /// Unknown or missing values fall back to pending
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("aprovados") => ModerationFilter::Approved,
            Some("denunciados") => ModerationFilter::Flagged,
            Some("todos") => ModerationFilter::All,
            _ => ModerationFilter::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationFilter::Pending => "pendentes",
            ModerationFilter::Approved => "aprovados",
            ModerationFilter::Flagged => "denunciados",
            ModerationFilter::All => "todos",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ModerationQuery {
    /// pendentes (default), aprovados, denunciados or todos
    pub filtro: Option<String>,
}

/// Moderation panel: filtered reports plus every comment by report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModerationPanelDto {
    pub filtro: String,
    pub relatos: Vec<AdminReportDto>,
    /// Comments keyed by report id, newest first
    pub comentarios_por_relato: BTreeMap<i64, Vec<AdminCommentDto>>,
    pub total_denunciados: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse_falls_back_to_pending() {
        assert_eq!(ModerationFilter::parse(None), ModerationFilter::Pending);
        assert_eq!(
            ModerationFilter::parse(Some("qualquer")),
            ModerationFilter::Pending
        );
        assert_eq!(
            ModerationFilter::parse(Some("denunciados")),
            ModerationFilter::Flagged
        );
        assert_eq!(ModerationFilter::parse(Some("todos")).as_str(), "todos");
    }
}
