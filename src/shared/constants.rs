/// Report categories accepted by submission and the listing filter
pub const CATEGORIES: [&str; 5] = [
    "Aparição",
    "Som Estranho",
    "Objeto Visto",
    "Sensação Estranha",
    "Outro Fenômeno",
];

/// Location option that switches to a free-text location
pub const OTHER_LOCATION: &str = "Outro Local / Não Listado";

/// Prefix of stored free-text locations
pub const OTHER_LOCATION_PREFIX: &str = "Outro:";

/// Map coordinate used when the catalog has no entry for the other-location marker
pub const DEFAULT_COORDINATE: [f64; 2] = [-23.4065, -51.9395];

/// City recorded until (or unless) the IP lookup resolves one
pub const UNKNOWN_CITY: &str = "Desconhecida";

// =============================================================================
// FIELD LIMITS (characters)
// =============================================================================

pub const MAX_REPORT_TITLE_CHARS: usize = 100;
pub const MAX_REPORT_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_LEGEND_TITLE_CHARS: usize = 150;

// =============================================================================
// ATTACHMENT LIMITS (bytes)
// =============================================================================

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Number of entries in each ranking
pub const RANKING_SIZE: i64 = 10;

pub fn is_valid_category(value: &str) -> bool {
    CATEGORIES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_category() {
        assert!(is_valid_category("Som Estranho"));
        assert!(!is_valid_category("som estranho"));
        assert!(!is_valid_category(""));
    }
}
