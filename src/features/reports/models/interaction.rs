use sqlx::FromRow;

/// Believe/skeptic vote cast on a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Believe,
    Skeptic,
}

impl VoteKind {
    /// Parse the `tipo` path segment; anything else is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "acredito" => Some(VoteKind::Believe),
            "cetico" => Some(VoteKind::Skeptic),
            _ => None,
        }
    }

    /// Value stored in `votos.tipo_voto`
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Believe => "acredito",
            VoteKind::Skeptic => "cetico",
        }
    }
}

impl std::fmt::Display for VoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One session interaction with a report. Each kind owns exactly one counter
/// column; the SQL for it is fixed here and never built from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Vote(VoteKind),
    Witness,
}

impl InteractionKind {
    pub fn increment_counter_sql(&self) -> &'static str {
        match self {
            InteractionKind::Vote(VoteKind::Believe) => {
                "UPDATE relatos SET votos_acredito = votos_acredito + 1 WHERE id = $1 \
                 RETURNING votos_acredito, votos_cetico, votos_testemunha"
            }
            InteractionKind::Vote(VoteKind::Skeptic) => {
                "UPDATE relatos SET votos_cetico = votos_cetico + 1 WHERE id = $1 \
                 RETURNING votos_acredito, votos_cetico, votos_testemunha"
            }
            InteractionKind::Witness => {
                "UPDATE relatos SET votos_testemunha = votos_testemunha + 1 WHERE id = $1 \
                 RETURNING votos_acredito, votos_cetico, votos_testemunha"
            }
        }
    }

    pub fn counter_column(&self) -> &'static str {
        match self {
            InteractionKind::Vote(VoteKind::Believe) => "votos_acredito",
            InteractionKind::Vote(VoteKind::Skeptic) => "votos_cetico",
            InteractionKind::Witness => "votos_testemunha",
        }
    }

    /// Message returned when the session already interacted with the report
    pub fn already_interacted_message(&self) -> &'static str {
        match self {
            InteractionKind::Vote(_) => "Você já votou neste relato.",
            InteractionKind::Witness => "Você já interagiu com este relato.",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            InteractionKind::Vote(_) => "Voto computado!",
            InteractionKind::Witness => "Testemunho registrado!",
        }
    }
}

/// Counters read back after an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct InteractionCounts {
    #[sqlx(rename = "votos_acredito")]
    pub believe: i32,
    #[sqlx(rename = "votos_cetico")]
    pub skeptic: i32,
    #[sqlx(rename = "votos_testemunha")]
    pub witness: i32,
}

/// What the current session has already done on a report
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct SessionInteraction {
    pub vote: Option<String>,
    pub witnessed: bool,
}
