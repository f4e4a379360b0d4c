use std::fmt;

/// Behavioral metrics reported for one agent
///
/// Every field is concrete: missing values are defaulted at the HTTP
/// boundary (see `web::request::AgentQuery`) before scoring. Ranges are
/// not enforced; negative counts or an activity score above 100 are
/// scored as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMetrics {
    pub agent_id: String,
    pub moltbook_activity_score: i64,
    pub transaction_volume_usd: f64,
    pub age_in_days: i64,
    pub positive_feedback_count: i64,
    pub negative_feedback_count: i64,
    pub x402_payments_made: i64,
    pub x402_payments_received: i64,
}

#[cfg(test)]
impl AgentMetrics {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }
}

/// Trust tiers, ordered from least to most trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrustTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl TrustTier {
    pub const ALL: [TrustTier; 4] = [
        TrustTier::Low,
        TrustTier::Medium,
        TrustTier::High,
        TrustTier::VeryHigh,
    ];

    /// Classify a clamped score. Bands are closed-open: [0,40) [40,60) [60,80) [80,100]
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => TrustTier::VeryHigh,
            s if s >= 60 => TrustTier::High,
            s if s >= 40 => TrustTier::Medium,
            _ => TrustTier::Low,
        }
    }

    /// Label returned in the `trust_level` field of the API response
    pub fn label(&self) -> &'static str {
        match self {
            TrustTier::Low => "Baixo",
            TrustTier::Medium => "Médio",
            TrustTier::High => "Alto",
            TrustTier::VeryHigh => "Muito Alto",
        }
    }

    /// Lowercase identifier used for metric labels
    pub fn key(&self) -> &'static str {
        match self {
            TrustTier::Low => "low",
            TrustTier::Medium => "medium",
            TrustTier::High => "high",
            TrustTier::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Always within 0..=100
    pub score: u8,
    pub tier: TrustTier,
}
