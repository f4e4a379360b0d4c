use serde::{Deserialize, Deserializer, Serialize};

use crate::reputation::{AgentMetrics, ScoreResult};

/// Body of POST /get-reputation
///
/// Only `agent_id` is required. Every metric may be omitted or `null`,
/// both of which mean "use the zero default".
#[derive(Debug, Clone, Deserialize)]
pub struct AgentQuery {
    pub agent_id: String,
    #[serde(default, deserialize_with = "whole_number")]
    pub moltbook_activity_score: Option<i64>,
    #[serde(default)]
    pub transaction_volume_usd: Option<f64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub age_in_days: Option<i64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub positive_feedback_count: Option<i64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub negative_feedback_count: Option<i64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub x402_payments_made: Option<i64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub x402_payments_received: Option<i64>,
}

impl AgentQuery {
    /// Validate the identifier and fill in defaults for everything else
    pub fn into_metrics(self) -> Result<AgentMetrics, String> {
        if self.agent_id.is_empty() {
            return Err("agent_id must not be empty".to_string());
        }

        Ok(AgentMetrics {
            agent_id: self.agent_id,
            moltbook_activity_score: self.moltbook_activity_score.unwrap_or(0),
            transaction_volume_usd: self.transaction_volume_usd.unwrap_or(0.0),
            age_in_days: self.age_in_days.unwrap_or(0),
            positive_feedback_count: self.positive_feedback_count.unwrap_or(0),
            negative_feedback_count: self.negative_feedback_count.unwrap_or(0),
            x402_payments_made: self.x402_payments_made.unwrap_or(0),
            x402_payments_received: self.x402_payments_received.unwrap_or(0),
        })
    }
}

/// Integer field that also takes a JSON float with no fractional part (`80.0`)
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<serde_json::Number>::deserialize(deserializer)? {
        Some(n) => n,
        None => return Ok(None),
    };
    if let Some(v) = number.as_i64() {
        return Ok(Some(v));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Some(f as i64)),
        _ => Err(serde::de::Error::custom(format!(
            "invalid value: {}, expected a whole number",
            number
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReputationResponse {
    pub agent_id: String,
    pub reputation_score: u8,
    pub trust_level: String,
    pub status: String,
    pub payment_confirmed: bool,
}

impl ReputationResponse {
    pub fn success(agent_id: String, result: &ScoreResult) -> Self {
        Self {
            agent_id,
            reputation_score: result.score,
            trust_level: result.tier.label().to_string(),
            status: "success".to_string(),
            payment_confirmed: true,
        }
    }
}
