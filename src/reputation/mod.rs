pub mod engine;
pub mod types;

pub use engine::ScoreEngine;
pub use types::{AgentMetrics, ScoreResult, TrustTier};
