use crate::reputation::types::{AgentMetrics, ScoreResult, TrustTier};

const ACTIVITY_WEIGHT: f64 = 0.3;

const VOLUME_HIGH_USD: f64 = 1000.0;
const VOLUME_HIGH_BONUS: f64 = 20.0;
const VOLUME_MID_USD: f64 = 100.0;
const VOLUME_MID_BONUS: f64 = 10.0;

const AGE_VETERAN_DAYS: i64 = 365;
const AGE_VETERAN_BONUS: f64 = 15.0;
const AGE_ESTABLISHED_DAYS: i64 = 90;
const AGE_ESTABLISHED_BONUS: f64 = 5.0;

const FEEDBACK_SPOTLESS_BONUS: f64 = 10.0;
const FEEDBACK_NET_POSITIVE_BONUS: f64 = 5.0;
const FEEDBACK_NET_NEGATIVE_PENALTY: f64 = -5.0;

const PAYMENTS_THRESHOLD: i64 = 5;
const PAYMENTS_RECEIVED_BONUS: f64 = 10.0;
const PAYMENTS_MADE_BONUS: f64 = 5.0;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 100.0;

/// Reputation Score Engine
///
/// Maps an agent's self-reported metrics to a score in 0..=100 and a trust
/// tier. Stateless: the same metrics always give the same result, and the
/// engine can be shared across any number of request handlers.
///
/// Formula:
///   total = activity * 0.3
///         + volume bonus   (> $1000: 20, > $100: 10)
///         + age bonus      (> 365d: 15, > 90d: 5)
///         + feedback term  (positive only: 10, net positive: 5, net negative: -5)
///         + payments bonus (received > 5: 10, made > 5: 5)
///   score = clamp(trunc(total), 0, 100)
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine;

impl ScoreEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score an agent. Total over every input, never fails.
    pub fn compute(&self, metrics: &AgentMetrics) -> ScoreResult {
        let score = finalize(self.raw_total(metrics));
        ScoreResult {
            score,
            tier: TrustTier::from_score(score),
        }
    }

    /// Running total before truncation and clamping
    pub fn raw_total(&self, metrics: &AgentMetrics) -> f64 {
        activity_term(metrics.moltbook_activity_score)
            + volume_term(metrics.transaction_volume_usd)
            + age_term(metrics.age_in_days)
            + feedback_term(metrics.positive_feedback_count, metrics.negative_feedback_count)
            + payments_term(metrics.x402_payments_received, metrics.x402_payments_made)
    }
}

fn activity_term(activity: i64) -> f64 {
    activity as f64 * ACTIVITY_WEIGHT
}

fn volume_term(volume_usd: f64) -> f64 {
    if volume_usd > VOLUME_HIGH_USD {
        VOLUME_HIGH_BONUS
    } else if volume_usd > VOLUME_MID_USD {
        VOLUME_MID_BONUS
    } else {
        0.0
    }
}

fn age_term(age_in_days: i64) -> f64 {
    match age_in_days {
        d if d > AGE_VETERAN_DAYS => AGE_VETERAN_BONUS,
        d if d > AGE_ESTABLISHED_DAYS => AGE_ESTABLISHED_BONUS,
        _ => 0.0,
    }
}

/// The spotless arm must come first: with no negatives, any positive
/// feedback earns the full bonus rather than the net-positive one.
fn feedback_term(positive: i64, negative: i64) -> f64 {
    match (positive, negative) {
        (p, 0) if p > 0 => FEEDBACK_SPOTLESS_BONUS,
        (p, n) if p > n => FEEDBACK_NET_POSITIVE_BONUS,
        (p, n) if n > p => FEEDBACK_NET_NEGATIVE_PENALTY,
        _ => 0.0,
    }
}

fn payments_term(received: i64, made: i64) -> f64 {
    let mut term = 0.0;
    if received > PAYMENTS_THRESHOLD {
        term += PAYMENTS_RECEIVED_BONUS;
    }
    if made > PAYMENTS_THRESHOLD {
        term += PAYMENTS_MADE_BONUS;
    }
    term
}

/// Truncate toward zero, then clamp into 0..=100
fn finalize(total: f64) -> u8 {
    total.trunc().clamp(MIN_SCORE, MAX_SCORE) as u8
}
