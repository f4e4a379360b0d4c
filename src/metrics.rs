//! Prometheus-compatible metrics exporter for agent-trust
//!
//! Counters are updated from the HTTP handlers and never feed back into
//! scoring.
//!
//! Endpoint: GET /metrics (on the API port, default 8000)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::reputation::{ScoreResult, TrustTier};

/// Service counters, atomically updated from request handling
pub struct MetricsCounters {
    /// Total POST /get-reputation requests received
    pub requests_total: AtomicU64,
    /// Requests rejected for a missing payment token
    pub payment_required_total: AtomicU64,
    /// Requests rejected for an invalid body
    pub invalid_requests_total: AtomicU64,
    /// Requests that reached the score engine
    pub scored_total: AtomicU64,
    /// Sum of all returned scores (for the average)
    pub score_sum: AtomicU64,
    pub tier_low: AtomicU64,
    pub tier_medium: AtomicU64,
    pub tier_high: AtomicU64,
    pub tier_very_high: AtomicU64,
    /// Server start time
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            payment_required_total: AtomicU64::new(0),
            invalid_requests_total: AtomicU64::new(0),
            scored_total: AtomicU64::new(0),
            score_sum: AtomicU64::new(0),
            tier_low: AtomicU64::new(0),
            tier_medium: AtomicU64::new(0),
            tier_high: AtomicU64::new(0),
            tier_very_high: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_score(&self, result: &ScoreResult) {
        self.scored_total.fetch_add(1, Ordering::Relaxed);
        self.score_sum.fetch_add(result.score as u64, Ordering::Relaxed);
        self.tier_counter(result.tier).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn tier_counter(&self, tier: TrustTier) -> &AtomicU64 {
        match tier {
            TrustTier::Low => &self.tier_low,
            TrustTier::Medium => &self.tier_medium,
            TrustTier::High => &self.tier_high,
            TrustTier::VeryHigh => &self.tier_very_high,
        }
    }

    pub fn average_score(&self) -> f64 {
        let count = self.scored_total.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.score_sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let tiers: serde_json::Map<String, serde_json::Value> = TrustTier::ALL
            .iter()
            .map(|t| {
                (
                    t.key().to_string(),
                    self.tier_counter(*t).load(Ordering::Relaxed).into(),
                )
            })
            .collect();

        serde_json::json!({
            "uptime_secs": self.start_time.elapsed().as_secs(),
            "requests_total": self.requests_total.load(Ordering::Relaxed),
            "payment_required_total": self.payment_required_total.load(Ordering::Relaxed),
            "invalid_requests_total": self.invalid_requests_total.load(Ordering::Relaxed),
            "scored_total": self.scored_total.load(Ordering::Relaxed),
            "average_score": self.average_score(),
            "tiers": tiers,
        })
    }
}

impl Default for MetricsCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(c: &MetricsCounters) -> String {
    let mut out = String::with_capacity(2048);

    write_help_type(&mut out, "agent_trust_up", "Whether the reputation API is up.", "gauge");
    writeln!(out, "agent_trust_up 1").ok();

    let uptime = c.start_time.elapsed().as_secs_f64();
    write_help_type(&mut out, "agent_trust_uptime_seconds_total", "Uptime since server boot in seconds.", "counter");
    writeln!(out, "agent_trust_uptime_seconds_total {:.3}", uptime).ok();

    // ──────────────────────────────────────────────
    // Request outcomes
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "agent_trust_requests_total", "Total number of reputation requests received.", "counter");
    writeln!(out, "agent_trust_requests_total {}", c.requests_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "agent_trust_rejections_total", "Requests rejected before scoring, by reason.", "counter");
    writeln!(
        out,
        "agent_trust_rejections_total{{reason=\"payment_required\"}} {}",
        c.payment_required_total.load(Ordering::Relaxed)
    )
    .ok();
    writeln!(
        out,
        "agent_trust_rejections_total{{reason=\"invalid_request\"}} {}",
        c.invalid_requests_total.load(Ordering::Relaxed)
    )
    .ok();

    // ──────────────────────────────────────────────
    // Scores
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "agent_trust_scored_total", "Total number of agents scored.", "counter");
    writeln!(out, "agent_trust_scored_total {}", c.scored_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "agent_trust_tier_total", "Scored agents by trust tier.", "counter");
    for tier in TrustTier::ALL {
        writeln!(
            out,
            "agent_trust_tier_total{{tier=\"{}\"}} {}",
            tier.key(),
            c.tier_counter(tier).load(Ordering::Relaxed)
        )
        .ok();
    }

    write_help_type(&mut out, "agent_trust_score_avg", "Average reputation score returned.", "gauge");
    writeln!(out, "agent_trust_score_avg {:.3}", c.average_score()).ok();

    write_help_type(&mut out, "agent_trust_build_info", "agent-trust build information.", "gauge");
    writeln!(out, "agent_trust_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}
