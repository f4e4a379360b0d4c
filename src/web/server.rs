use std::sync::Arc;
use std::sync::atomic::Ordering;
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::config::Config;
use crate::metrics::{self, MetricsCounters};
use crate::reputation::ScoreEngine;
use crate::web::error::ApiError;
use crate::web::request::{AgentQuery, ReputationResponse};

/// HTTP front of the reputation engine
///
/// Owns the payment gate and the request/response envelope. Scoring is
/// delegated to `ScoreEngine` only after the payment header is present
/// and the body has been validated.
pub struct WebServer {
    config: Arc<Config>,
    state: AppState,
}

#[derive(Clone)]
struct AppState {
    engine: ScoreEngine,
    config: Arc<Config>,
    metrics: Arc<MetricsCounters>,
    payment_header: HeaderName,
}

impl WebServer {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let payment_header = HeaderName::from_bytes(config.payment.header.to_ascii_lowercase().as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid payment header name '{}': {}", config.payment.header, e))?;

        let state = AppState {
            engine: ScoreEngine::new(),
            config: config.clone(),
            metrics: Arc::new(MetricsCounters::new()),
            payment_header,
        };
        Ok(Self { config, state })
    }

    #[cfg(test)]
    pub fn metrics(&self) -> Arc<MetricsCounters> {
        self.state.metrics.clone()
    }

    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/", get(root))
            .route("/get-reputation", post(get_reputation));

        if self.config.web.metrics {
            app = app
                .route("/metrics", get(api_metrics))
                .route("/api/stats", get(api_stats));
        }

        let app = app.with_state(self.state.clone());

        if self.config.web.cors {
            app.layer(CorsLayer::permissive())
        } else {
            app
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.listen.address, self.config.listen.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("🌐 {} listening on http://{}", self.config.service.name, addr);
        info!(
            "💰 {} payments: {} USDC per query to {}",
            self.config.payment.protocol,
            self.config.payment.price_per_query_usdc,
            self.config.payment.address,
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Service metadata
async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    let c = &state.config;
    Json(serde_json::json!({
        "message": format!("Bem-vindo à {}!", c.service.name),
        "payment_protocol": c.payment.protocol,
        "payment_address": c.payment.address,
        "price_per_query_usdc": c.payment.price_per_query_usdc,
    }))
}

/// Reputation API - payment header first, then body, then scoring
async fn get_reputation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AgentQuery>, JsonRejection>,
) -> Result<Json<ReputationResponse>, ApiError> {
    state.metrics.requests_total.fetch_add(1, Ordering::Relaxed);

    if !has_payment_token(&headers, &state.payment_header) {
        state.metrics.payment_required_total.fetch_add(1, Ordering::Relaxed);
        debug!("Rejected request without {} header", state.payment_header);
        let p = &state.config.payment;
        return Err(ApiError::PaymentRequired {
            detail: format!(
                "Pagamento Necessário. Envie {} USDC para {} via protocolo {}.",
                p.price_per_query_usdc, p.address, p.protocol
            ),
        });
    }

    let metrics = body
        .map_err(|rejection| rejection.body_text())
        .and_then(|Json(query)| query.into_metrics())
        .map_err(|msg| {
            state.metrics.invalid_requests_total.fetch_add(1, Ordering::Relaxed);
            debug!("Invalid reputation request: {}", msg);
            ApiError::InvalidRequest(msg)
        })?;

    let result = state.engine.compute(&metrics);
    state.metrics.record_score(&result);
    debug!(agent_id = %metrics.agent_id, score = result.score, tier = %result.tier, "Agent scored");

    Ok(Json(ReputationResponse::success(metrics.agent_id, &result)))
}

/// Prometheus exposition
async fn api_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::render_metrics(&state.metrics),
    )
}

/// Stats API
async fn api_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.metrics.get_stats())
}

/// The token is opaque; any non-blank value counts as proof of payment
fn has_payment_token(headers: &HeaderMap, name: &HeaderName) -> bool {
    headers
        .get(name)
        .map(|v| v.as_bytes().iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    const TOKEN_HEADER: &str = "x-402-payment-token";

    async fn spawn_app(config: Config) -> (String, Arc<MetricsCounters>) {
        let server = WebServer::new(Arc::new(config)).unwrap();
        let metrics = server.metrics();
        let app = server.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), metrics)
    }

    async fn post_reputation(
        base: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> reqwest::Response {
        let mut req = reqwest::Client::new()
            .post(format!("{}/get-reputation", base))
            .json(&body);
        if let Some(t) = token {
            req = req.header(TOKEN_HEADER, t);
        }
        req.send().await.unwrap()
    }

    #[tokio::test]
    async fn test_root_returns_payment_metadata() {
        let (base, _) = spawn_app(Config::default()).await;
        let body: serde_json::Value = reqwest::get(format!("{}/", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["payment_protocol"], "x402");
        assert_eq!(body["payment_address"], "0x53e585d65a6DE5ac14C09774C9844B4909Fb8cFD");
        assert_eq!(body["price_per_query_usdc"], "0.05");
        assert_eq!(body["message"], "Bem-vindo à Agent Trust & Reputation API!");
    }

    #[tokio::test]
    async fn test_strong_agent_is_scored() {
        let (base, metrics) = spawn_app(Config::default()).await;
        let resp = post_reputation(
            &base,
            Some("tok-123"),
            serde_json::json!({
                "agent_id": "agent-good",
                "moltbook_activity_score": 80,
                "transaction_volume_usd": 1500.0,
                "age_in_days": 500,
                "positive_feedback_count": 20,
                "negative_feedback_count": 0,
                "x402_payments_made": 10,
                "x402_payments_received": 15,
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ReputationResponse = resp.json().await.unwrap();
        assert_eq!(body.agent_id, "agent-good");
        assert_eq!(body.reputation_score, 84);
        assert_eq!(body.trust_level, "Muito Alto");
        assert_eq!(body.status, "success");
        assert!(body.payment_confirmed);
        assert_eq!(metrics.scored_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.tier_very_high.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_whole_float_counts_are_scored() {
        let (base, _) = spawn_app(Config::default()).await;
        let resp = post_reputation(
            &base,
            Some("tok-123"),
            serde_json::json!({
                "agent_id": "agent-good",
                "moltbook_activity_score": 80.0,
                "transaction_volume_usd": 1500.0,
                "age_in_days": 500.0,
                "positive_feedback_count": 20.0,
                "negative_feedback_count": 0.0,
                "x402_payments_made": 10.0,
                "x402_payments_received": 15.0,
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ReputationResponse = resp.json().await.unwrap();
        assert_eq!(body.reputation_score, 84);
        assert_eq!(body.trust_level, "Muito Alto");
    }

    #[tokio::test]
    async fn test_minimal_body_uses_defaults() {
        let (base, _) = spawn_app(Config::default()).await;
        let resp = post_reputation(&base, Some("tok"), serde_json::json!({"agent_id": "new-agent"})).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ReputationResponse = resp.json().await.unwrap();
        assert_eq!(body.reputation_score, 0);
        assert_eq!(body.trust_level, "Baixo");
    }

    #[tokio::test]
    async fn test_penalty_clamps_to_zero() {
        let (base, _) = spawn_app(Config::default()).await;
        let resp = post_reputation(
            &base,
            Some("tok"),
            serde_json::json!({
                "agent_id": "agent-bad",
                "moltbook_activity_score": 10,
                "transaction_volume_usd": 50.0,
                "age_in_days": 30,
                "positive_feedback_count": 1,
                "negative_feedback_count": 5,
            }),
        )
        .await;
        let body: ReputationResponse = resp.json().await.unwrap();
        assert_eq!(body.reputation_score, 0);
        assert_eq!(body.trust_level, "Baixo");
    }

    #[tokio::test]
    async fn test_missing_payment_is_rejected_before_scoring() {
        let (base, metrics) = spawn_app(Config::default()).await;
        let resp = post_reputation(&base, None, serde_json::json!({"agent_id": "agent-1"})).await;
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

        let body: serde_json::Value = resp.json().await.unwrap();
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Pagamento Necessário."));
        assert!(detail.contains("0.05 USDC"));
        assert!(detail.contains("0x53e585d65a6DE5ac14C09774C9844B4909Fb8cFD"));

        assert_eq!(metrics.payment_required_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.scored_total.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_blank_payment_token_is_rejected() {
        let (base, _) = spawn_app(Config::default()).await;
        let resp = post_reputation(&base, Some(""), serde_json::json!({"agent_id": "agent-1"})).await;
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_payment_checked_before_body() {
        let (base, metrics) = spawn_app(Config::default()).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/get-reputation", base))
            .header(header::CONTENT_TYPE.as_str(), "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(metrics.invalid_requests_total.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_unprocessable() {
        let (base, metrics) = spawn_app(Config::default()).await;

        let resp = post_reputation(
            &base,
            Some("tok"),
            serde_json::json!({"agent_id": "a", "age_in_days": "ancient"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["detail"].is_string());

        let resp = post_reputation(&base, Some("tok"), serde_json::json!({"age_in_days": 10})).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = post_reputation(&base, Some("tok"), serde_json::json!({"agent_id": ""})).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(metrics.invalid_requests_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.scored_total.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_custom_payment_header() {
        let mut config = Config::default();
        config.payment.header = "X-Payment".to_string();
        let (base, _) = spawn_app(config).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/get-reputation", base))
            .header("x-payment", "proof")
            .json(&serde_json::json!({"agent_id": "a"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = post_reputation(&base, Some("proof"), serde_json::json!({"agent_id": "a"})).await;
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (base, _) = spawn_app(Config::default()).await;
        post_reputation(&base, None, serde_json::json!({"agent_id": "a"})).await;
        post_reputation(&base, Some("t"), serde_json::json!({"agent_id": "a"})).await;

        let text = reqwest::get(format!("{}/metrics", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("agent_trust_requests_total 2"));
        assert!(text.contains("agent_trust_rejections_total{reason=\"payment_required\"} 1"));
        assert!(text.contains("agent_trust_tier_total{tier=\"low\"} 1"));

        let stats: serde_json::Value = reqwest::get(format!("{}/api/stats", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["scored_total"], 1);
    }

    #[tokio::test]
    async fn test_metrics_can_be_disabled() {
        let mut config = Config::default();
        config.web.metrics = false;
        let (base, _) = spawn_app(config).await;
        let resp = reqwest::get(format!("{}/metrics", base)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_header_name_fails_startup() {
        let mut config = Config::default();
        config.payment.header = "bad header".to_string();
        assert!(WebServer::new(Arc::new(config)).is_err());
    }
}
