//! Query, mutation and streaming endpoints

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::Stream;
use http::StatusCode;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use switchyard_config::ProviderConfig;
use switchyard_core::{
    ChainAnalytics, ChainEntry, FallbackChainConfig, Provider, RoutingStrategy, StrategyDescriptor, UpdateEvent,
    strategy_catalog,
};
use switchyard_health::{Outcome, TestResult};
use switchyard_routing::{Decision, RoutingError, SaveOptions, chain_analytics, optimize};
use url::Url;

use crate::error::ApiError;
use crate::state::AppState;

/// Routes under `/v1`
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/providers", routing::get(list_providers).post(register_provider))
        .route("/v1/providers/available", routing::get(available_providers))
        .route("/v1/providers/{name}/outcomes", routing::post(record_outcome))
        .route("/v1/providers/{name}/test", routing::post(test_provider))
        .route("/v1/strategies", routing::get(list_strategies))
        .route("/v1/chains", routing::get(list_chains))
        .route("/v1/chains/{primary}", routing::get(get_chain).put(save_chain))
        .route("/v1/chains/{primary}/optimize", routing::post(optimize_chain))
        .route("/v1/chains/{primary}/analytics", routing::get(analytics))
        .route("/v1/route", routing::post(route))
        .route("/v1/events", routing::get(events))
        .with_state(state)
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<Provider>> {
    Json(state.monitor.snapshot().iter().cloned().collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RegisterProviderRequest {
    name: String,
    cost_per_1k_tokens: f64,
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    rate_limit_rpm: Option<u32>,
    probe_model: Option<String>,
}

/// Onboard a provider at runtime
///
/// With a base URL the provider is testable at once and joins the
/// background probes; follow up with a test call to observe it.
async fn register_provider(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterProviderRequest>,
) -> Result<(StatusCode, Json<Provider>), ApiError> {
    let config = ProviderConfig {
        base_url: request.base_url,
        api_key: request.api_key,
        cost_per_1k_tokens: request.cost_per_1k_tokens,
        rate_limit_rpm: request.rate_limit_rpm,
        probe_model: request.probe_model,
    };

    let provider = state.validation.onboard(&request.name, &config)?;
    state.schedule_probes(&provider.name);

    Ok((StatusCode::CREATED, Json(provider)))
}

#[derive(Debug, Deserialize)]
struct AvailableQuery {
    primary: Option<String>,
}

/// Providers that can still be added to a primary's chain
///
/// A primary without a chain yet excludes only itself.
async fn available_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Json<Vec<Provider>> {
    let providers = match query.primary {
        Some(primary) => {
            let chain = state.store.get(&primary).map_or_else(
                || {
                    FallbackChainConfig::new(
                        &primary,
                        vec![ChainEntry::primary(&primary, 100)],
                        RoutingStrategy::default(),
                    )
                },
                |chain| FallbackChainConfig::clone(&chain),
            );
            state.store.list_available_providers(&chain)
        }
        None => state.monitor.snapshot().iter().cloned().collect(),
    };

    Json(providers)
}

/// Ingest a request-path outcome
///
/// Always accepted: malformed signals are logged and dropped so that
/// health bookkeeping never fails the caller.
async fn record_outcome(State(state): State<Arc<AppState>>, Path(name): Path<String>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Outcome>(&body) {
        Ok(outcome) => {
            state.monitor.record_outcome(&name, outcome);
        }
        Err(e) => {
            tracing::warn!(provider = %name, error = %e, "dropping unparseable outcome signal");
        }
    }

    StatusCode::ACCEPTED
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestRequest {
    sample_message: Option<String>,
}

async fn test_provider(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<TestResult>, ApiError> {
    let request: TestRequest = parse_optional(&body)?;
    let result = state
        .validation
        .test_provider(&name, request.sample_message.as_deref())
        .await?;
    Ok(Json(result))
}

async fn list_strategies() -> Json<Vec<StrategyDescriptor>> {
    Json(strategy_catalog())
}

async fn list_chains(State(state): State<Arc<AppState>>) -> Json<Vec<FallbackChainConfig>> {
    Json(
        state
            .store
            .all()
            .iter()
            .map(|chain| FallbackChainConfig::clone(chain))
            .collect(),
    )
}

async fn get_chain(
    State(state): State<Arc<AppState>>,
    Path(primary): Path<String>,
) -> Result<Json<FallbackChainConfig>, ApiError> {
    let chain = find_chain(&state, &primary)?;
    Ok(Json(FallbackChainConfig::clone(&chain)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveChainRequest {
    entries: Vec<ChainEntry>,
    #[serde(default)]
    routing_strategy: RoutingStrategy,
    #[serde(default)]
    allow_offline_primary: bool,
}

async fn save_chain(
    State(state): State<Arc<AppState>>,
    Path(primary): Path<String>,
    Json(request): Json<SaveChainRequest>,
) -> Result<Json<FallbackChainConfig>, ApiError> {
    let config = FallbackChainConfig::new(primary, request.entries, request.routing_strategy);
    let saved = state.store.validate_and_save(config, SaveOptions {
        allow_offline_primary: request.allow_offline_primary,
    })?;
    Ok(Json(FallbackChainConfig::clone(&saved)))
}

#[derive(Debug, Default, Deserialize)]
struct OptimizeRequest {
    strategy: Option<RoutingStrategy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeResponse {
    primary_provider: String,
    strategy: RoutingStrategy,
    entries: Vec<ChainEntry>,
}

/// Propose weights for a chain without saving them
async fn optimize_chain(
    State(state): State<Arc<AppState>>,
    Path(primary): Path<String>,
    body: Bytes,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let request: OptimizeRequest = parse_optional(&body)?;
    let chain = find_chain(&state, &primary)?;
    let strategy = request.strategy.unwrap_or(chain.routing_strategy);

    let entries = optimize(&chain, strategy, &state.monitor.snapshot(), &state.optimizer);

    Ok(Json(OptimizeResponse {
        primary_provider: primary,
        strategy,
        entries,
    }))
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    Path(primary): Path<String>,
) -> Result<Json<ChainAnalytics>, ApiError> {
    let chain = find_chain(&state, &primary)?;
    Ok(Json(chain_analytics(&chain, &state.monitor.snapshot())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteRequest {
    primary: String,
    #[serde(default = "default_exclude_offline")]
    exclude_offline: bool,
    strict: Option<bool>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_exclude_offline() -> bool {
    true
}

async fn route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<Decision>, ApiError> {
    let options = state.select_options(request.exclude_offline, request.strict);
    let decision = state.engine.decide(&request.primary, options)?;
    Ok(Json(decision))
}

/// Live update stream; the SSE event name is the update kind
async fn events(State(state): State<Arc<AppState>>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broadcaster.subscribe();

    let stream = futures_util::stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.next().await?;
        Some((Ok(to_sse_event(&event)), subscription))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

fn to_sse_event(event: &UpdateEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().event(event.kind().as_str()).data(data)
}

fn find_chain(state: &AppState, primary: &str) -> Result<Arc<FallbackChainConfig>, RoutingError> {
    state.store.get(primary).ok_or_else(|| RoutingError::ChainNotFound {
        primary: primary.to_owned(),
    })
}

/// Parse an optional JSON body; empty means defaults
fn parse_optional<T: for<'de> Deserialize<'de> + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))
}
