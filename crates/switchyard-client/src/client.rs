use std::pin::Pin;

use futures::stream::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use switchyard_core::{
    ChainAnalytics, FallbackChainConfig, Provider, RoutingStrategy, StrategyDescriptor, UpdateEvent,
};
use url::Url;

use crate::error::{ClientError, Result};
use crate::sse::parse_update_stream;
use crate::types::{
    OptimizeProposal, OutcomeReport, RegisterProvider, RouteDecision, RouteRequest, SaveChain, TestReport,
};

/// Live update events as they arrive
pub type EventStream = Pin<Box<dyn Stream<Item = Result<UpdateEvent>> + Send>>;

/// Typed client for a switchyard server
#[derive(Debug, Clone)]
pub struct SwitchyardClient {
    base_url: Url,
    http: reqwest::Client,
}

impl SwitchyardClient {
    /// Create a new client pointing at the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::Config(format!("invalid base URL: {e}")))?;

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    // -- Providers --

    /// Every provider with its current health
    pub async fn providers(&self) -> Result<Vec<Provider>> {
        self.get_json("/v1/providers").await
    }

    /// Add a provider to the running catalog
    pub async fn register_provider(&self, provider: &RegisterProvider) -> Result<Provider> {
        self.post_json("/v1/providers", provider).await
    }

    /// Providers not yet in the chain of `primary`
    pub async fn available_providers(&self, primary: &str) -> Result<Vec<Provider>> {
        let mut url = self.url("/v1/providers/available");
        url.query_pairs_mut().append_pair("primary", primary);
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    /// Report the outcome of a provider call
    pub async fn record_outcome(&self, provider: &str, outcome: &OutcomeReport) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/v1/providers/{provider}/outcomes")))
            .json(outcome)
            .send()
            .await?;
        handle_error(response).await?;
        Ok(())
    }

    /// Trigger a test call against a provider
    pub async fn test_provider(&self, provider: &str, sample_message: Option<&str>) -> Result<TestReport> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            sample_message: Option<&'a str>,
        }

        self.post_json(&format!("/v1/providers/{provider}/test"), &Body { sample_message })
            .await
    }

    // -- Chains --

    pub async fn strategies(&self) -> Result<Vec<StrategyDescriptor>> {
        self.get_json("/v1/strategies").await
    }

    pub async fn chains(&self) -> Result<Vec<FallbackChainConfig>> {
        self.get_json("/v1/chains").await
    }

    pub async fn chain(&self, primary: &str) -> Result<FallbackChainConfig> {
        self.get_json(&format!("/v1/chains/{primary}")).await
    }

    /// Validate and save a chain
    ///
    /// A `primary_offline_warning` API error means the chain was not saved;
    /// resubmit with `allow_offline_primary` to override it.
    pub async fn save_chain(&self, primary: &str, chain: &SaveChain) -> Result<FallbackChainConfig> {
        let response = self
            .http
            .put(self.url(&format!("/v1/chains/{primary}")))
            .json(chain)
            .send()
            .await?;
        decode(response).await
    }

    /// Propose weights for a chain without saving them
    pub async fn optimize(&self, primary: &str, strategy: Option<RoutingStrategy>) -> Result<OptimizeProposal> {
        #[derive(Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            strategy: Option<RoutingStrategy>,
        }

        self.post_json(&format!("/v1/chains/{primary}/optimize"), &Body { strategy })
            .await
    }

    pub async fn analytics(&self, primary: &str) -> Result<ChainAnalytics> {
        self.get_json(&format!("/v1/chains/{primary}/analytics")).await
    }

    // -- Routing --

    /// Ask the engine to pick a provider
    pub async fn route(&self, request: &RouteRequest) -> Result<RouteDecision> {
        self.post_json("/v1/route", request).await
    }

    // -- Updates --

    /// Open the live update stream
    ///
    /// Resolves once the server has accepted the subscription.
    pub async fn subscribe(&self) -> Result<EventStream> {
        let response = self
            .http
            .get(self.url("/v1/events"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = handle_error(response).await?;

        Ok(Box::pin(parse_update_stream(response.bytes_stream())))
    }

    fn url(&self, path: &str) -> Url {
        make_url(&self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }
}

/// Build a full URL from the base and a path
fn make_url(base_url: &Url, path: &str) -> Url {
    let mut url = base_url.clone();
    let prefix = base_url.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{path}"));
    url
}

/// Check an HTTP response for errors and decode its JSON body
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = handle_error(response).await?;
    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

/// Check an HTTP response for errors
async fn handle_error(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error_type, message) = parse_error_body(&body);

    Err(ClientError::Api {
        status: status.as_u16(),
        error_type,
        message,
    })
}

/// Parse an error response body into (type, message)
fn parse_error_body(body: &str) -> (String, String) {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &json["error"];
        let error_type = error["type"].as_str().unwrap_or("unknown").to_owned();
        let message = error["message"].as_str().unwrap_or(body).to_owned();
        (error_type, message)
    } else {
        ("unknown".to_owned(), body.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_keep_base_path() {
        let base = Url::parse("http://localhost:3000/switchyard/").unwrap();
        assert_eq!(
            make_url(&base, "/v1/chains/openai").as_str(),
            "http://localhost:3000/switchyard/v1/chains/openai"
        );

        let base = Url::parse("http://localhost:3000").unwrap();
        assert_eq!(make_url(&base, "/v1/route").as_str(), "http://localhost:3000/v1/route");
    }

    #[test]
    fn error_bodies_are_parsed() {
        let (error_type, message) =
            parse_error_body(r#"{"error": {"type": "primary_offline_warning", "message": "primary provider openai is offline"}}"#);
        assert_eq!(error_type, "primary_offline_warning");
        assert_eq!(message, "primary provider openai is offline");

        let (error_type, message) = parse_error_body("bad gateway");
        assert_eq!(error_type, "unknown");
        assert_eq!(message, "bad gateway");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(SwitchyardClient::new("not a url"), Err(ClientError::Config(_))));
    }
}
