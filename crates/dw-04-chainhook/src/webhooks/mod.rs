//! # Webhook Service Plumbing
//!
//! A webhook is a parser plus a handler. The service combinator owns the
//! propagation policy: parse failures reject the payload (the outer
//! surface answers 4xx), handler results always produce a response (2xx)
//! so upstream delivery never storms on retries.

use crate::dispatch::ChainhookDispatcher;
use crate::errors::{HandlerError, ParseError};
use crate::models::ChainhookPayload;
use crate::parser::ChainhookParser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

pub mod dao;

pub use dao::{DaoWebhookPayload, DaoWebhookResponse, DaoWebhookService};

/// Parses a raw webhook body into a typed payload.
pub trait WebhookParser: Send + Sync {
    type Output: Send;

    fn parse(&self, raw: &Value) -> Result<Self::Output, ParseError>;
}

/// Handles a parsed webhook payload.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    type Input: Send + Sync;

    async fn handle(&self, input: Self::Input) -> Result<Value, HandlerError>;
}

/// Response surfaced to the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Coordinates parsing and handling of one webhook kind.
pub struct WebhookService<P, H> {
    parser: P,
    handler: H,
}

impl<P, H> WebhookService<P, H>
where
    P: WebhookParser,
    H: WebhookHandler<Input = P::Output>,
{
    #[must_use]
    pub fn new(parser: P, handler: H) -> Self {
        Self { parser, handler }
    }

    /// Process one delivery. `Err` only on parse failures.
    pub async fn process(&self, raw: &Value) -> Result<WebhookResponse, ParseError> {
        let parsed = self.parser.parse(raw)?;
        match self.handler.handle(parsed).await {
            Ok(data) => Ok(WebhookResponse {
                success: true,
                message: "processed".to_string(),
                data: Some(data),
            }),
            Err(err) => {
                error!(error = %err, "webhook handler failed");
                Ok(WebhookResponse {
                    success: false,
                    message: err.to_string(),
                    data: None,
                })
            }
        }
    }
}

impl WebhookParser for ChainhookParser {
    type Output = ChainhookPayload;

    fn parse(&self, raw: &Value) -> Result<Self::Output, ParseError> {
        ChainhookParser::parse(self, raw)
    }
}

struct DispatchingHandler {
    dispatcher: Arc<ChainhookDispatcher>,
}

#[async_trait]
impl WebhookHandler for DispatchingHandler {
    type Input = ChainhookPayload;

    async fn handle(&self, input: ChainhookPayload) -> Result<Value, HandlerError> {
        let summary = self.dispatcher.dispatch(&input).await;
        serde_json::to_value(summary).map_err(|e| HandlerError::Other(e.to_string()))
    }
}

/// The chainhook ingestion service: parse, then dispatch.
pub struct ChainhookService {
    inner: WebhookService<ChainhookParser, DispatchingHandler>,
}

impl ChainhookService {
    #[must_use]
    pub fn new(dispatcher: Arc<ChainhookDispatcher>) -> Self {
        Self {
            inner: WebhookService::new(ChainhookParser::new(), DispatchingHandler { dispatcher }),
        }
    }

    /// Process one chainhook delivery.
    pub async fn process(&self, raw: &Value) -> Result<WebhookResponse, ParseError> {
        self.inner.process(raw).await
    }
}
