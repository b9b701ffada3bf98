//! # Application Context
//!
//! Explicit wiring of every subsystem: store, chain client, dispatcher
//! with the handler chain, webhook services, task registry, executor,
//! and scheduler. No globals; tests build their own context with
//! injected adapters.

use crate::config::RuntimeConfig;
use dw_01_store_gateway::{MemoryStore, Store};
use dw_02_chain_client::{ChainApi, ChainApiError, HttpChainApi, WebhookSink};
use dw_03_job_engine::{
    DeadLetterQueue, JobExecutor, MetricsRegistry, RegistryError, Scheduler, TaskRegistry,
};
use dw_04_chainhook::handlers::{
    ActionConcluderHandler, BlockStateHandler, BuyEventHandler, ProposalBurnHeightHandler,
    ProposalConcludeHandler, ProposalCreateHandler, ProposalVoteHandler, SellEventHandler,
    TradesConfig,
};
use dw_04_chainhook::{ChainhookDispatcher, ChainhookService, DaoWebhookService, EventHandler};
use dw_05_chain_monitor::{
    ChainStateMonitorTask, Evaluator, MonitorConfig, ProposalEvaluatorTask,
};
use shared_types::StoreError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Failures that abort startup with a non-zero exit.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("task registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("unknown task type explicitly enabled: {0}")]
    UnknownTaskEnabled(String),

    #[error("store unreachable: {0}")]
    StoreUnreachable(StoreError),

    #[error("chain client initialization failed: {0}")]
    ChainClient(#[from] ChainApiError),

    #[error("shutdown failed: {0}")]
    Shutdown(String),
}

/// Builder over [`AppContext`] allowing adapter injection.
pub struct AppContextBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn Store>>,
    chain: Option<Arc<dyn ChainApi>>,
    evaluator: Option<Arc<dyn Evaluator>>,
    trades: TradesConfig,
}

impl AppContextBuilder {
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            store: None,
            chain: None,
            evaluator: None,
            trades: TradesConfig::default(),
        }
    }

    /// Use a specific store adapter (defaults to the in-memory store).
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a specific chain adapter (defaults to HTTP per network).
    #[must_use]
    pub fn with_chain(mut self, chain: Arc<dyn ChainApi>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Provide an evaluator; registers the proposal evaluator task.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Override bonding-curve trade matching.
    #[must_use]
    pub fn with_trades_config(mut self, trades: TradesConfig) -> Self {
        self.trades = trades;
        self
    }

    /// Wire everything together.
    pub fn build(self) -> Result<AppContext, StartupError> {
        let config = self.config;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn Store>);
        let chain: Arc<dyn ChainApi> = match self.chain {
            Some(chain) => chain,
            None => {
                let http = match &config.chain_api_url {
                    Some(url) => HttpChainApi::new(url.clone())?,
                    None => HttpChainApi::for_network(config.network)?,
                };
                Arc::new(http)
            }
        };

        // Handler chain; registration order is dispatch order.
        let handlers: Vec<Arc<dyn EventHandler>> = vec![
            Arc::new(ProposalCreateHandler::new(Arc::clone(&store))),
            Arc::new(ProposalVoteHandler::new(Arc::clone(&store))),
            Arc::new(ProposalConcludeHandler::new(Arc::clone(&store))),
            Arc::new(ProposalBurnHeightHandler::new(Arc::clone(&store))),
            Arc::new(BuyEventHandler::new(Arc::clone(&store), self.trades.clone())),
            Arc::new(SellEventHandler::new(Arc::clone(&store), self.trades)),
            Arc::new(ActionConcluderHandler::new(Arc::clone(&store))),
            Arc::new(BlockStateHandler::new(Arc::clone(&store), config.network)),
        ];
        let dispatcher = Arc::new(ChainhookDispatcher::new(handlers));
        let chainhook = Arc::new(ChainhookService::new(Arc::clone(&dispatcher)));
        let dao_webhook = Arc::new(DaoWebhookService::new(Arc::clone(&store)));

        let metrics = Arc::new(MetricsRegistry::new());
        let dead_letters = Arc::new(DeadLetterQueue::new());
        let executor = Arc::new(JobExecutor::new(metrics, dead_letters));
        let registry = Arc::new(TaskRegistry::new());

        let monitor_config = MonitorConfig {
            network: config.network,
            stale_threshold_blocks: config.stale_threshold_blocks,
            stale_threshold_minutes: config.stale_threshold_minutes,
        };
        registry.register(
            ChainStateMonitorTask::metadata(),
            Arc::new(ChainStateMonitorTask::new(
                Arc::clone(&store),
                Arc::clone(&chain),
                Arc::clone(&dispatcher),
                monitor_config,
            )),
        )?;
        if let Some(evaluator) = self.evaluator {
            registry.register(
                ProposalEvaluatorTask::metadata(),
                Arc::new(ProposalEvaluatorTask::new(Arc::clone(&store), evaluator)),
            )?;
        }

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&executor),
            config.jobs.clone(),
        ));

        Ok(AppContext {
            config,
            store,
            chain,
            dispatcher,
            chainhook,
            dao_webhook,
            registry,
            executor,
            scheduler,
        })
    }
}

/// The wired application.
pub struct AppContext {
    pub config: RuntimeConfig,
    pub store: Arc<dyn Store>,
    pub chain: Arc<dyn ChainApi>,
    pub dispatcher: Arc<ChainhookDispatcher>,
    /// Chainhook ingress, exposed to the outer HTTP surface.
    pub chainhook: Arc<ChainhookService>,
    /// DAO-creation ingress, exposed to the outer HTTP surface.
    pub dao_webhook: Arc<DaoWebhookService>,
    pub registry: Arc<TaskRegistry>,
    pub executor: Arc<JobExecutor>,
    pub scheduler: Arc<Scheduler>,
}

impl AppContext {
    /// Delivery sink for outbound chainhook registration, when both
    /// `WEBHOOK_URL` and `WEBHOOK_AUTH` are configured.
    #[must_use]
    pub fn webhook_sink(&self) -> Option<WebhookSink> {
        match (&self.config.webhook_url, &self.config.webhook_auth) {
            (Some(url), Some(auth)) => Some(WebhookSink {
                url: url.clone(),
                auth_header: auth.clone(),
            }),
            _ => None,
        }
    }

    /// Startup validation; failures abort the process.
    pub async fn validate(&self) -> Result<(), StartupError> {
        self.store
            .healthcheck()
            .await
            .map_err(StartupError::StoreUnreachable)?;

        let known = self.registry.task_types();
        let known_refs: Vec<&str> = known.iter().map(String::as_str).collect();
        for (task_type, explicitly_enabled) in self.config.jobs.unknown_types(&known_refs) {
            if explicitly_enabled {
                return Err(StartupError::UnknownTaskEnabled(task_type.to_string()));
            }
            warn!(task_type, "configuration references unknown task type");
        }

        info!(
            network = %self.config.network,
            tasks = known.len(),
            handlers = self.dispatcher.handler_count(),
            "startup validation passed"
        );
        Ok(())
    }

    /// Run until ctrl-c, then drain the scheduler.
    pub async fn run(&self) -> Result<(), StartupError> {
        self.validate().await?;

        let scheduler = Arc::clone(&self.scheduler);
        let scheduler_handle = tokio::spawn(scheduler.run());

        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received, draining");
        self.scheduler.shutdown();
        scheduler_handle
            .await
            .map_err(|e| StartupError::Shutdown(e.to_string()))?;
        Ok(())
    }
}
