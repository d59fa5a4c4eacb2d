//! Drives one item through the fixed stage sequence, resuming from whatever
//! the store says has already been committed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use reloom_core::config::PipelineConfig;
use reloom_core::{
    best_strategy_index, rank_strategies, season_for, InventoryItem, ItemId, ItemStatus,
    SustainabilityMetrics,
};
use reloom_db::{ItemPatch, ItemStore, StoreError};

use crate::adapters::{KnowledgeAdapter, ReasoningAdapter, VisionAdapter};
use crate::retry::{Retryable, RetryError, RetryExecutor, RetryPolicy};
use crate::stages::{market, strategy, vision, StageError};

impl Retryable for StoreError {
    fn is_transient(&self) -> bool {
        // A status conflict is resolved by reloading, not by re-issuing the
        // same write.
        matches!(self, StoreError::Database(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Vision,
    Market,
    Strategy,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Market => "market",
            Self::Strategy => "strategy",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("{stage} stage failed: {source}")]
    Stage { stage: Stage, source: StageError },
    #[error("pipeline exceeded its {deadline_secs}s deadline")]
    Timeout { deadline_secs: u64 },
    #[error("gave up on item {id} after {reloads} status-conflict reloads")]
    ConflictBudgetExhausted { id: ItemId, reloads: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Copy, Debug)]
pub struct OrchestratorSettings {
    pub retry: RetryPolicy,
    pub deadline: Duration,
    pub confidence_threshold: f64,
    pub conflict_reload_limit: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            deadline: Duration::from_secs(120),
            confidence_threshold: 70.0,
            conflict_reload_limit: 3,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            deadline: Duration::from_secs(config.deadline_secs.max(1)),
            confidence_threshold: config.confidence_threshold,
            conflict_reload_limit: config.conflict_reload_limit,
        }
    }
}

/// A phase either advances the stored record, loses a status race (reload
/// and re-evaluate), or ends the run.
enum PhaseError {
    Conflict,
    Terminal(OrchestrationError),
}

pub struct Orchestrator {
    store: Arc<dyn ItemStore>,
    vision: Arc<dyn VisionAdapter>,
    knowledge: Arc<dyn KnowledgeAdapter>,
    reasoning: Arc<dyn ReasoningAdapter>,
    retry: RetryExecutor,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ItemStore>,
        vision: Arc<dyn VisionAdapter>,
        knowledge: Arc<dyn KnowledgeAdapter>,
        reasoning: Arc<dyn ReasoningAdapter>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            vision,
            knowledge,
            reasoning,
            retry: RetryExecutor::new(settings.retry),
            settings,
        }
    }

    /// Detached invocation: returns immediately and leaves the caller to
    /// observe progress by re-reading the persisted record. The join handle
    /// is for supervisors that want the final outcome; dropping it does not
    /// cancel the run.
    pub fn spawn(
        self: Arc<Self>,
        id: ItemId,
    ) -> tokio::task::JoinHandle<Result<InventoryItem, OrchestrationError>> {
        tokio::spawn(async move { self.run(&id).await })
    }

    /// Runs the pipeline for one item. Re-entrant: stages whose output is
    /// already persisted are skipped, and a terminal item is returned as-is.
    pub async fn run(&self, id: &ItemId) -> Result<InventoryItem, OrchestrationError> {
        match tokio::time::timeout(self.settings.deadline, self.drive(id)).await {
            Ok(result) => result,
            Err(_) => {
                let deadline_secs = self.settings.deadline.as_secs();
                error!(
                    event_name = "pipeline.deadline_exceeded",
                    item_id = %id,
                    deadline_secs,
                    "abandoning in-flight stage"
                );
                self.mark_failed_best_effort(
                    id,
                    format!("pipeline deadline of {deadline_secs}s exceeded"),
                )
                .await;
                Err(OrchestrationError::Timeout { deadline_secs })
            }
        }
    }

    async fn drive(&self, id: &ItemId) -> Result<InventoryItem, OrchestrationError> {
        let mut conflict_reloads = 0u32;

        loop {
            let item = self
                .store
                .fetch(id)
                .await?
                .ok_or_else(|| OrchestrationError::ItemNotFound(id.clone()))?;

            let outcome = match item.status {
                ItemStatus::Completed | ItemStatus::Failed => return Ok(item),
                ItemStatus::Pending => self.vision_phase(&item).await,
                ItemStatus::AttributesExtracted => self.market_phase(&item).await,
                ItemStatus::MarketAnalyzed => self.strategy_phase(&item).await,
            };

            match outcome {
                Ok(()) => {}
                Err(PhaseError::Conflict) => {
                    conflict_reloads += 1;
                    if conflict_reloads > self.settings.conflict_reload_limit {
                        return Err(OrchestrationError::ConflictBudgetExhausted {
                            id: id.clone(),
                            reloads: conflict_reloads,
                        });
                    }
                    warn!(
                        event_name = "pipeline.status_conflict",
                        item_id = %id,
                        reload = conflict_reloads,
                        "stored status moved underneath this run, reloading"
                    );
                }
                Err(PhaseError::Terminal(error)) => return Err(error),
            }
        }
    }

    async fn vision_phase(&self, item: &InventoryItem) -> Result<(), PhaseError> {
        let result = vision::extract_attributes(
            self.vision.as_ref(),
            &self.retry,
            &item.input.image_ref,
            self.settings.confidence_threshold,
        )
        .await;

        match result {
            Ok(attributes) => {
                self.commit(item, Stage::Vision, ItemPatch::attributes_extracted(attributes, Utc::now()))
                    .await
            }
            Err(stage_error) => self.fail(item, Stage::Vision, stage_error).await,
        }
    }

    async fn market_phase(&self, item: &InventoryItem) -> Result<(), PhaseError> {
        let Some(attributes) = item.attributes.as_ref() else {
            return self
                .fail(
                    item,
                    Stage::Market,
                    StageError::MalformedResponse {
                        service: "store".to_string(),
                        reason: "attributes missing for an attributes_extracted item".to_string(),
                    },
                )
                .await;
        };

        let season = season_for(Utc::now());
        let (snapshot, trend_source) = market::fetch_trend_snapshot(
            self.knowledge.as_ref(),
            &self.retry,
            &item.input.category,
            &item.input.region,
            season,
        )
        .await;

        let result = market::analyze_market(
            self.reasoning.as_ref(),
            &self.retry,
            attributes,
            &item.input,
            season,
            &snapshot,
            trend_source,
        )
        .await;

        match result {
            Ok(analysis) => {
                self.commit(item, Stage::Market, ItemPatch::market_analyzed(analysis, Utc::now()))
                    .await
            }
            Err(stage_error) => self.fail(item, Stage::Market, stage_error).await,
        }
    }

    async fn strategy_phase(&self, item: &InventoryItem) -> Result<(), PhaseError> {
        let (Some(attributes), Some(analysis)) =
            (item.attributes.as_ref(), item.market_analysis.as_ref())
        else {
            return self
                .fail(
                    item,
                    Stage::Strategy,
                    StageError::MalformedResponse {
                        service: "store".to_string(),
                        reason: "earlier stage output missing for a market_analyzed item"
                            .to_string(),
                    },
                )
                .await;
        };

        // Conversion factors ride on the trend snapshot; a resumed run
        // re-fetches them here under the same fallback policy.
        let season = season_for(Utc::now());
        let (snapshot, _) = market::fetch_trend_snapshot(
            self.knowledge.as_ref(),
            &self.retry,
            &item.input.category,
            &item.input.region,
            season,
        )
        .await;

        let result = strategy::generate_strategies(
            self.reasoning.as_ref(),
            &self.retry,
            attributes,
            analysis,
            &item.input,
            &snapshot.conversion_factors,
        )
        .await;

        match result {
            Ok(strategies) => {
                let ranked = rank_strategies(strategies);
                let total = SustainabilityMetrics::aggregate(ranked.iter().map(|s| &s.sustainability));
                let best = best_strategy_index(&ranked).unwrap_or(0);
                self.commit(
                    item,
                    Stage::Strategy,
                    ItemPatch::completed(ranked, best, total, Utc::now()),
                )
                .await
            }
            Err(stage_error) => self.fail(item, Stage::Strategy, stage_error).await,
        }
    }

    /// Conditional write through the same retry discipline as every other
    /// external call.
    async fn apply_patch(
        &self,
        item: &InventoryItem,
        patch: ItemPatch,
    ) -> Result<InventoryItem, RetryError<StoreError>> {
        self.retry
            .execute("store.apply", || self.store.apply(&item.id, item.status, patch.clone()))
            .await
    }

    async fn commit(
        &self,
        item: &InventoryItem,
        stage: Stage,
        patch: ItemPatch,
    ) -> Result<(), PhaseError> {
        match self.apply_patch(item, patch).await {
            Ok(updated) => {
                info!(
                    event_name = "pipeline.stage_completed",
                    item_id = %item.id,
                    stage = %stage,
                    status = %updated.status,
                    "stage output committed"
                );
                Ok(())
            }
            Err(RetryError::Fatal { error: StoreError::StatusConflict { .. }, .. }) => {
                Err(PhaseError::Conflict)
            }
            Err(RetryError::Fatal { error, .. }) | Err(RetryError::Exhausted { last_error: error, .. }) => {
                Err(PhaseError::Terminal(error.into()))
            }
        }
    }

    async fn fail(
        &self,
        item: &InventoryItem,
        stage: Stage,
        stage_error: StageError,
    ) -> Result<(), PhaseError> {
        error!(
            event_name = "pipeline.item_failed",
            item_id = %item.id,
            stage = %stage,
            error = %stage_error,
            "non-retryable stage failure, marking item failed"
        );

        let message = format!("{stage} stage failed: {stage_error}");
        match self.apply_patch(item, ItemPatch::failed(message, Utc::now())).await {
            Ok(_) => Err(PhaseError::Terminal(OrchestrationError::Stage {
                stage,
                source: stage_error,
            })),
            // Another invocation advanced the item first; its state wins.
            Err(RetryError::Fatal { error: StoreError::StatusConflict { .. }, .. }) => {
                Err(PhaseError::Conflict)
            }
            Err(RetryError::Fatal { error, .. }) | Err(RetryError::Exhausted { last_error: error, .. }) => {
                Err(PhaseError::Terminal(error.into()))
            }
        }
    }

    async fn mark_failed_best_effort(&self, id: &ItemId, message: String) {
        let current = match self.store.fetch(id).await {
            Ok(Some(item)) if !item.status.is_terminal() => item,
            Ok(_) => return,
            Err(error) => {
                warn!(
                    event_name = "pipeline.failure_write_skipped",
                    item_id = %id,
                    error = %error,
                    "could not load item while recording timeout"
                );
                return;
            }
        };

        if let Err(error) =
            self.store.apply(id, current.status, ItemPatch::failed(message, Utc::now())).await
        {
            warn!(
                event_name = "pipeline.failure_write_skipped",
                item_id = %id,
                error = %error,
                "could not record timeout failure"
            );
        }
    }
}
