//! Action dispatcher — routes action requests to the right platform client
//! and writes exactly one ledger entry per attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use adlens_core::config::DispatchConfig;
use adlens_core::error::{EngineError, EngineResult};
use adlens_core::ports::PlatformClient;
use adlens_core::rules::{ActionLogEntry, ActionOutcome, ActionType};
use adlens_core::types::{AdPlatform, EntityStatus, EntityType};

use crate::ledger::ActionLog;

/// One concrete action to execute against a platform entity.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub entity_id: Uuid,
    pub platform_entity_id: String,
    pub platform: AdPlatform,
    pub entity_type: EntityType,
    pub action: ActionType,
    pub params: Value,
    pub suggestion_id: Option<Uuid>,
}

pub struct ActionDispatcher {
    clients: HashMap<AdPlatform, Arc<dyn PlatformClient>>,
    ledger: Arc<ActionLog>,
    config: DispatchConfig,
}

impl ActionDispatcher {
    pub fn new(
        clients: Vec<Arc<dyn PlatformClient>>,
        ledger: Arc<ActionLog>,
        config: DispatchConfig,
    ) -> Self {
        let clients = clients.into_iter().map(|c| (c.platform(), c)).collect();
        Self {
            clients,
            ledger,
            config,
        }
    }

    /// Execute one action. Always returns the outcome and always appends
    /// exactly one ledger entry, whether the call succeeded, failed, or the
    /// platform is not registered at all.
    pub async fn dispatch(&self, request: &ActionRequest) -> EngineResult<ActionOutcome> {
        let outcome = match self.clients.get(&request.platform) {
            Some(client) => match self.call(client.as_ref(), request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        entity_id = %request.entity_id,
                        platform = %request.platform,
                        action = %request.action,
                        error = %err,
                        "Platform call failed"
                    );
                    ActionOutcome::failed(err.to_string())
                }
            },
            None => {
                warn!(
                    platform = %request.platform,
                    "No client registered for platform"
                );
                ActionOutcome::failed(
                    EngineError::UnsupportedPlatform(request.platform.to_string()).to_string(),
                )
            }
        };

        if outcome.success {
            metrics::counter!("actions.succeeded").increment(1);
        } else {
            metrics::counter!("actions.failed").increment(1);
        }

        self.ledger.append(ActionLogEntry {
            id: Uuid::new_v4(),
            entity_id: request.entity_id,
            platform_entity_id: request.platform_entity_id.clone(),
            platform: request.platform,
            entity_type: request.entity_type,
            action: request.action,
            params: request.params.clone(),
            success: outcome.success,
            message: outcome.message.clone(),
            suggestion_id: request.suggestion_id,
            executed_at: Utc::now(),
        });

        info!(
            entity_id = %request.entity_id,
            action = %request.action,
            success = outcome.success,
            "Action dispatched"
        );

        Ok(outcome)
    }

    /// Dispatch a batch with a fixed inter-call delay so platform rate
    /// limits are never hit by a burst. The batch is truncated to the
    /// configured maximum.
    pub async fn dispatch_batch(&self, requests: &[ActionRequest]) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len().min(self.config.max_batch));
        for (i, request) in requests.iter().take(self.config.max_batch).enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_call_delay_ms)).await;
            }
            match self.dispatch(request).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => outcomes.push(ActionOutcome::failed(err.to_string())),
            }
        }
        outcomes
    }

    async fn call(
        &self,
        client: &dyn PlatformClient,
        request: &ActionRequest,
    ) -> EngineResult<ActionOutcome> {
        match request.action {
            ActionType::IncreaseBudget | ActionType::DecreaseBudget => {
                let new_budget = request
                    .params
                    .get("new_budget")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| {
                        EngineError::Validation(
                            "budget actions require a numeric new_budget parameter".to_string(),
                        )
                    })?;
                client
                    .update_budget(request.entity_type, &request.platform_entity_id, new_budget)
                    .await
            }
            ActionType::Pause => {
                client
                    .set_status(
                        request.entity_type,
                        &request.platform_entity_id,
                        EntityStatus::Paused,
                    )
                    .await
            }
            ActionType::Duplicate => {
                client
                    .duplicate(
                        request.entity_type,
                        &request.platform_entity_id,
                        &request.params,
                    )
                    .await
            }
            ActionType::AdjustTargeting => {
                client
                    .adjust_targeting(
                        request.entity_type,
                        &request.platform_entity_id,
                        &request.params,
                    )
                    .await
            }
        }
    }
}
