//! Platform client implementations. Each client translates the internal
//! action vocabulary to one platform's management API.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use adlens_core::error::EngineResult;
use adlens_core::ports::PlatformClient;
use adlens_core::rules::ActionOutcome;
use adlens_core::types::{AdPlatform, EntityStatus, EntityType};

// ─── Meta ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MetaClient;

#[async_trait]
impl PlatformClient for MetaClient {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Meta
    }

    async fn update_budget(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        new_budget: f64,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "meta",
            ?entity_type,
            platform_entity_id,
            new_budget,
            "Updating budget via Meta Marketing API"
        );
        // In production: POST /{id} with daily_budget in minor units
        Ok(ActionOutcome::ok(format!(
            "budget set to {:.2} on {}",
            new_budget, platform_entity_id
        )))
    }

    async fn set_status(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        status: EntityStatus,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "meta",
            ?entity_type,
            platform_entity_id,
            ?status,
            "Setting status via Meta Marketing API"
        );
        Ok(ActionOutcome::ok(format!(
            "status set to {:?} on {}",
            status, platform_entity_id
        )))
    }

    async fn duplicate(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        _params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "meta",
            ?entity_type,
            platform_entity_id,
            "Duplicating via Meta Marketing API copies endpoint"
        );
        // In production: POST /{id}/copies; the new id comes from the response
        let mut outcome = ActionOutcome::ok(format!("duplicated {}", platform_entity_id));
        outcome.new_ids.push(format!("meta-copy-{}", Uuid::new_v4()));
        Ok(outcome)
    }

    async fn adjust_targeting(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        _params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "meta",
            ?entity_type,
            platform_entity_id,
            "Adjusting targeting via Meta Marketing API"
        );
        Ok(ActionOutcome::ok(format!(
            "targeting updated on {}",
            platform_entity_id
        )))
    }
}

// ─── Google ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct GoogleClient;

#[async_trait]
impl PlatformClient for GoogleClient {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Google
    }

    async fn update_budget(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        new_budget: f64,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "google",
            ?entity_type,
            platform_entity_id,
            new_budget,
            "Updating budget via Google Ads API"
        );
        // In production: CampaignBudgetService mutate
        Ok(ActionOutcome::ok(format!(
            "budget set to {:.2} on {}",
            new_budget, platform_entity_id
        )))
    }

    async fn set_status(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        status: EntityStatus,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "google",
            ?entity_type,
            platform_entity_id,
            ?status,
            "Setting status via Google Ads API"
        );
        Ok(ActionOutcome::ok(format!(
            "status set to {:?} on {}",
            status, platform_entity_id
        )))
    }

    async fn duplicate(
        &self,
        _entity_type: EntityType,
        _platform_entity_id: &str,
        _params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome> {
        // Google Ads has no single-call copy; requires a create-from-read
        // flow this engine does not drive yet.
        Ok(ActionOutcome::not_supported("duplicate"))
    }
}

// ─── TikTok ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct TiktokClient;

#[async_trait]
impl PlatformClient for TiktokClient {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Tiktok
    }

    async fn update_budget(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        new_budget: f64,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "tiktok",
            ?entity_type,
            platform_entity_id,
            new_budget,
            "Updating budget via TikTok Business API"
        );
        Ok(ActionOutcome::ok(format!(
            "budget set to {:.2} on {}",
            new_budget, platform_entity_id
        )))
    }

    async fn set_status(
        &self,
        entity_type: EntityType,
        platform_entity_id: &str,
        status: EntityStatus,
    ) -> EngineResult<ActionOutcome> {
        debug!(
            platform = "tiktok",
            ?entity_type,
            platform_entity_id,
            ?status,
            "Setting status via TikTok Business API"
        );
        Ok(ActionOutcome::ok(format!(
            "status set to {:?} on {}",
            status, platform_entity_id
        )))
    }

    async fn duplicate(
        &self,
        _entity_type: EntityType,
        _platform_entity_id: &str,
        _params: &serde_json::Value,
    ) -> EngineResult<ActionOutcome> {
        Ok(ActionOutcome::not_supported("duplicate"))
    }
}
