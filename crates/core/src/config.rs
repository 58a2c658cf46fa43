//! Application configuration and the hoisted heuristic policy constants.
//! Loaded from environment variables with the prefix `ADLENS__`.

use serde::Deserialize;

use crate::types::AdPlatform;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub detection: DetectionPolicy,
    #[serde(default)]
    pub projection: ProjectionPolicy,
    #[serde(default)]
    pub ranking: RankingPolicy,
    #[serde(default)]
    pub automation: AutomationDefaults,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Trailing window used when the caller does not specify one.
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,
    /// Pending suggestions older than this are transitioned to expired.
    #[serde(default = "default_suggestion_ttl_days")]
    pub suggestion_ttl_days: u32,
}

/// Every heuristic threshold used by the opportunity detector and the domain
/// analyzers. Fixed contract values; tests assert against them directly.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionPolicy {
    /// Absolute ROAS floor for a top-segment opportunity.
    #[serde(default = "default_top_min_roas")]
    pub top_min_roas: f64,
    /// Required ROAS multiple over the entity average for a top segment.
    #[serde(default = "default_top_min_multiplier")]
    pub top_min_multiplier: f64,
    /// ROAS ceiling below which a segment counts as underperforming.
    #[serde(default = "default_under_max_roas")]
    pub under_max_roas: f64,
    /// Spend floor for underperformer detection; filters low-spend noise.
    #[serde(default = "default_under_min_spend")]
    pub under_min_spend: f64,
    /// Minimum impressions before the funnel analyzer emits anything.
    #[serde(default = "default_funnel_min_impressions")]
    pub funnel_min_impressions: u64,
    /// High-revenue/low-margin flag: revenue ROAS above this…
    #[serde(default = "default_profit_high_revenue_roas")]
    pub profit_high_revenue_roas: f64,
    /// …while profit ROAS sits below this.
    #[serde(default = "default_profit_low_profit_roas")]
    pub profit_low_profit_roas: f64,
    /// Profitable-niche flag: revenue below this…
    #[serde(default = "default_niche_max_revenue")]
    pub niche_max_revenue: f64,
    /// …margin above this…
    #[serde(default = "default_niche_min_margin_pct")]
    pub niche_min_margin_pct: f64,
    /// …and profit ROAS above this.
    #[serde(default = "default_niche_min_profit_roas")]
    pub niche_min_profit_roas: f64,
    /// Spend floor for a campaign-level scaling suggestion.
    #[serde(default = "default_structure_campaign_min_spend")]
    pub structure_campaign_min_spend: f64,
    /// Spend floor for ad-set/ad scaling suggestions.
    #[serde(default = "default_structure_subentity_min_spend")]
    pub structure_subentity_min_spend: f64,
    #[serde(default = "default_structure_campaign_min_roas")]
    pub structure_campaign_min_roas: f64,
    #[serde(default = "default_structure_subentity_min_roas")]
    pub structure_subentity_min_roas: f64,
    /// Conversions below this keep an entity in the learning phase.
    #[serde(default = "default_learning_phase_conversions")]
    pub learning_phase_conversions: u64,
    /// Entities launched within this many days are still ramping up.
    #[serde(default = "default_ramp_up_days")]
    pub ramp_up_days: i64,
}

/// Constants for financial projections and guard-rail rule templates.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionPolicy {
    /// Budget scale factor assumed for "scale" projections, percent.
    #[serde(default = "default_scale_budget_pct")]
    pub scale_budget_pct: f64,
    /// ROAS regression (percent) that trips a guard-rail rule.
    #[serde(default = "default_guardrail_roas_drop_pct")]
    pub guardrail_roas_drop_pct: f64,
    #[serde(default = "default_impact_timeframe")]
    pub impact_timeframe: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingPolicy {
    /// Hard cap on suggestions returned per entity per run.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Platforms whose optimization goal can still be changed after launch.
    /// Empty by default: goal changes are treated as structurally impossible
    /// until a platform is confirmed to allow them.
    #[serde(default)]
    pub goal_change_allowed: Vec<AdPlatform>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationDefaults {
    #[serde(default = "default_check_frequency_hours")]
    pub check_frequency_hours: u32,
    #[serde(default = "default_max_daily_actions")]
    pub max_daily_actions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Fixed inter-call delay when dispatching a batch of actions.
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    /// Upper bound on actions per batch cycle.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

// Default functions
fn default_node_id() -> String {
    "adlens-01".to_string()
}
fn default_range_days() -> u32 {
    30
}
fn default_suggestion_ttl_days() -> u32 {
    14
}
fn default_top_min_roas() -> f64 {
    3.0
}
fn default_top_min_multiplier() -> f64 {
    1.5
}
fn default_under_max_roas() -> f64 {
    1.5
}
fn default_under_min_spend() -> f64 {
    100.0
}
fn default_funnel_min_impressions() -> u64 {
    2000
}
fn default_profit_high_revenue_roas() -> f64 {
    2.5
}
fn default_profit_low_profit_roas() -> f64 {
    1.5
}
fn default_niche_max_revenue() -> f64 {
    1000.0
}
fn default_niche_min_margin_pct() -> f64 {
    50.0
}
fn default_niche_min_profit_roas() -> f64 {
    2.0
}
fn default_structure_campaign_min_spend() -> f64 {
    100.0
}
fn default_structure_subentity_min_spend() -> f64 {
    50.0
}
fn default_structure_campaign_min_roas() -> f64 {
    1.8
}
fn default_structure_subentity_min_roas() -> f64 {
    2.5
}
fn default_learning_phase_conversions() -> u64 {
    50
}
fn default_ramp_up_days() -> i64 {
    7
}
fn default_scale_budget_pct() -> f64 {
    150.0
}
fn default_guardrail_roas_drop_pct() -> f64 {
    30.0
}
fn default_impact_timeframe() -> String {
    "7-14 days".to_string()
}
fn default_max_suggestions() -> usize {
    10
}
fn default_check_frequency_hours() -> u32 {
    6
}
fn default_max_daily_actions() -> u32 {
    3
}
fn default_inter_call_delay_ms() -> u64 {
    500
}
fn default_max_batch() -> usize {
    100
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_range_days: default_range_days(),
            suggestion_ttl_days: default_suggestion_ttl_days(),
        }
    }
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            top_min_roas: default_top_min_roas(),
            top_min_multiplier: default_top_min_multiplier(),
            under_max_roas: default_under_max_roas(),
            under_min_spend: default_under_min_spend(),
            funnel_min_impressions: default_funnel_min_impressions(),
            profit_high_revenue_roas: default_profit_high_revenue_roas(),
            profit_low_profit_roas: default_profit_low_profit_roas(),
            niche_max_revenue: default_niche_max_revenue(),
            niche_min_margin_pct: default_niche_min_margin_pct(),
            niche_min_profit_roas: default_niche_min_profit_roas(),
            structure_campaign_min_spend: default_structure_campaign_min_spend(),
            structure_subentity_min_spend: default_structure_subentity_min_spend(),
            structure_campaign_min_roas: default_structure_campaign_min_roas(),
            structure_subentity_min_roas: default_structure_subentity_min_roas(),
            learning_phase_conversions: default_learning_phase_conversions(),
            ramp_up_days: default_ramp_up_days(),
        }
    }
}

impl Default for ProjectionPolicy {
    fn default() -> Self {
        Self {
            scale_budget_pct: default_scale_budget_pct(),
            guardrail_roas_drop_pct: default_guardrail_roas_drop_pct(),
            impact_timeframe: default_impact_timeframe(),
        }
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            goal_change_allowed: Vec::new(),
        }
    }
}

impl Default for AutomationDefaults {
    fn default() -> Self {
        Self {
            check_frequency_hours: default_check_frequency_hours(),
            max_daily_actions: default_max_daily_actions(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: default_inter_call_delay_ms(),
            max_batch: default_max_batch(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            analysis: AnalysisConfig::default(),
            detection: DetectionPolicy::default(),
            projection: ProjectionPolicy::default(),
            ranking: RankingPolicy::default(),
            automation: AutomationDefaults::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADLENS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_policy_contract_values() {
        let p = DetectionPolicy::default();
        assert!((p.top_min_roas - 3.0).abs() < f64::EPSILON);
        assert!((p.top_min_multiplier - 1.5).abs() < f64::EPSILON);
        assert!((p.under_max_roas - 1.5).abs() < f64::EPSILON);
        assert!((p.under_min_spend - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.funnel_min_impressions, 2000);
    }

    #[test]
    fn test_projection_defaults() {
        let p = ProjectionPolicy::default();
        assert!((p.scale_budget_pct - 150.0).abs() < f64::EPSILON);
        assert!((p.guardrail_roas_drop_pct - 30.0).abs() < f64::EPSILON);
        assert_eq!(p.impact_timeframe, "7-14 days");
    }
}
