//! # HTTP Route Handlers
//!
//! ## Exploration
//!
//! `POST /explore` decodes a plan, applies every enabled rule to its root and returns
//! each rewrite as an alternative, with the declined rules and their reasons
//! alongside. Choosing between alternatives is the caller's business.
//!
//! ## Error Handling
//!
//! Errors are returned as HTTP status codes with descriptive messages:
//! - 400 Bad Request: malformed JSON, out-of-domain literals, invalid plans, unknown
//!   rule ids.
//! - 422 Unprocessable Entity: a well-formed plan broke a rule's precondition (e.g.
//!   an inner join without a condition under a reorder rule).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use joinx_core::rule::{Rejection, RuleId, RuleOutcome};

use crate::state::AppState;
use crate::wire::{PlanJson, WireError};

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /rules: registered rules and whether each is enabled.
pub async fn list_rules(State(state): State<Arc<AppState>>) -> Json<RulesResponse> {
    let rules = state
        .rule_registry
        .rules()
        .map(|r| RuleInfo {
            id: r.id,
            pattern: r.pattern.to_string(),
            enabled: state.is_enabled(r.id),
        })
        .collect();
    Json(RulesResponse { rules })
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: Vec<RuleInfo>,
}

#[derive(Debug, Serialize)]
pub struct RuleInfo {
    pub id: RuleId,
    pub pattern: String,
    pub enabled: bool,
}

/// Request body for `POST /rules/configure`.
#[derive(Debug, Deserialize)]
pub struct ConfigureRulesRequest {
    /// Rule ids to enable.
    #[serde(default)]
    pub enable: Vec<String>,
    /// Rule ids to disable; wins over `enable`.
    #[serde(default)]
    pub disable: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigureRulesResponse {
    pub enabled: Vec<RuleId>,
    pub disabled: Vec<RuleId>,
}

fn parse_ids(names: &[String]) -> Result<Vec<RuleId>, WireError> {
    names
        .iter()
        .map(|n| n.parse::<RuleId>().map_err(WireError::from))
        .collect()
}

/// POST /rules/configure: enable/disable rules.
pub async fn configure_rules(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ConfigureRulesResponse>, (StatusCode, String)> {
    let req: ConfigureRulesRequest = serde_json::from_slice(&body).map_err(WireError::from)?;
    let enable = parse_ids(&req.enable)?;
    let disable = parse_ids(&req.disable)?;

    state.configure(&enable, &disable);
    let response = ConfigureRulesResponse {
        enabled: state.enabled_rules(),
        disabled: state.disabled_rules(),
    };
    info!("Rule configuration updated: disabled={:?}", response.disabled);
    Ok(Json(response))
}

/// Request body for `POST /explore`.
#[derive(Debug, Deserialize)]
pub struct ExploreRequest {
    pub plan: PlanJson,
    /// Restrict this request to these rules. Disabled rules stay disabled.
    #[serde(default)]
    pub rules: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub alternatives: Vec<Alternative>,
    pub declined: Vec<Declined>,
}

/// One rewrite of the submitted plan.
#[derive(Debug, Serialize)]
pub struct Alternative {
    pub rule: RuleId,
    pub plan: PlanJson,
    /// Indented tree rendering of `plan`.
    pub explain: String,
}

#[derive(Debug, Serialize)]
pub struct Declined {
    pub rule: RuleId,
    pub reason: Rejection,
}

/// POST /explore: apply the enabled rules to the submitted plan's root.
pub async fn explore(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ExploreResponse>, (StatusCode, String)> {
    let req: ExploreRequest = serde_json::from_slice(&body).map_err(WireError::from)?;
    let requested: Option<BTreeSet<RuleId>> = req
        .rules
        .as_deref()
        .map(parse_ids)
        .transpose()?
        .map(|ids| ids.into_iter().collect());
    let plan = req.plan.into_plan()?;
    debug!("Exploring plan:\n{}", plan.display(1));

    let results = state
        .rule_registry
        .apply_all(&plan, |id| {
            state.is_enabled(id) && requested.as_ref().map_or(true, |r| r.contains(&id))
        })
        .map_err(|e| {
            warn!("Exploration aborted: {}", e);
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;

    let mut response = ExploreResponse {
        alternatives: Vec::new(),
        declined: Vec::new(),
    };
    for result in results {
        match result.outcome {
            RuleOutcome::Rewritten(rewritten) => response.alternatives.push(Alternative {
                rule: result.rule,
                plan: PlanJson::from_plan(&rewritten),
                explain: rewritten.display(0),
            }),
            RuleOutcome::Declined(reason) => response.declined.push(Declined {
                rule: result.rule,
                reason,
            }),
        }
    }
    info!(
        "Explored plan: {} alternatives, {} declined",
        response.alternatives.len(),
        response.declined.len()
    );
    Ok(Json(response))
}
