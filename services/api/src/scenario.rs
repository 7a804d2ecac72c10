use std::path::Path;
use std::sync::Arc;

use beneficiary_fraud::config::AppConfig;
use beneficiary_fraud::error::AppError;
use beneficiary_fraud::fraud::{
    CheckVerdict, EvaluationConfig, FixedClock, FraudCheckType, UserAccount, UserId,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::infra::build_fraud_service;

/// Offline description of one identity check and the users it is evaluated against.
#[derive(Debug, Deserialize)]
pub(crate) struct Scenario {
    /// Evaluation time; the system clock is used when absent.
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
    pub(crate) users: Vec<UserAccount>,
    #[serde(default)]
    pub(crate) whitelisted_ines: Vec<String>,
    pub(crate) check: ScenarioCheck,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScenarioCheck {
    pub(crate) user_id: UserId,
    pub(crate) check_type: FraudCheckType,
    pub(crate) third_party_id: String,
    pub(crate) content: Value,
}

pub(crate) fn run_scenario_file(path: &Path, compact: bool) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&raw)?;

    let verdict = evaluate_scenario(scenario, config.fraud)?;
    let rendered = if compact {
        serde_json::to_string(&verdict)?
    } else {
        serde_json::to_string_pretty(&verdict)?
    };
    println!("{rendered}");
    Ok(())
}

/// Starts the scenario's check and evaluates it against a fresh in-memory store.
pub(crate) fn evaluate_scenario(
    scenario: Scenario,
    config: EvaluationConfig,
) -> Result<CheckVerdict, AppError> {
    let (mut service, store) = build_fraud_service(scenario.users, config);
    if let Some(now) = scenario.now {
        service = service.with_clock(Arc::new(FixedClock(now)));
    }
    for ine_hash in scenario.whitelisted_ines {
        store
            .whitelist_ine(ine_hash)
            .map_err(|error| AppError::Fraud(error.into()))?;
    }

    let check = scenario.check;
    let started = service.start_check(
        check.user_id,
        check.check_type,
        &check.third_party_id,
        Some(check.content),
    )?;
    Ok(service.on_check_result(started.id, None)?)
}
