use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use beneficiary_fraud::error::AppError;
use beneficiary_fraud::fraud::{
    EvaluationConfig, FraudService, InMemoryFraudStore, RecordingGateway, UserAccount,
};
use metrics_exporter_prometheus::PrometheusHandle;

pub(crate) type InMemoryFraudService = FraudService<InMemoryFraudStore, RecordingGateway>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Reads a JSON array of user accounts.
pub(crate) fn load_users(path: &Path) -> Result<Vec<UserAccount>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn build_fraud_service(
    users: Vec<UserAccount>,
    config: EvaluationConfig,
) -> (InMemoryFraudService, Arc<InMemoryFraudStore>) {
    let store = Arc::new(InMemoryFraudStore::with_users(users));
    let gateway = Arc::new(RecordingGateway::new());
    (FraudService::new(store.clone(), gateway, config), store)
}
