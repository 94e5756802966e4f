pub mod config;
pub mod models;
pub mod intelligence;

pub use intelligence::{
    AlertError, AnalysisResult, AuditExport, ClinicalAlert, ClinicalAlertEngine, DefaultAlertEngine,
    SuppressionEvaluator, TriggerCatalog,
};
pub use models::PatientContext;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}
