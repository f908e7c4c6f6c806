use borda_poll::config::{AppConfig, PollConfig};
use borda_poll::poll::{JsonFileBallotStore, PollService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type FilePollService = PollService<JsonFileBallotStore>;

pub(crate) fn file_poll_service(config: &AppConfig) -> Arc<FilePollService> {
    let store = Arc::new(JsonFileBallotStore::new(config.storage.data_file.clone()));
    Arc::new(PollService::new(Arc::new(config.poll.clone()), store))
}

/// Log which candidate images resolve under the static directory. Missing images only warn.
pub(crate) fn audit_candidate_images(poll: &PollConfig, static_dir: &Path) -> usize {
    let mut missing = 0;
    for check in poll.check_images(static_dir) {
        if check.present {
            debug!(
                candidate = %check.candidate,
                path = %check.path.display(),
                "candidate image found"
            );
        } else {
            missing += 1;
            warn!(
                candidate = %check.candidate,
                path = %check.path.display(),
                "candidate image missing"
            );
        }
    }
    missing
}
