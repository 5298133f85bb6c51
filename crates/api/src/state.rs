use jobs::InMemJobs;
use pipeline::TwoStageSolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<TwoStageSolver>>,
}

impl AppState {
    pub fn new_default() -> Self {
        let jobs = InMemJobs::new(TwoStageSolver::new());
        Self { jobs: Arc::new(jobs) }
    }
}
