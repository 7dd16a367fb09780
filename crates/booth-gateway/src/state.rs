use std::sync::Arc;

use booth_compose::BoothFlows;
use booth_pipeline::ReplyPipeline;

/// Shared handler state: the voice pipeline and the booth flows, both fully
/// wired with their providers at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReplyPipeline>,
    pub flows: Arc<BoothFlows>,
}

impl AppState {
    pub fn new(pipeline: Arc<ReplyPipeline>, flows: Arc<BoothFlows>) -> Self {
        Self { pipeline, flows }
    }
}
