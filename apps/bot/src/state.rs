use std::sync::Arc;

use crate::config::Config;
use crate::extract::TextExtractor;
use crate::matching::MatchEngine;
use crate::sources::SourceAggregator;
use crate::store::UserStore;
use crate::telegram::Messenger;

/// Shared application state handed to the router, pipeline, scheduler and
/// health routes. External collaborators sit behind trait objects so
/// tests can swap them out.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub messenger: Arc<dyn Messenger>,
    pub sources: Arc<SourceAggregator>,
    pub engine: MatchEngine,
    pub extractor: Arc<dyn TextExtractor>,
    pub config: Config,
}
