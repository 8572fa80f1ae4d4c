//! Wiring of the read-side components over one [`ContentStore`].

use std::sync::Arc;

use crate::config::Config;
use crate::listing::ListingBuilder;
use crate::render::DocumentRenderer;
use crate::resolve::PathResolver;
use crate::search::SearchEngine;
use crate::store::ContentStore;
use crate::sync::SyncLoop;
use crate::vcs::VersionControl;

pub struct Site {
    pub store: Arc<ContentStore>,
    pub resolver: PathResolver,
    pub search: SearchEngine,
}

impl Site {
    pub fn new(config: &Config, vcs: Arc<dyn VersionControl>) -> Self {
        let store = Arc::new(ContentStore::new(config.store.clone(), vcs));
        let listing = ListingBuilder::new(store.clone(), config.listing.ordering.clone());
        let renderer = DocumentRenderer::new(store.clone());
        Self {
            resolver: PathResolver::new(store.clone(), listing, renderer),
            search: SearchEngine::new(store.clone()),
            store,
        }
    }

    /// A sync loop writing to this site's store.
    pub fn sync_loop(&self, config: &Config) -> SyncLoop {
        SyncLoop::new(self.store.clone(), config.sync.clone())
    }
}
