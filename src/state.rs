use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::store::{memory::MemoryStore, postgrest::PostgrestStore, Store};
use crate::views::ViewCache;

pub struct State {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub views: ViewCache,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn Store> = match &config.store {
            Some(remote) => {
                info!("Using hosted store at {}", remote.url);
                Arc::new(PostgrestStore::new(&remote.url, &remote.key))
            }
            None => match &config.admin {
                Some(admin) => Arc::new(MemoryStore::with_admin(&admin.email, &admin.password)),
                None => Arc::new(MemoryStore::new()),
            },
        };

        Arc::new(Self {
            config,
            store,
            views: ViewCache::new(),
        })
    }
}
