//! Directory listings.
//!
//! A listing holds the immediate children of a directory, referenced by
//! item name (the document suffix stripped), each name once. Directories
//! are alphabetical unless the `[listing.ordering]` table assigns them
//! another [`OrderingPolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::models::Listing;
use crate::store::ContentStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Lexicographic, ascending.
    #[default]
    Alphabetical,
    /// Last commit time, most recent first; reverse-chronological logs.
    NewestFirst,
}

pub struct ListingBuilder {
    store: Arc<ContentStore>,
    policies: HashMap<String, OrderingPolicy>,
}

impl ListingBuilder {
    pub fn new(store: Arc<ContentStore>, policies: HashMap<String, OrderingPolicy>) -> Self {
        let policies = policies
            .into_iter()
            .map(|(dir, policy)| (normalize(&dir), policy))
            .collect();
        Self { store, policies }
    }

    pub fn policy_for(&self, url_path: &str) -> OrderingPolicy {
        self.policies
            .get(&normalize(url_path))
            .copied()
            .unwrap_or_default()
    }

    /// List the directory at `dir`, addressed by `url_path`.
    pub fn list(&self, url_path: &str, dir: &Path) -> Result<Listing> {
        let policy = self.policy_for(url_path);

        // Item name -> newest timestamp among the entries sharing it.
        let mut items: BTreeMap<String, Option<DateTime<Utc>>> = BTreeMap::new();
        for entry in self.store.read_dir(dir)? {
            let name = self.store.item_name(&entry.file_name).to_string();
            let modified = match policy {
                OrderingPolicy::Alphabetical => None,
                OrderingPolicy::NewestFirst => self.store.last_modified(&entry.path),
            };
            let slot = items.entry(name).or_insert(None);
            *slot = (*slot).max(modified);
        }

        let entries = match policy {
            OrderingPolicy::Alphabetical => items.into_keys().collect(),
            OrderingPolicy::NewestFirst => {
                let mut dated: Vec<_> = items.into_iter().collect();
                // Stable sort over name order: ties stay alphabetical,
                // undated entries sink to the end.
                dated.sort_by(|a, b| b.1.cmp(&a.1));
                dated.into_iter().map(|(name, _)| name).collect()
            }
        };

        let url_path = normalize(url_path);
        let title = url_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(Listing {
            title,
            url_path,
            policy,
            entries,
        })
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
