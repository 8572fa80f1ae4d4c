//! # Mirror Site
//!
//! Serves a personal tree of markdown documents over HTTP. The
//! authoritative copy lives in a remote git repository; a background loop
//! keeps a local clone current, and every request reads whatever the clone
//! holds at that moment.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  clone/pull  ┌──────────────┐
//! │ SyncLoop │─────────────▶│ ContentStore │◀──────────────┐
//! └──────────┘              └──────┬───────┘               │
//!                                  │                       │
//!                      ┌───────────┴──────────┐            │
//!                      ▼                      ▼            │
//!               ┌──────────────┐      ┌──────────────┐     │
//!               │ PathResolver │      │ SearchEngine │─────┘
//!               │ Listing/Doc  │      └──────┬───────┘
//!               └──────┬───────┘             │
//!                      └────────┬────────────┘
//!                               ▼
//!                        ┌────────────┐
//!                        │   HTTP     │
//!                        └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Request and sync error types |
//! | [`vcs`] | Git clone, pull, and commit times |
//! | [`store`] | Access to the local clone |
//! | [`sync`] | Background clone/pull loop |
//! | [`render`] | Markdown to HTML |
//! | [`listing`] | Directory listings and ordering policies |
//! | [`resolve`] | URL path → listing, document, or not found |
//! | [`search`] | Regular-expression search over the tree |
//! | [`models`] | Result types |
//! | [`page`] | HTML presentation |
//! | [`server`] | HTTP server |

pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod page;
pub mod render;
pub mod resolve;
pub mod search;
pub mod server;
pub mod site;
pub mod store;
pub mod sync;
pub mod vcs;
