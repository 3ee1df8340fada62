//! # codemark core
//!
//! I/O-free logic for codemark: the extract data model, span merging,
//! highlight rendering, the codebook store with its per-code counter,
//! document navigation, theme buckets, and the session state object that
//! ties them together through change events.
//!
//! This crate performs no filesystem access. Persistence is delegated to a
//! [`snapshot::SnapshotSink`] supplied by the calling application.
//!
//! ## Pipeline
//!
//! ```text
//! Codebook ──(extract texts for current doc)──▶ spans::merge ──▶ render::render ──▶ HTML
//!     │                                              ▲
//!     └──▶ Counter ──▶ ThemeBoard          Navigator ┘ (current document)
//! ```

pub mod codebook;
pub mod models;
pub mod navigator;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod spans;
pub mod themes;
