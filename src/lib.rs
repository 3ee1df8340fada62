//! # Codemark
//!
//! Qualitative coding of text corpora from the terminal.
//!
//! An analyst steps through a corpus one document at a time, saves literal
//! excerpts as extracts, tags them with codes, and groups codes into
//! themes. The codebook is a CSV file rewritten after every change, so the
//! work survives a crash and opens in any spreadsheet.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │   Corpus    │──▶│  Session (core)  │──▶│ Codebook CSV │
//! │ txt/dir/csv │   │ spans + render   │   │  (snapshot)  │
//! └─────────────┘   └────────┬─────────┘   └──────────────┘
//!                            │
//!                ┌───────────┴───────────┐
//!                ▼                       ▼
//!          ┌──────────┐           ┌────────────┐
//!          │   CLI    │           │   Shell    │
//!          │(codemark)│           │ (commands) │
//!          └──────────┘           └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! codemark render 1                       # highlighted HTML of document 1
//! codemark add "the rota" --doc 1 --code Scheduling
//! codemark counter                        # extracts per code
//! codemark shell                          # interactive session
//! codemark export --output coded.csv      # newest first
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Load documents from a file, directory, or CSV column |
//! | [`snapshot`] | Codebook CSV reading and atomic writes |
//! | [`export`] | Codebook and theme table export |
//! | [`shell`] | Line-oriented command loop |
//! | [`stats`] | Coding progress overview |
//! | [`view`] | Plain-text tables and document views |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! The highlighting pipeline, codebook model, and session live in
//! [`codemark_core`].

pub mod config;
pub mod corpus;
pub mod export;
pub mod logging;
pub mod shell;
pub mod snapshot;
pub mod stats;
pub mod view;
