//! # Repo Analyzer
//!
//! Turns a source repository or a candidate's résumé into a bounded text
//! corpus, asks an LLM for a structured analysis, and recovers a
//! well-formed result even when the model's reply is malformed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐   ┌──────────┐
//! │ Source       │──▶│ Corpus +     │──▶│  Oracle  │──▶│ Recovery │
//! │ git/fs/doc   │   │ Prompt       │   │ (Gemini) │   │ + schema │
//! └──────────────┘   └──────────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential resolution |
//! | [`models`] | Core data types |
//! | [`connector_git`] | Shallow repository clone |
//! | [`connector_fs`] | Source tree walker |
//! | [`corpus`] | Corpus assembly under a size budget |
//! | [`extract`] | Document text extraction and cleaning |
//! | [`prompt`] | Prompt templates for both analysis modes |
//! | [`oracle`] | LLM client abstraction |
//! | [`recovery`] | Fence stripping, parsing and fallback results |
//! | [`schemas`] | Typed response views |
//! | [`analyze`] | End-to-end pipeline |
//! | [`error`] | Error taxonomy |

pub mod analyze;
pub mod config;
pub mod connector_fs;
pub mod connector_git;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod models;
pub mod oracle;
pub mod prompt;
pub mod recovery;
pub mod schemas;
