//! End-to-end analysis pipeline.
//!
//! ```text
//! repo URL ──clone──▶ tree ──walk──▶ corpus ─┐
//!                                            ├─▶ prompt ─▶ oracle ─▶ recover ─▶ result
//! upload bytes ──extract──▶ résumé text ─────┘
//! ```
//!
//! Each call owns its temporary clone, corpus and prompt; the only shared
//! piece is the [`Oracle`], which is read-only. Blocking work (the `git`
//! subprocess and the filesystem walk) runs on the blocking thread pool.

use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::connector_fs::{read_corpus, WalkOptions};
use crate::connector_git::clone_repository;
use crate::error::AnalyzeError;
use crate::extract::extract_document_with_limit;
use crate::models::AnalysisMode;
use crate::oracle::Oracle;
use crate::prompt::PromptContext;
use crate::recovery::{recover, ExtractionResult};

/// Rationale used when no desired-project description was supplied.
pub const NO_PROJECT_RATIONALE: &str =
    "No desired project description was provided, so alignment was not scored.";

/// Rationale used when neither a job description nor required skills were supplied.
pub const NO_JOB_RATIONALE: &str =
    "No job description or required skills were provided, so the match was not scored.";

pub struct Analyzer {
    oracle: Arc<dyn Oracle>,
    walk: WalkOptions,
    corpus_max_chars: usize,
    document_max_chars: usize,
    clone_depth: u32,
}

impl Analyzer {
    pub fn new(config: &Config, oracle: Arc<dyn Oracle>) -> Result<Self> {
        Ok(Self {
            oracle,
            walk: WalkOptions::new(config.limits.file_max_chars, &config.walker.exclude_globs)?,
            corpus_max_chars: config.limits.corpus_max_chars,
            document_max_chars: config.limits.document_max_chars,
            clone_depth: config.fetch.depth,
        })
    }

    /// Clone a repository into a temporary directory and analyze it. The
    /// clone is removed when this returns, whatever the outcome.
    pub async fn analyze_repository(
        &self,
        url: &str,
        desired_project: Option<String>,
    ) -> Result<ExtractionResult, AnalyzeError> {
        let tmp = tempfile::TempDir::new()
            .map_err(|e| AnalyzeError::Internal(format!("failed to create temp dir: {}", e)))?;

        let target = tmp.path().to_path_buf();
        let url_owned = url.to_string();
        let depth = self.clone_depth;
        let repo_path = tokio::task::spawn_blocking(move || {
            clone_repository(&url_owned, &target, depth)
        })
        .await??;

        let result = self.analyze_directory(&repo_path, desired_project).await;
        drop(tmp);
        result
    }

    /// Analyze a source tree already on disk.
    pub async fn analyze_directory(
        &self,
        root: &Path,
        desired_project: Option<String>,
    ) -> Result<ExtractionResult, AnalyzeError> {
        let corpus = self.build_corpus(root.to_path_buf()).await?;
        let ctx = PromptContext::code_analysis(corpus, desired_project);
        self.run(&ctx).await
    }

    /// Analyze an uploaded résumé.
    pub async fn analyze_document(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
        job_description: Option<String>,
        required_skills: Option<String>,
    ) -> Result<ExtractionResult, AnalyzeError> {
        let text = self.document_text(bytes, filename)?;
        let ctx = PromptContext::resume_analysis(text, job_description, required_skills);
        self.run(&ctx).await
    }

    /// Walk `root` and return the assembled corpus text without calling the oracle.
    pub async fn build_corpus(&self, root: PathBuf) -> Result<String, AnalyzeError> {
        let walk = self.walk.clone();
        let max = self.corpus_max_chars;
        let (corpus, _) = tokio::task::spawn_blocking(move || read_corpus(&root, &walk, max)).await??;
        info!(
            files = corpus.file_count,
            chars = corpus.text.chars().count(),
            truncated = corpus.truncated,
            "corpus assembled"
        );
        Ok(corpus.text)
    }

    /// Extract the cleaned, bounded text of a document.
    pub fn document_text(&self, bytes: &[u8], filename: Option<&str>) -> Result<String, AnalyzeError> {
        if bytes.is_empty() {
            return Err(AnalyzeError::EmptyDocument("resume file is empty".to_string()));
        }
        let text = extract_document_with_limit(bytes, filename, self.document_max_chars);
        if text.is_empty() {
            return Err(AnalyzeError::EmptyDocument(
                "unable to extract resume text".to_string(),
            ));
        }
        info!(chars = text.chars().count(), "document extracted");
        Ok(text)
    }

    /// One prompt, one oracle call, one recovered result.
    async fn run(&self, ctx: &PromptContext) -> Result<ExtractionResult, AnalyzeError> {
        let prompt = ctx.build();
        info!(mode = %ctx.mode(), model = self.oracle.model_name(), "requesting analysis");

        let reply = self.oracle.generate(&prompt).await?;
        let mut result = recover(&reply, ctx.mode());

        if ctx.comparison().is_empty() {
            zero_comparison_score(&mut result);
        }
        Ok(result)
    }
}

/// Without comparison text the score is defined as 0, whatever the oracle said.
fn zero_comparison_score(result: &mut ExtractionResult) {
    let (score_key, rationale_key, rationale) = match result.mode {
        AnalysisMode::CodeAnalysis => ("alignment_score", "alignment_rationale", NO_PROJECT_RATIONALE),
        AnalysisMode::ResumeAnalysis => ("match_score", "match_rationale", NO_JOB_RATIONALE),
    };
    result.fields.insert(score_key.to_string(), Value::from(0));
    result
        .fields
        .insert(rationale_key.to_string(), Value::String(rationale.to_string()));
}
