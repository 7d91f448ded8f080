//! Pipeline tests driven through the library API with an in-memory oracle.
//!
//! These cover the path from a tree or document to a recovered result
//! without any network access: the oracle is a scripted stand-in that
//! records the prompt it was given.

use async_trait::async_trait;
use repo_analyzer::analyze::{Analyzer, NO_JOB_RATIONALE, NO_PROJECT_RATIONALE};
use repo_analyzer::config::Config;
use repo_analyzer::error::{AnalyzeError, ErrorKind};
use repo_analyzer::models::AnalysisMode;
use repo_analyzer::oracle::{Oracle, OracleError};
use repo_analyzer::recovery::{CODE_ANALYSIS_KEYS, FALLBACK_NOTE};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ─── Scripted oracle ────────────────────────────────────────────────

enum Script {
    Reply(String),
    Fail,
}

struct ScriptedOracle {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Reply(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Script::Fail,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail => Err(OracleError::EmptyReply),
        }
    }
}

fn analyzer(oracle: Arc<ScriptedOracle>) -> Analyzer {
    Analyzer::new(&Config::default(), oracle).unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/App.jsx", "export default function App() { return <Cart/>; }");
    write(tmp.path(), "src/api.ts", "export const load = () => fetch('/api/items');");
    write(tmp.path(), "node_modules/react/index.js", "module.exports = React;");
    write(tmp.path(), "README.md", "# Shop");
    tmp
}

// ─── Code analysis ──────────────────────────────────────────────────

#[tokio::test]
async fn code_analysis_round_trip() {
    let tree = sample_tree();
    let oracle = ScriptedOracle::replying(
        "```json\n{\"description\":\"A shop\",\"features\":[\"cart\"],\"tech_stack\":[\"React\"],\"summary\":\"ok\"}\n```",
    );
    let result = analyzer(oracle.clone())
        .analyze_directory(tree.path(), None)
        .await
        .unwrap();

    assert_eq!(oracle.calls(), 1);
    let prompt = oracle.last_prompt();
    assert!(prompt.contains("// --- file: App.jsx ---"));
    assert!(prompt.contains("// --- file: api.ts ---"));
    assert!(!prompt.contains("module.exports = React"));
    assert!(!prompt.contains("# Shop"));

    assert!(!result.degraded);
    assert_eq!(result.mode, AnalysisMode::CodeAnalysis);
    assert_eq!(result.get("description"), Some(&json!("A shop")));
    assert_eq!(result.get("features"), Some(&json!(["cart"])));
}

#[tokio::test]
async fn no_desired_project_scores_zero() {
    let tree = sample_tree();
    let oracle = ScriptedOracle::replying(
        r#"{"description":"d","alignment_score":73,"alignment_rationale":"looks similar"}"#,
    );
    let result = analyzer(oracle.clone())
        .analyze_directory(tree.path(), None)
        .await
        .unwrap();

    assert!(oracle.last_prompt().contains("Desired project description:\nNot provided"));
    assert_eq!(result.get("alignment_score"), Some(&json!(0)));
    assert_eq!(
        result.get("alignment_rationale"),
        Some(&json!(NO_PROJECT_RATIONALE))
    );
}

#[tokio::test]
async fn desired_project_score_is_kept() {
    let tree = sample_tree();
    let oracle = ScriptedOracle::replying(r#"{"alignment_score":73,"alignment_rationale":"close"}"#);
    let result = analyzer(oracle.clone())
        .analyze_directory(tree.path(), Some("An online shop in React".to_string()))
        .await
        .unwrap();

    assert!(oracle
        .last_prompt()
        .contains("Desired project description:\nAn online shop in React"));
    assert_eq!(result.get("alignment_score"), Some(&json!(73)));
    assert_eq!(result.get("alignment_rationale"), Some(&json!("close")));
}

#[tokio::test]
async fn malformed_reply_degrades_to_fallback() {
    let tree = sample_tree();
    let oracle = ScriptedOracle::replying("not json at all");
    let result = analyzer(oracle)
        .analyze_directory(tree.path(), None)
        .await
        .unwrap();

    assert!(result.degraded);
    for key in CODE_ANALYSIS_KEYS {
        assert!(result.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(result.get("features"), Some(&json!([])));
    assert_eq!(result.get("tech_stack"), Some(&json!([])));
    assert_eq!(result.get("note"), Some(&json!(FALLBACK_NOTE)));
    assert_eq!(result.get("alignment_score"), Some(&json!(0)));
}

#[tokio::test]
async fn tree_without_qualifying_files_never_calls_oracle() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "docs/guide.md", "# Guide");
    write(tmp.path(), "dist/bundle.js", "minified()");
    write(tmp.path(), ".git/hooks/pre-commit.py", "print()");

    let oracle = ScriptedOracle::replying("{}");
    let err = analyzer(oracle.clone())
        .analyze_directory(tmp.path(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzeError::NoAnalyzableFiles));
    assert_eq!(err.kind(), ErrorKind::InputShape);
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn oracle_failure_propagates() {
    let tree = sample_tree();
    let err = analyzer(ScriptedOracle::failing())
        .analyze_directory(tree.path(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Oracle);
    assert!(err.to_string().contains("empty or blocked"));
}

// ─── Résumé analysis ────────────────────────────────────────────────

#[tokio::test]
async fn resume_analysis_with_job_posting() {
    let oracle = ScriptedOracle::replying(
        r#"{"description":"Backend dev","key_skills":["Rust","Go"],"match_score":88,"match_rationale":"strong"}"#,
    );
    let result = analyzer(oracle.clone())
        .analyze_document(
            b"Jane Doe\n\n\n\nRust    engineer at Acme",
            Some("jane.txt"),
            Some("Senior backend engineer".to_string()),
            Some("Rust, Postgres".to_string()),
        )
        .await
        .unwrap();

    let prompt = oracle.last_prompt();
    assert!(prompt.contains("Resume text:\nJane Doe\n\nRust engineer at Acme"));
    assert!(prompt.contains("Required skills:\nRust, Postgres"));
    assert_eq!(result.mode, AnalysisMode::ResumeAnalysis);
    assert_eq!(result.get("match_score"), Some(&json!(88)));
}

#[tokio::test]
async fn resume_without_job_posting_scores_zero() {
    let oracle = ScriptedOracle::replying(r#"{"match_score":50}"#);
    let result = analyzer(oracle)
        .analyze_document(b"Jane Doe", None, None, None)
        .await
        .unwrap();

    assert_eq!(result.get("match_score"), Some(&json!(0)));
    assert_eq!(result.get("match_rationale"), Some(&json!(NO_JOB_RATIONALE)));
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let oracle = ScriptedOracle::replying("{}");
    let err = analyzer(oracle.clone())
        .analyze_document(b"", Some("cv.pdf"), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalyzeError::EmptyDocument(_)));
    assert_eq!(err.to_string(), "resume file is empty");
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn whitespace_only_upload_is_rejected() {
    let oracle = ScriptedOracle::replying("{}");
    let err = analyzer(oracle)
        .analyze_document(b" \n\t\x00 ", None, None, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "unable to extract resume text");
}

#[tokio::test]
async fn resume_fallback_keeps_every_list_empty() {
    let oracle = ScriptedOracle::replying("Sorry, I can't help with that.");
    let result = analyzer(oracle)
        .analyze_document(b"Jane Doe", None, None, None)
        .await
        .unwrap();

    assert!(result.degraded);
    for key in ["key_skills", "key_projects", "experience", "education", "highlights"] {
        assert_eq!(result.get(key), Some(&json!([])), "{}", key);
    }
}
