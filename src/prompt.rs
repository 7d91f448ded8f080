//! Prompt construction for the two analysis modes.
//!
//! A [`PromptContext`] is immutable once built and renders to exactly one
//! prompt string. Missing comparison fields are rendered as
//! [`NOT_PROVIDED`] so the oracle never reasons about a blank slot.

use crate::models::AnalysisMode;

/// Placeholder substituted for absent comparison fields.
pub const NOT_PROVIDED: &str = "Not provided";

const SYSTEM_PROMPT: &str = "You are a senior software analyst. Return only strict JSON.";

/// Optional, mode-specific text the oracle scores the corpus against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Code analysis: what the candidate was expected to build.
    DesiredProject(Option<String>),
    /// Résumé analysis: the position the candidate is matched against.
    JobPosting {
        job_description: Option<String>,
        required_skills: Option<String>,
    },
}

impl Comparison {
    /// True when no comparison text at all was supplied.
    pub fn is_empty(&self) -> bool {
        match self {
            Comparison::DesiredProject(desc) => desc.is_none(),
            Comparison::JobPosting {
                job_description,
                required_skills,
            } => job_description.is_none() && required_skills.is_none(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptContext {
    mode: AnalysisMode,
    corpus: String,
    comparison: Comparison,
}

impl PromptContext {
    pub fn code_analysis(corpus: impl Into<String>, desired_project: Option<String>) -> Self {
        Self {
            mode: AnalysisMode::CodeAnalysis,
            corpus: corpus.into(),
            comparison: Comparison::DesiredProject(non_blank(desired_project)),
        }
    }

    pub fn resume_analysis(
        resume_text: impl Into<String>,
        job_description: Option<String>,
        required_skills: Option<String>,
    ) -> Self {
        Self {
            mode: AnalysisMode::ResumeAnalysis,
            corpus: resume_text.into(),
            comparison: Comparison::JobPosting {
                job_description: non_blank(job_description),
                required_skills: non_blank(required_skills),
            },
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    /// Render the full prompt: system instruction, mode template, corpus.
    pub fn build(&self) -> String {
        let body = match &self.comparison {
            Comparison::DesiredProject(desired) => {
                code_analysis_prompt(&self.corpus, or_placeholder(desired))
            }
            Comparison::JobPosting {
                job_description,
                required_skills,
            } => resume_analysis_prompt(
                &self.corpus,
                or_placeholder(job_description),
                or_placeholder(required_skills),
            ),
        };
        format!("{}\n\n{}", SYSTEM_PROMPT, body)
    }
}

fn code_analysis_prompt(source: &str, desired_project: &str) -> String {
    format!(
        r#"Analyze the following frontend source code and return strict JSON with:
- description: project purpose plus application flow and user types
- features: array of main features
- tech_stack: A comprehensive array of ALL technologies used. You MUST explicitly look for and include:
    * Programming languages (e.g., Python, JavaScript, TypeScript)
    * Frameworks (e.g., React, Next.js, Vue, FastAPI, Django)
    * State management (e.g., Redux, Context API, Zustand)
    * API fetching and async tools (e.g., Axios, fetch, TanStack Query, SWR)
    * Styling and UI libraries (e.g., Tailwind, Material UI, Bootstrap, CSS Modules)
    * Build tools (e.g., Vite, Webpack)
    * Any other major libraries found in imports or configuration.
- questions_that_can_be_asked_in_interview: array of 5 technical interview questions specifically related to the code patterns, libraries, and architecture used in this project.
- summary: overall summary
- alignment_score: integer from 0 to 100 rating how well the code matches the desired project description below. Use 0 if the description is "{placeholder}".
- alignment_rationale: one or two sentences explaining the alignment score.

Respond with the JSON object only. Do not wrap it in markdown.

Desired project description:
{desired_project}

Source code:
{source}
"#,
        placeholder = NOT_PROVIDED,
        desired_project = desired_project,
        source = source,
    )
}

fn resume_analysis_prompt(resume_text: &str, job_description: &str, required_skills: &str) -> String {
    format!(
        r#"Analyze the following candidate resume text and return strict JSON with:
- description: brief profile summary.
- key_skills: array of technical and soft skills.
- key_projects: array of projects with brief descriptions.
- experience: array of work experience entries (e.g. "Software Engineer at Acme (2020-2022): Developed X...").
- education: array of education entries.
- highlights: array of key achievements.
- match_score: integer from 0 to 100 rating how well the candidate fits the job description and required skills below. Use 0 if both are "{placeholder}".
- match_rationale: one or two sentences explaining the match score.

Respond with the JSON object only. Do not wrap it in markdown.

Job description:
{job_description}

Required skills:
{required_skills}

Resume text:
{resume_text}
"#,
        placeholder = NOT_PROVIDED,
        job_description = job_description,
        required_skills = required_skills,
        resume_text = resume_text,
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_PROVIDED)
}
