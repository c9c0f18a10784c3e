//! LLM pipeline stages and their typed outputs.
//!
//! Each stage is one LLM-backed transformation with a declared instruction and
//! a required output shape. The runner deserializes stage replies into the
//! declared variant; anything else is a shape failure that aborts the run.

mod runner;
mod tools;

pub use runner::OpenAiStageRunner;
pub use tools::{fetch_tool_definitions, parse_tool_call, ToolCall};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source material gathered by the fetch stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedContent {
    pub combined_text: String,
    pub original_request: String,
}

/// First full script draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftScript {
    pub script_text: String,
    pub original_request: String,
}

/// Polished script after the refinement pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinedScript {
    pub refined_script_text: String,
    pub original_request: String,
}

/// Final script with chapters embedded as formatted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapteredScript {
    pub script_in_chapters: String,
}

/// One planned chapter in the table of contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPlan {
    pub title: String,
    pub description: String,
    /// Time budget assigned after planning; the plan stage itself does not set it.
    #[serde(default)]
    pub allocated_minutes: f64,
}

/// Ordered chapter plan produced by the planning stage.
///
/// The sequence order defines narration order and is never reordered
/// downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOfContents {
    pub chapters: Vec<ChapterPlan>,
}

/// Narration text for a single planned chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterScript {
    pub text: String,
}

/// The output shape a stage is declared to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Fetch,
    Draft,
    Refine,
    Chapterize,
    Plan,
    Chapter,
}

impl StageKind {
    /// JSON shape appended to the stage instructions so the model knows what
    /// to return.
    pub fn output_contract(&self) -> &'static str {
        match self {
            StageKind::Fetch => {
                r#"{"combined_text": "<all fetched text>", "original_request": "<the user request, verbatim>"}"#
            }
            StageKind::Draft => {
                r#"{"script_text": "<the draft script>", "original_request": "<the user request, verbatim>"}"#
            }
            StageKind::Refine => {
                r#"{"refined_script_text": "<the refined script>", "original_request": "<the user request, verbatim>"}"#
            }
            StageKind::Chapterize => r#"{"script_in_chapters": "<the full chaptered script>"}"#,
            StageKind::Plan => {
                r#"{"chapters": [{"title": "<chapter title>", "description": "<one sentence>"}]}"#
            }
            StageKind::Chapter => r#"{"text": "<the full chapter narration>"}"#,
        }
    }
}

/// A typed stage result, tagged by the declaring stage's kind.
#[derive(Debug, Clone)]
pub enum StageOutput {
    Fetched(FetchedContent),
    Draft(DraftScript),
    Refined(RefinedScript),
    Chaptered(ChapteredScript),
    Plan(TableOfContents),
    Chapter(ChapterScript),
}

/// One pipeline stage definition.
///
/// Stage identity (name, kind, tool access) is fixed when the pipeline
/// descriptor is built; only the instruction text is rendered per run.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub kind: StageKind,
    pub instructions: String,
    pub uses_documents: bool,
}

impl Stage {
    /// Copy of this stage with rendered instruction text.
    pub fn with_instructions(&self, instructions: String) -> Self {
        Self {
            instructions,
            ..self.clone()
        }
    }
}

/// Abstract capability to execute one named pipeline stage.
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Run a stage on the given input, returning its declared output variant
    /// or a failure when the reply does not match the declared shape.
    async fn run(&self, stage: &Stage, input: &str) -> Result<StageOutput>;
}

/// Deserialize a stage reply into the declared output variant.
///
/// The reply may wrap the JSON object in prose or a markdown fence; only the
/// outermost object is parsed.
pub(crate) fn coerce_output(stage: &Stage, content: &str) -> Result<StageOutput> {
    let json_start = content.find('{');
    let json_end = content.rfind('}');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &content[start..=end],
        _ => content,
    };

    let shape_error = || crate::error::FortellError::StageShape {
        stage: stage.name.to_string(),
        output: content.chars().take(500).collect(),
    };

    let output = match stage.kind {
        StageKind::Fetch => serde_json::from_str(json_str).map(StageOutput::Fetched),
        StageKind::Draft => serde_json::from_str(json_str).map(StageOutput::Draft),
        StageKind::Refine => serde_json::from_str(json_str).map(StageOutput::Refined),
        StageKind::Chapterize => serde_json::from_str(json_str).map(StageOutput::Chaptered),
        StageKind::Plan => serde_json::from_str(json_str).map(StageOutput::Plan),
        StageKind::Chapter => serde_json::from_str(json_str).map(StageOutput::Chapter),
    };

    output.map_err(|_| shape_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(kind: StageKind) -> Stage {
        Stage {
            name: "test-stage",
            kind,
            instructions: String::new(),
            uses_documents: false,
        }
    }

    #[test]
    fn test_coerce_declared_shape() {
        let content = r#"{"script_text": "Once upon a time", "original_request": "a story"}"#;
        let output = coerce_output(&stage(StageKind::Draft), content).unwrap();
        match output {
            StageOutput::Draft(draft) => {
                assert_eq!(draft.script_text, "Once upon a time");
                assert_eq!(draft.original_request, "a story");
            }
            _ => panic!("Expected Draft output"),
        }
    }

    #[test]
    fn test_coerce_accepts_markdown_fenced_json() {
        let content = "Here is the plan:\n\n```json\n{\"chapters\": [{\"title\": \"Origins\", \"description\": \"Where it began.\"}]}\n```\n";
        let output = coerce_output(&stage(StageKind::Plan), content).unwrap();
        match output {
            StageOutput::Plan(toc) => {
                assert_eq!(toc.chapters.len(), 1);
                assert_eq!(toc.chapters[0].title, "Origins");
                assert_eq!(toc.chapters[0].allocated_minutes, 0.0);
            }
            _ => panic!("Expected Plan output"),
        }
    }

    #[test]
    fn test_coerce_wrong_shape_fails_with_output() {
        let content = "just a plain string, no JSON at all";
        let err = coerce_output(&stage(StageKind::Chapter), content).unwrap_err();
        match err {
            crate::error::FortellError::StageShape { stage, output } => {
                assert_eq!(stage, "test-stage");
                assert!(output.contains("plain string"));
            }
            other => panic!("Expected StageShape, got {:?}", other),
        }
    }

    #[test]
    fn test_coerce_missing_field_fails() {
        // A draft-shaped object handed to a chapterize stage
        let content = r#"{"script_text": "text without chapters"}"#;
        assert!(coerce_output(&stage(StageKind::Chapterize), content).is_err());
    }

    #[test]
    fn test_shape_error_truncates_long_output() {
        let content = "y".repeat(2000);
        let err = coerce_output(&stage(StageKind::Chapter), &content).unwrap_err();
        match err {
            crate::error::FortellError::StageShape { output, .. } => {
                assert_eq!(output.chars().count(), 500);
            }
            other => panic!("Expected StageShape, got {:?}", other),
        }
    }
}
