//! Prompt templates for Fortell.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Instructions for each pipeline stage.
    pub stages: StagePrompts,
    /// Template for the user brief fed into the first stage.
    pub request: RequestPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Instruction text for each LLM stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePrompts {
    pub fetch: String,
    pub draft: String,
    pub refine: String,
    pub chapterize: String,
    pub plan: String,
    pub chapter: String,
}

impl Default for StagePrompts {
    fn default() -> Self {
        Self {
            fetch: "Your primary goal is to gather textual information for an audiobook script. \
                    You must fetch content from the allowed source files in order, using the \
                    'fetch_document' tool for each: first {{allowed_files}}. \
                    Combine the content from these files into a single text block. \
                    Preserve the original user request alongside the combined text for context \
                    in subsequent steps."
                .to_string(),

            draft: "You are an expert scriptwriter. Based on the original user request and the \
                    provided combined text, generate a draft script for the audiobook. The \
                    user's request contains details about expertise level, target audience, \
                    desired length, and topic. \
                    Focus on conveying the information accurately and engagingly according to \
                    the user's original request. Aim for at least {{target_words}} words."
                .to_string(),

            refine: "Your task is to refine the draft audiobook script. Review it for clarity, \
                     accuracy, flow, and engagement. Ensure it aligns with the original user \
                     request regarding tone, style, and target audience. \
                     Make improvements to create a polished version of the script."
                .to_string(),

            chapterize: "Take the refined audiobook script and structure it into logical \
                         chapters. Each chapter should have a clear title. \
                         The final output should be the complete script, well-formatted with \
                         these chapters, suitable for an audiobook narration. Separate \
                         paragraphs with blank lines."
                .to_string(),

            plan: "You are an audiobook editor planning a table of contents. Based on the \
                   user's request, design a sequence of chapters that together cover the topic \
                   for the requested total duration of {{total_minutes}} minutes. \
                   For each chapter provide a title and a one-sentence description of what it \
                   covers. Order the chapters so the narration builds naturally."
                .to_string(),

            chapter: "You are an expert scriptwriter narrating one chapter of an audiobook. \
                      Write the full narration text for the chapter titled '{{chapter_title}}' \
                      ({{chapter_description}}). The chapter is budgeted at \
                      {{chapter_minutes}} minutes of narration, so the text must contain at \
                      least {{chapter_words}} words. This is a strict minimum. \
                      Match the tone to a {{expertise}} audience and stay on the topic of \
                      '{{topic}}'. Separate paragraphs with blank lines."
                .to_string(),
        }
    }
}

/// Template for the rendered user brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPrompts {
    pub brief: String,
}

impl Default for RequestPrompts {
    fn default() -> Self {
        Self {
            brief: "You are an expert in the user-specified field. Generate a script for a \
                    {{length}}-minute long audiobook designed for a {{expertise}} level \
                    audience to understand the topic of '{{topic}}', including associated \
                    principles and outcomes."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load stage prompts if file exists
            let stages_path = custom_path.join("stages.toml");
            if stages_path.exists() {
                let content = std::fs::read_to_string(&stages_path)?;
                prompts.stages = toml::from_str(&content)?;
            }

            // Load request brief template if file exists
            let request_path = custom_path.join("request.toml");
            if request_path.exists() {
                let content = std::fs::read_to_string(&request_path)?;
                prompts.request = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.stages.fetch.is_empty());
        assert!(!prompts.stages.chapter.is_empty());
        assert!(prompts.request.brief.contains("{{topic}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("tone".to_string(), "formal".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("tone".to_string(), "casual".to_string());

        let result = prompts.render_with_custom("Use a {{tone}} tone.", &vars);
        assert_eq!(result, "Use a casual tone.");
    }
}
