//! Configuration module for Fortell.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RequestPrompts, StagePrompts};
pub use settings::{
    DocumentSettings, GeneralSettings, PromptSettings, ScriptSettings, Settings, SpeechSettings,
    Topology,
};
