//! Configuration settings for Fortell.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub documents: DocumentSettings,
    pub script: ScriptSettings,
    pub speech: SpeechSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (generated audio lives here).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.fortell".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Pipeline topology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Four stages in sequence: fetch, draft, refine, chapterize.
    #[default]
    Linear,
    /// Plan a table of contents first, then script each chapter.
    Planned,
}

impl std::str::FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Topology::Linear),
            "planned" => Ok(Topology::Planned),
            _ => Err(format!("Unknown topology: {}", s)),
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Linear => write!(f, "linear"),
            Topology::Planned => write!(f, "planned"),
        }
    }
}

/// Source document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Directory containing the source documents.
    pub dir: String,
    /// Filenames the fetch stage is allowed to read.
    pub allowed_files: Vec<String>,
    /// Maximum characters returned per document before truncation.
    pub max_chars: usize,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            dir: "./documents".to_string(),
            allowed_files: vec![
                "investopedia.txt".to_string(),
                "kremp.txt".to_string(),
                "wikipedia.txt".to_string(),
            ],
            max_chars: 8000,
        }
    }
}

/// Script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// LLM model for all script stages.
    pub model: String,
    /// Sampling temperature for script stages.
    pub temperature: f32,
    /// Pipeline topology (linear, planned).
    pub topology: Topology,
    /// Maximum tool-calling iterations for the fetch stage.
    pub max_stage_iterations: usize,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            topology: Topology::Linear,
            max_stage_iterations: 10,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Text-to-speech model.
    pub model: String,
    /// Narration voice.
    pub voice: String,
    /// Maximum characters per synthesis chunk.
    pub max_chunk_chars: usize,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "coral".to_string(),
            max_chunk_chars: 2500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FortellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fortell")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory where finished audio artifacts are written.
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir().join("audio")
    }

    /// Get the expanded source document directory path.
    pub fn documents_dir(&self) -> PathBuf {
        Self::expand_path(&self.documents.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.speech.max_chunk_chars, 2500);
        assert_eq!(parsed.script.topology, Topology::Linear);
        assert_eq!(parsed.documents.allowed_files.len(), 3);
    }

    #[test]
    fn test_topology_from_str() {
        assert_eq!("linear".parse::<Topology>().unwrap(), Topology::Linear);
        assert_eq!("Planned".parse::<Topology>().unwrap(), Topology::Planned);
        assert!("ring".parse::<Topology>().is_err());
    }

    #[test]
    fn test_audio_dir_under_data_dir() {
        let settings = Settings::default();
        assert!(settings.audio_dir().starts_with(settings.data_dir()));
    }
}
