//! Generate command - run the full pipeline from the terminal.

use crate::cli::{format_minutes, Output};
use crate::config::Settings;
use crate::orchestrator::{ArtifactStatus, GenerationRequest, Orchestrator};

/// Run a single generation and report the artifact location.
pub async fn run_generate(
    topic: &str,
    expertise: &str,
    length: u32,
    topology: Option<String>,
    output: Option<String>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(t) = topology {
        settings.script.topology = t
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }

    Output::header("Fortell");
    println!();
    Output::kv("Topic", topic);
    Output::kv("Audience", expertise);
    Output::kv("Length", &format_minutes(length));
    Output::kv("Topology", &settings.script.topology.to_string());
    println!();

    let orchestrator = Orchestrator::new(settings)?;

    let request = GenerationRequest {
        topic: topic.to_string(),
        expertise: expertise.to_string(),
        length_minutes: length,
    };

    let handle = orchestrator.generate(&request).await;

    println!();
    match &handle.status {
        ArtifactStatus::Complete => {
            let path = orchestrator.artifact_path(handle.id);
            Output::success(&format!("{}", handle.status));
            Output::kv("Artifact", &path.display().to_string());

            if let Some(dest) = output {
                std::fs::copy(&path, &dest)?;
                Output::kv("Copied to", &dest);
            }
        }
        status => {
            Output::error(&format!("{}", status));
            anyhow::bail!("generation failed");
        }
    }

    Ok(())
}
