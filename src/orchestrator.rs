//! Pipeline orchestrator for Fortell.
//!
//! Coordinates the entire process from brief to finished audio artifact.

use crate::budget;
use crate::chunking::chunk_text;
use crate::config::{Prompts, Settings, Topology};
use crate::documents::DocumentSource;
use crate::error::{FortellError, Result};
use crate::speech::{AudioAssembler, OpenAiSpeech, SpeechSynthesizer};
use crate::stage::{
    ChapterPlan, OpenAiStageRunner, Stage, StageKind, StageOutput, StageRunner, TableOfContents,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A user brief for one audiobook generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Subject of the audiobook.
    pub topic: String,
    /// Audience expertise level (free text, e.g. "PhD economist").
    pub expertise: String,
    /// Requested narration length in minutes.
    pub length_minutes: u32,
}

/// Final state of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// The run has been accepted but not finished.
    Pending,
    /// The artifact file exists at its derived path.
    Complete,
    /// The run failed; no artifact file exists.
    Failed(String),
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactStatus::Pending => write!(f, "Generation in progress"),
            ArtifactStatus::Complete => write!(f, "Audio generation complete"),
            ArtifactStatus::Failed(reason) => write!(f, "An error occurred: {}", reason),
        }
    }
}

/// Handle to one generation run and its artifact.
#[derive(Debug, Clone)]
pub struct ArtifactHandle {
    /// Unique identifier; the artifact path derives from it.
    pub id: Uuid,
    /// Outcome of the run.
    pub status: ArtifactStatus,
}

/// Fixed stage descriptors for both topologies, built once at startup.
///
/// Stage identity never changes after construction; instruction templates are
/// rendered with per-run variables at invocation time.
struct StageSet {
    fetch: Stage,
    draft: Stage,
    refine: Stage,
    chapterize: Stage,
    plan: Stage,
    chapter: Stage,
}

impl StageSet {
    fn new(prompts: &Prompts) -> Self {
        Self {
            fetch: Stage {
                name: "content-fetcher",
                kind: StageKind::Fetch,
                instructions: prompts.stages.fetch.clone(),
                uses_documents: true,
            },
            draft: Stage {
                name: "script-generator",
                kind: StageKind::Draft,
                instructions: prompts.stages.draft.clone(),
                uses_documents: false,
            },
            refine: Stage {
                name: "script-refiner",
                kind: StageKind::Refine,
                instructions: prompts.stages.refine.clone(),
                uses_documents: false,
            },
            chapterize: Stage {
                name: "chapterizer",
                kind: StageKind::Chapterize,
                instructions: prompts.stages.chapterize.clone(),
                uses_documents: false,
            },
            plan: Stage {
                name: "toc-planner",
                kind: StageKind::Plan,
                instructions: prompts.stages.plan.clone(),
                uses_documents: false,
            },
            chapter: Stage {
                name: "chapter-writer",
                kind: StageKind::Chapter,
                instructions: prompts.stages.chapter.clone(),
                uses_documents: false,
            },
        }
    }
}

/// The main orchestrator for the Fortell pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    stages: StageSet,
    runner: Arc<dyn StageRunner>,
    assembler: AudioAssembler,
    audio_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let documents = DocumentSource::new(settings.documents_dir(), &settings.documents);
        let runner: Arc<dyn StageRunner> =
            Arc::new(OpenAiStageRunner::new(&settings.script, documents));
        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(OpenAiSpeech::with_config(
            &settings.speech.model,
            &settings.speech.voice,
        ));

        Self::with_components(settings, prompts, runner, synthesizer)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        runner: Arc<dyn StageRunner>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let audio_dir = settings.audio_dir();
        std::fs::create_dir_all(&audio_dir)?;

        let stages = StageSet::new(&prompts);

        Ok(Self {
            settings,
            prompts,
            stages,
            runner,
            assembler: AudioAssembler::new(synthesizer),
            audio_dir,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Path where the artifact for `id` is (or would be) written.
    pub fn artifact_path(&self, id: Uuid) -> PathBuf {
        self.audio_dir.join(format!("{}.mp3", id))
    }

    /// Run the full pipeline for one request.
    ///
    /// This is the single failure boundary of a run: every internal error is
    /// converted into [`ArtifactStatus::Failed`] on the returned handle, and
    /// no artifact file exists unless the whole run succeeded.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn generate(&self, request: &GenerationRequest) -> ArtifactHandle {
        let id = Uuid::new_v4();
        info!(
            "Starting generation {} ({} minutes on '{}', {} topology)",
            id, request.length_minutes, request.topic, self.settings.script.topology
        );

        match self.run_pipeline(id, request).await {
            Ok(()) => ArtifactHandle {
                id,
                status: ArtifactStatus::Complete,
            },
            Err(e) => {
                warn!("Generation {} failed: {}", id, e);
                ArtifactHandle {
                    id,
                    status: ArtifactStatus::Failed(e.to_string()),
                }
            }
        }
    }

    async fn run_pipeline(&self, id: Uuid, request: &GenerationRequest) -> Result<()> {
        if request.length_minutes == 0 {
            return Err(FortellError::InvalidInput(
                "length must be at least one minute".to_string(),
            ));
        }

        let brief = self.render_brief(request);
        let max_chunk = self.settings.speech.max_chunk_chars;

        let units: Vec<Vec<String>> = match self.settings.script.topology {
            Topology::Linear => {
                let script = self.run_linear(request, &brief).await?;
                vec![chunk_text(&script, max_chunk)]
            }
            Topology::Planned => {
                let chapters = self.run_planned(request, &brief).await?;
                chapters
                    .iter()
                    .map(|text| chunk_text(text, max_chunk))
                    .collect()
            }
        };

        self.assembler.assemble(&units, &self.artifact_path(id)).await
    }

    /// Linear topology: fetch, draft, refine, chapterize, each stage feeding
    /// its structured output to the next.
    async fn run_linear(&self, request: &GenerationRequest, brief: &str) -> Result<String> {
        let fetched = self.run_fetch(brief).await?;

        eprintln!("  Drafting script...");
        let mut vars = HashMap::new();
        vars.insert(
            "target_words".to_string(),
            budget::target_words(request.length_minutes).to_string(),
        );
        let draft_stage = self.rendered(&self.stages.draft, &vars);
        let StageOutput::Draft(draft) = self
            .runner
            .run(&draft_stage, &serde_json::to_string(&fetched)?)
            .await?
        else {
            return Err(self.variant_mismatch(&draft_stage));
        };

        eprintln!("  Refining script...");
        let refine_stage = self.rendered(&self.stages.refine, &HashMap::new());
        let StageOutput::Refined(refined) = self
            .runner
            .run(&refine_stage, &serde_json::to_string(&draft)?)
            .await?
        else {
            return Err(self.variant_mismatch(&refine_stage));
        };

        eprintln!("  Structuring chapters...");
        let chapterize_stage = self.rendered(&self.stages.chapterize, &HashMap::new());
        let StageOutput::Chaptered(chaptered) = self
            .runner
            .run(&chapterize_stage, &serde_json::to_string(&refined)?)
            .await?
        else {
            return Err(self.variant_mismatch(&chapterize_stage));
        };

        Ok(chaptered.script_in_chapters)
    }

    /// Planned topology: fetch, plan a time-budgeted table of contents, then
    /// script each chapter in plan order with a strict word floor.
    async fn run_planned(
        &self,
        request: &GenerationRequest,
        brief: &str,
    ) -> Result<Vec<String>> {
        let fetched = self.run_fetch(brief).await?;

        eprintln!("  Planning chapters...");
        let mut vars = HashMap::new();
        vars.insert(
            "total_minutes".to_string(),
            request.length_minutes.to_string(),
        );
        let plan_stage = self.rendered(&self.stages.plan, &vars);
        let StageOutput::Plan(plan) = self
            .runner
            .run(&plan_stage, &serde_json::to_string(&fetched)?)
            .await?
        else {
            return Err(self.variant_mismatch(&plan_stage));
        };

        if plan.chapters.is_empty() {
            return Err(FortellError::Stage(
                plan_stage.name.to_string(),
                "plan contains no chapters".to_string(),
            ));
        }

        let toc = budgeted(plan, request.length_minutes);
        eprintln!("  Planned {} chapters", toc.chapters.len());

        let mut chapter_texts = Vec::with_capacity(toc.chapters.len());
        for (index, chapter) in toc.chapters.iter().enumerate() {
            eprintln!(
                "  Writing chapter {}/{}: {}",
                index + 1,
                toc.chapters.len(),
                chapter.title
            );

            let chapter_stage = self.rendered_chapter_stage(request, chapter);
            let input = serde_json::to_string(&json!({
                "original_request": brief,
                "source_material": fetched.combined_text,
            }))?;

            let StageOutput::Chapter(script) = self.runner.run(&chapter_stage, &input).await?
            else {
                return Err(self.variant_mismatch(&chapter_stage));
            };

            chapter_texts.push(script.text);
        }

        Ok(chapter_texts)
    }

    /// Run the fetch stage on the rendered brief.
    async fn run_fetch(&self, brief: &str) -> Result<crate::stage::FetchedContent> {
        eprintln!("  Gathering source material...");

        let mut vars = HashMap::new();
        vars.insert(
            "allowed_files".to_string(),
            ordered_list_phrase(&self.settings.documents.allowed_files),
        );
        let fetch_stage = self.rendered(&self.stages.fetch, &vars);

        let StageOutput::Fetched(fetched) = self.runner.run(&fetch_stage, brief).await? else {
            return Err(self.variant_mismatch(&fetch_stage));
        };
        Ok(fetched)
    }

    /// Render the user brief fed into the first stage.
    fn render_brief(&self, request: &GenerationRequest) -> String {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), request.topic.clone());
        vars.insert("expertise".to_string(), request.expertise.clone());
        vars.insert("length".to_string(), request.length_minutes.to_string());
        self.prompts
            .render_with_custom(&self.prompts.request.brief, &vars)
    }

    fn rendered(&self, stage: &Stage, vars: &HashMap<String, String>) -> Stage {
        stage.with_instructions(self.prompts.render_with_custom(&stage.instructions, vars))
    }

    fn rendered_chapter_stage(&self, request: &GenerationRequest, chapter: &ChapterPlan) -> Stage {
        let mut vars = HashMap::new();
        vars.insert("chapter_title".to_string(), chapter.title.clone());
        vars.insert(
            "chapter_description".to_string(),
            chapter.description.clone(),
        );
        vars.insert(
            "chapter_minutes".to_string(),
            format_minutes(chapter.allocated_minutes),
        );
        vars.insert(
            "chapter_words".to_string(),
            budget::chapter_words(chapter.allocated_minutes).to_string(),
        );
        vars.insert("topic".to_string(), request.topic.clone());
        vars.insert("expertise".to_string(), request.expertise.clone());
        self.rendered(&self.stages.chapter, &vars)
    }

    fn variant_mismatch(&self, stage: &Stage) -> FortellError {
        FortellError::Stage(
            stage.name.to_string(),
            "runner returned an undeclared output variant".to_string(),
        )
    }
}

/// Assign the even time budget to a freshly planned table of contents.
fn budgeted(mut plan: TableOfContents, total_minutes: u32) -> TableOfContents {
    let allocations = budget::allocate_minutes(total_minutes, plan.chapters.len());
    for (chapter, minutes) in plan.chapters.iter_mut().zip(allocations) {
        chapter.allocated_minutes = minutes;
    }
    plan
}

/// Render fractional minutes without trailing noise (5 -> "5", 3.33... -> "3.3").
fn format_minutes(minutes: f64) -> String {
    if (minutes - minutes.round()).abs() < 1e-9 {
        format!("{}", minutes.round() as u64)
    } else {
        format!("{:.1}", minutes)
    }
}

/// Phrase an ordered file list the way the fetch instructions expect
/// ("'a.txt', then 'b.txt', and finally 'c.txt'").
fn ordered_list_phrase(files: &[String]) -> String {
    match files {
        [] => String::new(),
        [only] => format!("'{}'", only),
        [head @ .., last] => {
            let mut phrase = String::new();
            for (i, file) in head.iter().enumerate() {
                if i == 0 {
                    phrase.push_str(&format!("'{}'", file));
                } else {
                    phrase.push_str(&format!(", then '{}'", file));
                }
            }
            phrase.push_str(&format!(", and finally '{}'", last));
            phrase
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{
        ChapteredScript, ChapterScript, DraftScript, FetchedContent, RefinedScript,
    };
    use async_trait::async_trait;

    /// Scripted runner that answers each stage kind with a canned output.
    struct ScriptedRunner {
        chapters: usize,
    }

    #[async_trait]
    impl StageRunner for ScriptedRunner {
        async fn run(&self, stage: &Stage, input: &str) -> Result<StageOutput> {
            let output = match stage.kind {
                StageKind::Fetch => StageOutput::Fetched(FetchedContent {
                    combined_text: "source material".to_string(),
                    original_request: input.to_string(),
                }),
                StageKind::Draft => StageOutput::Draft(DraftScript {
                    script_text: "draft".to_string(),
                    original_request: "req".to_string(),
                }),
                StageKind::Refine => StageOutput::Refined(RefinedScript {
                    refined_script_text: "refined".to_string(),
                    original_request: "req".to_string(),
                }),
                StageKind::Chapterize => StageOutput::Chaptered(ChapteredScript {
                    script_in_chapters: "Chapter One\n\nChapter Two".to_string(),
                }),
                StageKind::Plan => StageOutput::Plan(TableOfContents {
                    chapters: (1..=self.chapters)
                        .map(|i| ChapterPlan {
                            title: format!("Chapter {}", i),
                            description: format!("About part {}", i),
                            allocated_minutes: 0.0,
                        })
                        .collect(),
                }),
                StageKind::Chapter => {
                    // Chapter number is visible in the rendered instructions
                    let number = stage
                        .instructions
                        .split("Chapter ")
                        .nth(1)
                        .and_then(|rest| rest.split('\'').next())
                        .unwrap_or("?")
                        .trim()
                        .to_string();
                    StageOutput::Chapter(ChapterScript {
                        text: format!("ch{}p1\n\nch{}p2", number, number),
                    })
                }
            };
            Ok(output)
        }
    }

    /// Runner whose first stage reply has the wrong shape.
    struct WrongShapeRunner;

    #[async_trait]
    impl StageRunner for WrongShapeRunner {
        async fn run(&self, stage: &Stage, _input: &str) -> Result<StageOutput> {
            Err(FortellError::StageShape {
                stage: stage.name.to_string(),
                output: "just a plain string".to_string(),
            })
        }
    }

    struct EchoSynthesizer;

    #[async_trait]
    impl crate::speech::SpeechSynthesizer for EchoSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(format!("[{}]", text).into_bytes())
        }
    }

    fn test_settings(topology: Topology) -> Settings {
        let data_dir = tempfile::tempdir().unwrap().keep();
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();
        settings.script.topology = topology;
        settings
    }

    fn orchestrator(topology: Topology, runner: Arc<dyn StageRunner>) -> Orchestrator {
        Orchestrator::with_components(
            test_settings(topology),
            Prompts::default(),
            runner,
            Arc::new(EchoSynthesizer),
        )
        .unwrap()
    }

    #[test]
    fn test_artifact_path_is_deterministic() {
        let orch = orchestrator(Topology::Linear, Arc::new(ScriptedRunner { chapters: 0 }));
        let id = Uuid::new_v4();
        assert_eq!(orch.artifact_path(id), orch.artifact_path(id));
        assert!(orch
            .artifact_path(id)
            .to_string_lossy()
            .ends_with(&format!("{}.mp3", id)));
    }

    #[tokio::test]
    async fn test_linear_run_writes_artifact() {
        let orch = orchestrator(Topology::Linear, Arc::new(ScriptedRunner { chapters: 0 }));
        let request = GenerationRequest {
            topic: "Tulip Mania".to_string(),
            expertise: "PhD economist".to_string(),
            length_minutes: 15,
        };

        let handle = orch.generate(&request).await;
        assert_eq!(handle.status, ArtifactStatus::Complete);

        let bytes = std::fs::read(orch.artifact_path(handle.id)).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[Chapter One\n\nChapter Two]"
        );
    }

    #[tokio::test]
    async fn test_under_length_script_is_accepted() {
        // 15 minutes calls for 2250 words but the scripted chapterizer returns
        // far fewer. The floor is advisory to the stages; the run completes.
        let orch = orchestrator(Topology::Linear, Arc::new(ScriptedRunner { chapters: 0 }));
        let request = GenerationRequest {
            topic: "Tulip Mania".to_string(),
            expertise: "PhD economist".to_string(),
            length_minutes: 15,
        };

        let handle = orch.generate(&request).await;
        assert_eq!(handle.status, ArtifactStatus::Complete);

        let bytes = std::fs::read(orch.artifact_path(handle.id)).unwrap();
        let words = String::from_utf8(bytes).unwrap().split_whitespace().count();
        assert!(words < budget::target_words(15) as usize);
    }

    #[tokio::test]
    async fn test_planned_run_orders_chapters() {
        let orch = orchestrator(Topology::Planned, Arc::new(ScriptedRunner { chapters: 3 }));
        let request = GenerationRequest {
            topic: "Tulip Mania".to_string(),
            expertise: "novice".to_string(),
            length_minutes: 15,
        };

        let handle = orch.generate(&request).await;
        assert_eq!(handle.status, ArtifactStatus::Complete);

        let bytes = std::fs::read(orch.artifact_path(handle.id)).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[ch1p1\n\nch1p2][ch2p1\n\nch2p2][ch3p1\n\nch3p2]"
        );
    }

    #[tokio::test]
    async fn test_wrong_shape_fails_run_without_artifact() {
        let orch = orchestrator(Topology::Linear, Arc::new(WrongShapeRunner));
        let request = GenerationRequest {
            topic: "Tulip Mania".to_string(),
            expertise: "novice".to_string(),
            length_minutes: 5,
        };

        let handle = orch.generate(&request).await;
        match &handle.status {
            ArtifactStatus::Failed(reason) => {
                assert!(reason.contains("wrong shape"));
                assert!(reason.contains("plain string"));
            }
            other => panic!("Expected Failed status, got {:?}", other),
        }
        assert!(!orch.artifact_path(handle.id).exists());
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let orch = orchestrator(Topology::Linear, Arc::new(ScriptedRunner { chapters: 0 }));
        let request = GenerationRequest {
            topic: "Anything".to_string(),
            expertise: "novice".to_string(),
            length_minutes: 0,
        };

        let handle = orch.generate(&request).await;
        assert!(matches!(handle.status, ArtifactStatus::Failed(_)));
    }

    #[test]
    fn test_budgeted_allocations_sum_to_total() {
        let plan = TableOfContents {
            chapters: (0..3)
                .map(|i| ChapterPlan {
                    title: format!("C{}", i),
                    description: String::new(),
                    allocated_minutes: 0.0,
                })
                .collect(),
        };
        let toc = budgeted(plan, 15);
        let sum: f64 = toc.chapters.iter().map(|c| c.allocated_minutes).sum();
        assert_eq!(sum, 15.0);
        assert!(toc.chapters.iter().all(|c| c.allocated_minutes == 5.0));
    }

    #[test]
    fn test_ordered_list_phrase() {
        let files = vec![
            "investopedia.txt".to_string(),
            "kremp.txt".to_string(),
            "wikipedia.txt".to_string(),
        ];
        assert_eq!(
            ordered_list_phrase(&files),
            "'investopedia.txt', then 'kremp.txt', and finally 'wikipedia.txt'"
        );
        assert_eq!(ordered_list_phrase(&files[..1]), "'investopedia.txt'");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(5.0), "5");
        assert_eq!(format_minutes(10.0 / 3.0), "3.3");
    }
}
