//! Sequential synthesis and stitching of audio segments.

use super::SpeechSynthesizer;
use crate::error::{FortellError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Synthesizes text chunks in order and stitches the segments into one
/// artifact file.
pub struct AudioAssembler {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AudioAssembler {
    /// Create an assembler over a speech synthesizer.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    /// Synthesize every chunk of every unit and write the stitched audio to
    /// `artifact_path`.
    ///
    /// `units` is the ordered list of narration units (one per chapter, or a
    /// single unit for a continuous script), each an ordered list of text
    /// chunks. Segment order in the artifact equals chunk order within each
    /// unit, and unit order across units.
    ///
    /// Per-chunk work happens in a scoped temporary directory that is removed
    /// on every exit path; the artifact file only exists if the whole
    /// assembly succeeded.
    #[instrument(skip(self, units), fields(units = units.len()))]
    pub async fn assemble(&self, units: &[Vec<String>], artifact_path: &Path) -> Result<()> {
        if units.iter().all(|unit| unit.is_empty()) {
            return Err(FortellError::Assembly(
                "no text chunks to synthesize".to_string(),
            ));
        }

        let parent = artifact_path
            .parent()
            .ok_or_else(|| FortellError::Assembly("artifact path has no parent".to_string()))?;
        std::fs::create_dir_all(parent)?;

        // Removed on drop, whether or not synthesis succeeds
        let temp_dir = tempfile::Builder::new()
            .prefix("fortell-")
            .tempdir_in(parent)?;

        let stitched = self.assemble_in(units, temp_dir.path()).await?;
        tokio::fs::write(artifact_path, &stitched).await?;

        info!(
            "Wrote artifact {} ({} bytes)",
            artifact_path.display(),
            stitched.len()
        );

        temp_dir.close()?;
        Ok(())
    }

    /// Synthesize and stitch within an existing working directory.
    async fn assemble_in(&self, units: &[Vec<String>], work_dir: &Path) -> Result<Vec<u8>> {
        let mut unit_segments: Vec<Vec<u8>> = Vec::with_capacity(units.len());

        for (unit_index, chunks) in units.iter().enumerate() {
            let mut segments: Vec<Vec<u8>> = Vec::with_capacity(chunks.len());

            for (chunk_index, chunk) in chunks.iter().enumerate() {
                debug!(
                    "Synthesizing unit {} chunk {} ({} chars)",
                    unit_index,
                    chunk_index,
                    chunk.chars().count()
                );

                let audio = self.synthesizer.synthesize(chunk).await?;

                let chunk_path =
                    work_dir.join(format!("unit{:03}-part{:03}.mp3", unit_index, chunk_index));
                tokio::fs::write(&chunk_path, &audio).await?;

                let segment = tokio::fs::read(&chunk_path).await?;
                segments.push(segment);
            }

            unit_segments.push(segments.concat());
        }

        Ok(unit_segments.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FortellError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the chunk text wrapped in brackets so ordering is observable.
    struct EchoSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for EchoSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(format!("[{}]", text).into_bytes())
        }
    }

    /// Fails once the configured number of calls is reached.
    struct FailingSynthesizer {
        calls: AtomicUsize,
        fail_at: usize,
    }

    #[async_trait]
    impl SpeechSynthesizer for FailingSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_at {
                return Err(FortellError::Synthesis("provider unavailable".to_string()));
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    fn chapter_units() -> Vec<Vec<String>> {
        vec![
            vec!["c1k1".to_string(), "c1k2".to_string()],
            vec!["c2k1".to_string(), "c2k2".to_string()],
            vec!["c3k1".to_string(), "c3k2".to_string()],
        ]
    }

    fn leftover_temp_dirs(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("fortell-"))
            .count()
    }

    #[tokio::test]
    async fn test_segments_concatenate_in_order() {
        let out = tempfile::tempdir().unwrap();
        let artifact = out.path().join("book.mp3");

        let assembler = AudioAssembler::new(Arc::new(EchoSynthesizer));
        assembler.assemble(&chapter_units(), &artifact).await.unwrap();

        let bytes = std::fs::read(&artifact).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[c1k1][c1k2][c2k1][c2k2][c3k1][c3k2]"
        );
    }

    #[tokio::test]
    async fn test_temp_dir_removed_after_success() {
        let out = tempfile::tempdir().unwrap();
        let artifact = out.path().join("book.mp3");

        let assembler = AudioAssembler::new(Arc::new(EchoSynthesizer));
        assembler.assemble(&chapter_units(), &artifact).await.unwrap();

        assert_eq!(leftover_temp_dirs(out.path()), 0);
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn test_failure_cleans_up_and_writes_no_artifact() {
        let out = tempfile::tempdir().unwrap();
        let artifact = out.path().join("book.mp3");

        let synthesizer = Arc::new(FailingSynthesizer {
            calls: AtomicUsize::new(0),
            fail_at: 3,
        });
        let assembler = AudioAssembler::new(synthesizer);

        let result = assembler.assemble(&chapter_units(), &artifact).await;
        assert!(result.is_err());
        assert!(!artifact.exists());
        assert_eq!(leftover_temp_dirs(out.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_units_rejected() {
        let out = tempfile::tempdir().unwrap();
        let artifact = out.path().join("book.mp3");

        let assembler = AudioAssembler::new(Arc::new(EchoSynthesizer));
        let result = assembler.assemble(&[Vec::new()], &artifact).await;
        assert!(result.is_err());
        assert!(!artifact.exists());
    }
}
