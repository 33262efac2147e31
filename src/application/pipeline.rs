//! The dubbing pipeline: one job from source video to merged dub.
//!
//! Stages run strictly in order, each awaiting the previous one:
//!
//! ```text
//! START -> EXTRACT -> [ENHANCE?] -> TRANSCRIBE -> TRANSLATE -> SYNTHESIZE -> [MERGE?] -> DONE
//! ```
//!
//! Only a missing source or a failed audio extraction is fatal. Every later
//! stage produces a user-visible artifact on its own, so its failure is
//! tolerated: the stage leaves a marker file next to the job's stem, the
//! remaining stages run against the best input still available, and the job
//! completes.

use crate::config::Settings;
use crate::domain::artifacts::ArtifactSet;
use crate::domain::jobs::{JobData, JobResult, MergeMode};
use crate::domain::subtitles;
use crate::domain::transcript::{normalize, Transcript};
use crate::ports::media::{MediaToolPort, MergeSpec};
use crate::ports::progress::ProgressSink;
use crate::ports::providers::{SpeechSynthesizer, SpeechToText, SynthesisOptions, Translator};
use crate::retry::{retry, RetryOpts};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Fatal pipeline failures. Everything else is tolerated in-stage.
#[derive(Debug)]
pub enum PipelineError {
    SourceMissing(PathBuf),
    Extract(String),
    Artifact(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SourceMissing(path) => {
                write!(f, "source file missing: {}", path.display())
            }
            PipelineError::Extract(e) => write!(f, "audio extraction failed: {}", e),
            PipelineError::Artifact(e) => write!(f, "artifact write failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

pub struct Pipeline {
    asr: Arc<dyn SpeechToText>,
    translator: Arc<dyn Translator>,
    tts: Arc<dyn SpeechSynthesizer>,
    media: Arc<dyn MediaToolPort>,
    settings: Arc<Settings>,
    retry_opts: RetryOpts,
}

impl Pipeline {
    pub fn new(
        asr: Arc<dyn SpeechToText>,
        translator: Arc<dyn Translator>,
        tts: Arc<dyn SpeechSynthesizer>,
        media: Arc<dyn MediaToolPort>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            asr,
            translator,
            tts,
            media,
            settings,
            retry_opts: RetryOpts::provider(),
        }
    }

    /// Override the backoff budget. Test use.
    pub fn with_retry(self, retry_opts: RetryOpts) -> Self {
        Self { retry_opts, ..self }
    }

    /// Execute every stage for one job and assemble its result from the
    /// artifacts that made it to disk.
    pub async fn run(
        &self,
        data: &JobData,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<JobResult, PipelineError> {
        let source = &data.source_path;
        progress.report(0);

        if tokio::fs::metadata(source).await.is_err() {
            return Err(PipelineError::SourceMissing(source.clone()));
        }

        let artifacts = ArtifactSet::new(source);
        let merge_mode = data.merge_mode.unwrap_or(self.settings.merge_mode);
        let burn = data.burn_subtitles.unwrap_or(self.settings.burn_subtitles);
        let enhance = data.enhance.unwrap_or(self.settings.enhance);

        // EXTRACT (fatal on failure)
        let audio_path = artifacts.audio();
        let extract_scale: u16 = if enhance { 15 } else { 20 };
        retry(self.retry_opts, || {
            let sink = progress.clone();
            self.media.extract_audio(
                source,
                &audio_path,
                Box::new(move |pct| sink.report((pct as u16 * extract_scale / 100) as u8)),
            )
        })
        .await
        .map_err(|e| PipelineError::Extract(e.to_string()))?;

        // ENHANCE (tolerated)
        let mut working_audio = audio_path.clone();
        if enhance {
            progress.report(15);
            let enhanced = artifacts.enhanced_audio();
            match retry(self.retry_opts, || {
                self.media.denoise(&audio_path, &enhanced)
            })
            .await
            {
                Ok(()) => working_audio = enhanced,
                Err(e) => {
                    warn!("enhance failed, using original audio: {}", e);
                    write_marker(
                        &artifacts.enhance_error_marker(),
                        &format!("enhance failed: {}", e),
                    )
                    .await;
                }
            }
        }
        progress.report(20);

        // TRANSCRIBE (tolerated)
        let mut asr_input = working_audio.clone();
        if self.settings.asr_convert {
            let converted = artifacts.asr_audio();
            match retry(self.retry_opts, || {
                self.media.convert_for_asr(&working_audio, &converted)
            })
            .await
            {
                Ok(()) => asr_input = converted,
                Err(e) => warn!("ASR conversion failed, sending extracted audio: {}", e),
            }
        }

        let (transcript, asr_failed) =
            match retry(self.retry_opts, || self.asr.transcribe(&asr_input)).await {
                Ok(raw) => (normalize(&raw), false),
                Err(e) => (Transcript::from_text(format!("ASR error: {}", e)), true),
            };

        let transcript_file = if asr_failed {
            transcript.text.clone()
        } else {
            format!(
                "TRANSCRIPT\nSource: {}\n\n{}",
                data.original_name, transcript.text
            )
        };
        write_artifact(&artifacts.transcript(), transcript_file.as_bytes()).await?;
        let sidecar = serde_json::to_string_pretty(&transcript)
            .map_err(|e| PipelineError::Artifact(e.to_string()))?;
        write_artifact(&artifacts.transcript_sidecar(), sidecar.as_bytes()).await?;
        progress.report(25);

        // TRANSLATE (tolerated)
        let target = &self.settings.translate_target;
        let (translated, translate_failed) = match retry(self.retry_opts, || {
            self.translator.translate(&transcript.text, target)
        })
        .await
        {
            Ok(text) => (text, false),
            Err(e) => (format!("TRANSLATION error: {}", e), true),
        };
        write_artifact(&artifacts.translated(), translated.as_bytes()).await?;
        progress.report(45);

        // SYNTHESIZE (tolerated; merge needs its output)
        progress.report(55);
        let dub_text = if translate_failed {
            &transcript.text
        } else {
            &translated
        };
        let tts_path = artifacts.tts();
        let opts = SynthesisOptions {
            language_code: tts_language_for(target, &self.settings.tts_language),
            voice: self.settings.tts_voice.clone(),
        };
        let tts_ok = match retry(self.retry_opts, || {
            self.tts.synthesize(dub_text, &tts_path, &opts)
        })
        .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("synthesis failed, skipping merge: {}", e);
                write_marker(
                    &artifacts.tts_error_marker(),
                    &format!("synthesis failed: {}", e),
                )
                .await;
                false
            }
        };
        progress.report(85);

        // MERGE (tolerated)
        let mut merged = false;
        if tts_ok {
            merged = self
                .merge_stage(
                    data, &artifacts, &tts_path, dub_text, &transcript, merge_mode, burn,
                    progress.clone(),
                )
                .await;
        }

        // FINALIZE: only what actually exists on disk goes into the result.
        let result = JobResult {
            audio: existing(artifacts.audio()).await,
            enhanced_audio: existing(artifacts.enhanced_audio()).await,
            transcript: existing(artifacts.transcript()).await,
            translated: existing(artifacts.translated()).await,
            tts: existing(artifacts.tts()).await,
            dubbed: if merged {
                existing(artifacts.dubbed()).await
            } else {
                None
            },
        };
        progress.report(100);
        Ok(result)
    }

    /// Probe, optionally build subtitles, and merge. Returns whether the
    /// dubbed output was produced; all failures in here are tolerated.
    #[allow(clippy::too_many_arguments)]
    async fn merge_stage(
        &self,
        data: &JobData,
        artifacts: &ArtifactSet,
        tts_path: &Path,
        dub_text: &str,
        transcript: &Transcript,
        merge_mode: MergeMode,
        burn: bool,
        progress: Arc<dyn ProgressSink>,
    ) -> bool {
        let info = match retry(self.retry_opts, || self.media.probe(&data.source_path)).await {
            Ok(info) => info,
            Err(e) => {
                warn!("probe failed, skipping merge: {}", e);
                write_marker(
                    &artifacts.merge_error_marker(),
                    &format!("probe failed: {}", e),
                )
                .await;
                return false;
            }
        };

        if !info.has_video() {
            write_marker(
                &artifacts.merge_skip_marker(),
                "source has no video stream; nothing to merge",
            )
            .await;
            return false;
        }

        let mut srt_path = None;
        if burn {
            let total_seconds = info.duration_sec.max(1.0);
            let cues = subtitles::build(
                transcript,
                dub_text,
                total_seconds,
                &self.settings.srt_limits,
            );
            let srt = subtitles::render(&cues);
            let path = artifacts.subtitles();
            if let Err(e) = tokio::fs::write(&path, srt).await {
                warn!("subtitle write failed, merging without burn: {}", e);
            } else {
                // The subtitles filter needs an absolute path.
                srt_path = Some(tokio::fs::canonicalize(&path).await.unwrap_or(path));
            }
        }

        progress.report(90);

        let tts_duration = if merge_mode == MergeMode::Mix {
            match retry(self.retry_opts, || self.media.probe(tts_path)).await {
                Ok(tts_info) => tts_info.duration_sec,
                // Zero duration produces a zero-length fade, still valid.
                Err(_) => 0.0,
            }
        } else {
            0.0
        };

        let spec = MergeSpec {
            video: data.source_path.clone(),
            tts_audio: tts_path.to_path_buf(),
            output: artifacts.dubbed(),
            mode: merge_mode,
            tts_duration,
            subtitles: srt_path,
        };
        match retry(self.retry_opts, || self.media.merge(&spec)).await {
            Ok(()) => {
                progress.report(95);
                true
            }
            Err(e) => {
                warn!("merge failed: {}", e);
                write_marker(
                    &artifacts.merge_error_marker(),
                    &format!("merge failed: {}", e),
                )
                .await;
                false
            }
        }
    }
}

/// TTS language code for a translation target. Unknown targets fall through
/// to the configured default.
fn tts_language_for(target: &str, default: &str) -> String {
    let code = match target.to_ascii_lowercase().as_str() {
        "id" => "id-ID",
        "en" => "en-US",
        "ja" => "ja-JP",
        "ko" => "ko-KR",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "es" => "es-ES",
        "pt" => "pt-BR",
        "hi" => "hi-IN",
        _ => return default.to_string(),
    };
    code.to_string()
}

/// Essential artifact writes fail the job; markers below are best-effort.
async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| PipelineError::Artifact(format!("{}: {}", path.display(), e)))
}

async fn write_marker(path: &Path, message: &str) {
    if let Err(e) = tokio::fs::write(path, message).await {
        warn!("could not write marker {}: {}", path.display(), e);
    }
}

async fn existing(path: PathBuf) -> Option<PathBuf> {
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Some(path),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::media::{MediaInfo, MockMediaToolPort, StreamKind};
    use crate::ports::providers::{
        MockSpeechSynthesizer, MockSpeechToText, MockTranslator,
    };
    use serde_json::json;
    use std::sync::Mutex;

    /// Collects raw progress reports for monotonicity assertions.
    struct CollectSink(Mutex<Vec<u8>>);

    impl CollectSink {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn reports(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressSink for CollectSink {
        fn report(&self, pct: u8) {
            self.0.lock().unwrap().push(pct);
        }
    }

    fn video_info() -> MediaInfo {
        MediaInfo {
            duration_sec: 5.0,
            streams: vec![StreamKind::Video, StreamKind::Audio],
        }
    }

    fn audio_only_info() -> MediaInfo {
        MediaInfo {
            duration_sec: 5.0,
            streams: vec![StreamKind::Audio],
        }
    }

    /// Mocks for a fully successful run; individual tests override pieces.
    struct Fixture {
        asr: MockSpeechToText,
        translator: MockTranslator,
        tts: MockSpeechSynthesizer,
        media: MockMediaToolPort,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let mut asr = MockSpeechToText::new();
            asr.expect_transcribe()
                .returning(|_| Ok(json!("hello world")));

            let mut translator = MockTranslator::new();
            translator
                .expect_translate()
                .returning(|text, target| Ok(format!("[{}] {}", target, text)));

            let mut tts = MockSpeechSynthesizer::new();
            tts.expect_synthesize().returning(|_, out, _| {
                std::fs::write(out, b"mp3").unwrap();
                Ok(())
            });

            let mut media = MockMediaToolPort::new();
            media.expect_extract_audio().returning(|_, out, cb| {
                std::fs::write(out, b"wav").unwrap();
                cb(50);
                cb(100);
                Ok(())
            });
            media.expect_probe().returning(|_| Ok(video_info()));
            media.expect_merge().returning(|spec| {
                std::fs::write(&spec.output, b"mp4").unwrap();
                Ok(())
            });

            Self {
                asr,
                translator,
                tts,
                media,
                settings: Settings::for_tests(),
            }
        }

        fn pipeline(self) -> Pipeline {
            Pipeline::new(
                Arc::new(self.asr),
                Arc::new(self.translator),
                Arc::new(self.tts),
                Arc::new(self.media),
                Arc::new(self.settings),
            )
            .with_retry(RetryOpts::immediate(0))
        }
    }

    fn job_data(dir: &tempfile::TempDir, name: &str) -> JobData {
        let source = dir.path().join(name);
        std::fs::write(&source, b"fake video bytes").unwrap();
        JobData {
            source_path: source,
            original_name: name.to_string(),
            merge_mode: None,
            burn_subtitles: None,
            enhance: None,
        }
    }

    #[tokio::test]
    async fn test_happy_path_produces_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let pipeline = Fixture::new().pipeline();
        let sink = CollectSink::new();

        let result = pipeline.run(&data, sink.clone()).await.unwrap();

        assert!(result.audio.is_some());
        assert!(result.transcript.is_some());
        assert!(result.translated.is_some());
        assert!(result.tts.is_some());
        assert!(result.dubbed.is_some());
        assert!(result.enhanced_audio.is_none());

        let transcript = std::fs::read_to_string(result.transcript.unwrap()).unwrap();
        assert!(transcript.starts_with("TRANSCRIPT\nSource: clip.mp4"));
        assert!(transcript.ends_with("hello world"));

        let translated = std::fs::read_to_string(result.translated.unwrap()).unwrap();
        assert_eq!(translated, "[id] hello world");

        // sidecar is pretty-printed canonical JSON
        let sidecar = std::fs::read_to_string(dir.path().join("clip-transcript.txt.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(value["text"], "hello world");
        assert!(value["segments"].is_array());

        let reports = sink.reports();
        assert_eq!(*reports.last().unwrap(), 100);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]), "{:?}", reports);
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let pipeline = Fixture::new().pipeline();
        let data = JobData {
            source_path: PathBuf::from("/nowhere/clip.mp4"),
            original_name: "clip.mp4".into(),
            merge_mode: None,
            burn_subtitles: None,
            enhance: None,
        };
        let err = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_extract_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let mut fixture = Fixture::new();
        fixture.media = MockMediaToolPort::new();
        fixture
            .media
            .expect_extract_audio()
            .returning(|_, _, _| Err("no audio codec".into()));
        let pipeline = fixture.pipeline();

        let err = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extract(_)));
    }

    #[tokio::test]
    async fn test_asr_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let mut fixture = Fixture::new();
        fixture.asr = MockSpeechToText::new();
        fixture
            .asr
            .expect_transcribe()
            .returning(|_| Err("speech service unavailable".into()));
        // translation still runs, over the error text
        fixture.translator = MockTranslator::new();
        fixture
            .translator
            .expect_translate()
            .withf(|text, _| text.starts_with("ASR error:"))
            .returning(|text, target| Ok(format!("[{}] {}", target, text)));
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();

        let transcript = std::fs::read_to_string(result.transcript.unwrap()).unwrap();
        assert!(transcript.starts_with("ASR error:"));
        // downstream artifacts were still attempted
        assert!(result.translated.is_some());
        assert!(result.tts.is_some());
        assert!(result.dubbed.is_some());
    }

    #[tokio::test]
    async fn test_translate_failure_falls_back_to_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let mut fixture = Fixture::new();
        fixture.translator = MockTranslator::new();
        fixture
            .translator
            .expect_translate()
            .returning(|_, _| Err("quota exceeded".into()));
        // TTS must receive the transcript text, not the error string
        fixture.tts = MockSpeechSynthesizer::new();
        fixture
            .tts
            .expect_synthesize()
            .withf(|text, _, _| text == "hello world")
            .returning(|_, out, _| {
                std::fs::write(out, b"mp3").unwrap();
                Ok(())
            });
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();

        let translated = std::fs::read_to_string(result.translated.unwrap()).unwrap();
        assert!(translated.starts_with("TRANSLATION error:"));
    }

    #[tokio::test]
    async fn test_tts_failure_skips_merge() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let mut fixture = Fixture::new();
        fixture.tts = MockSpeechSynthesizer::new();
        fixture
            .tts
            .expect_synthesize()
            .returning(|_, _, _| Err("voice not found".into()));
        fixture.media = MockMediaToolPort::new();
        fixture.media.expect_extract_audio().returning(|_, out, _| {
            std::fs::write(out, b"wav").unwrap();
            Ok(())
        });
        // no probe/merge expectations: the merge stage must not run
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();

        assert!(result.tts.is_none());
        assert!(result.dubbed.is_none());
        let marker = dir.path().join("clip-tts.mp3.error.txt");
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_audio_only_source_skips_merge_with_marker() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "voice.wav");
        let mut fixture = Fixture::new();
        fixture.media = MockMediaToolPort::new();
        fixture.media.expect_extract_audio().returning(|_, out, _| {
            std::fs::write(out, b"wav").unwrap();
            Ok(())
        });
        fixture
            .media
            .expect_probe()
            .returning(|_| Ok(audio_only_info()));
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();

        assert!(result.dubbed.is_none());
        assert!(dir.path().join("voice-merge.skip.txt").exists());
    }

    #[tokio::test]
    async fn test_merge_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let data = job_data(&dir, "clip.mp4");
        let mut fixture = Fixture::new();
        fixture.media = MockMediaToolPort::new();
        fixture.media.expect_extract_audio().returning(|_, out, _| {
            std::fs::write(out, b"wav").unwrap();
            Ok(())
        });
        fixture.media.expect_probe().returning(|_| Ok(video_info()));
        fixture
            .media
            .expect_merge()
            .returning(|_| Err("container mismatch".into()));
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();

        assert!(result.dubbed.is_none());
        assert!(dir.path().join("clip-merge.error.txt").exists());
        // the job still completed with its upstream artifacts
        assert!(result.transcript.is_some());
        assert!(result.tts.is_some());
    }

    #[tokio::test]
    async fn test_enhance_success_feeds_denoised_audio_to_asr() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = job_data(&dir, "clip.mp4");
        data.enhance = Some(true);
        let mut fixture = Fixture::new();
        fixture.media.expect_denoise().returning(|_, out| {
            std::fs::write(out, b"clean wav").unwrap();
            Ok(())
        });
        fixture.asr = MockSpeechToText::new();
        fixture
            .asr
            .expect_transcribe()
            .withf(|path| path.to_string_lossy().contains("-audio-enhanced"))
            .returning(|_| Ok(json!("hello world")));
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();
        assert!(result.enhanced_audio.is_some());
    }

    #[tokio::test]
    async fn test_enhance_failure_uses_original_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = job_data(&dir, "clip.mp4");
        data.enhance = Some(true);
        let mut fixture = Fixture::new();
        fixture
            .media
            .expect_denoise()
            .returning(|_, _| Err("afftdn unavailable".into()));
        fixture.asr = MockSpeechToText::new();
        fixture
            .asr
            .expect_transcribe()
            .withf(|path| path.to_string_lossy().ends_with("clip-audio.wav"))
            .returning(|_| Ok(json!("hello world")));
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();
        assert!(result.enhanced_audio.is_none());
        assert!(dir.path().join("clip-enhance.error.txt").exists());
    }

    #[tokio::test]
    async fn test_word_timed_subtitles_are_burned() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = job_data(&dir, "clip.mp4");
        data.burn_subtitles = Some(true);

        // ShapeA payload: 20 words spanning 10 seconds
        let words: Vec<serde_json::Value> = (0..20)
            .map(|i| {
                json!({
                    "word": format!("word{:02}", i),
                    "start": i as f64 * 0.5,
                    "end": i as f64 * 0.5 + 0.5,
                })
            })
            .collect();
        let payload = json!({
            "text": "twenty words of speech",
            "segments": [{"text": "twenty words of speech", "start": 0.0, "end": 10.0, "words": words}]
        });

        let mut fixture = Fixture::new();
        fixture.asr = MockSpeechToText::new();
        fixture
            .asr
            .expect_transcribe()
            .returning(move |_| Ok(payload.clone()));
        // the merge command must carry the subtitles filter input
        fixture.media = MockMediaToolPort::new();
        fixture.media.expect_extract_audio().returning(|_, out, _| {
            std::fs::write(out, b"wav").unwrap();
            Ok(())
        });
        fixture.media.expect_probe().returning(|_| Ok(video_info()));
        fixture
            .media
            .expect_merge()
            .withf(|spec| spec.subtitles.is_some())
            .returning(|spec| {
                std::fs::write(&spec.output, b"mp4").unwrap();
                Ok(())
            });
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();
        assert!(result.dubbed.is_some());

        let srt = std::fs::read_to_string(dir.path().join("clip.srt")).unwrap();
        let cue_texts: Vec<&str> = srt
            .split("\n\n")
            .filter(|block| !block.trim().is_empty())
            .map(|block| block.lines().nth(2).unwrap())
            .collect();
        let all_words: Vec<&str> = cue_texts
            .iter()
            .flat_map(|t| t.split_whitespace())
            .collect();
        assert_eq!(all_words.len(), 20);
        assert_eq!(all_words[0], "word00");
        assert_eq!(all_words[19], "word19");
        for text in &cue_texts {
            assert!(text.split_whitespace().count() <= 7);
            assert!(text.chars().count() <= 80);
        }
    }

    #[tokio::test]
    async fn test_mix_mode_probes_tts_duration() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = job_data(&dir, "clip.mp4");
        data.merge_mode = Some(MergeMode::Mix);

        let mut fixture = Fixture::new();
        fixture.media = MockMediaToolPort::new();
        fixture.media.expect_extract_audio().returning(|_, out, _| {
            std::fs::write(out, b"wav").unwrap();
            Ok(())
        });
        fixture.media.expect_probe().returning(|path| {
            if path.to_string_lossy().ends_with("-tts.mp3") {
                Ok(MediaInfo {
                    duration_sec: 6.0,
                    streams: vec![StreamKind::Audio],
                })
            } else {
                Ok(video_info())
            }
        });
        fixture
            .media
            .expect_merge()
            .withf(|spec| spec.mode == MergeMode::Mix && spec.tts_duration == 6.0)
            .returning(|spec| {
                std::fs::write(&spec.output, b"mp4").unwrap();
                Ok(())
            });
        let pipeline = fixture.pipeline();

        let result = pipeline
            .run(&data, Arc::new(crate::ports::progress::NullSink))
            .await
            .unwrap();
        assert!(result.dubbed.is_some());
    }

    #[test]
    fn test_tts_language_mapping() {
        assert_eq!(tts_language_for("id", "id-ID"), "id-ID");
        assert_eq!(tts_language_for("en", "id-ID"), "en-US");
        assert_eq!(tts_language_for("ja", "id-ID"), "ja-JP");
        // unknown targets fall through to the configured default
        assert_eq!(tts_language_for("sw", "id-ID"), "id-ID");
    }
}
