use crate::api::elevenlabs::ElevenLabsTts;
use crate::api::huggingface::HuggingFaceVideo;
use crate::api::music::RemoteMusic;
use crate::api::tts::GoogleTts;
use crate::api::{self, MusicSource, NarrationProvider, VideoProvider};
use crate::compose::AudioMix;
use crate::config::{Config, TtsBackend};
use crate::error::PipelineError;
use crate::ffmpeg;
use crate::init;
use crate::media::{MediaAsset, MediaKind};
use crate::normalize::LoopPlan;
use crate::request::{Language, Request};
use crate::workspace::Workspace;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One frame at 24 fps.
pub const DURATION_TOLERANCE_SECS: f64 = 1.0 / 24.0;

/// The finished clip. It lives inside the request workspace, so dropping it
/// reclaims every temporary file of the request.
#[derive(Debug)]
pub struct ComposedOutput {
    asset: MediaAsset,
    workspace: Workspace,
}

impl ComposedOutput {
    pub fn path(&self) -> &Path {
        self.asset.path()
    }

    pub fn duration(&self) -> f64 {
        self.asset.duration()
    }

    pub fn workspace_dir(&self) -> &Path {
        self.workspace.path()
    }

    /// Copies the clip to `dest`, creating parent directories as needed.
    pub async fn persist(&self, dest: &Path) -> Result<PathBuf> {
        init::ensure_parent_dir(dest).await?;
        fs::copy(self.path(), dest)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        Ok(dest.to_path_buf())
    }
}

pub struct Pipeline {
    config: Config,
    narrator: Box<dyn NarrationProvider>,
    video: Box<dyn VideoProvider>,
    music: Box<dyn MusicSource>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        narrator: Box<dyn NarrationProvider>,
        video: Box<dyn VideoProvider>,
        music: Box<dyn MusicSource>,
    ) -> Self {
        Self {
            config,
            narrator,
            video,
            music,
        }
    }

    /// Wires the HTTP providers described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = api::build_client()?;
        let timeouts = &config.timeouts;

        let narrator: Box<dyn NarrationProvider> = match config.tts.backend {
            TtsBackend::Google => Box::new(GoogleTts::new(client.clone(), timeouts.tts())),
            TtsBackend::ElevenLabs => Box::new(ElevenLabsTts::new(
                client.clone(),
                &config.tts,
                timeouts.tts(),
            )),
        };
        let video = Box::new(HuggingFaceVideo::new(
            client.clone(),
            config.video_endpoint.clone(),
            config.hf_token.clone(),
            config.generation.clone(),
            timeouts.video(),
        ));
        let music = Box::new(RemoteMusic::new(
            client,
            config.music_url.clone(),
            timeouts.music(),
        ));

        Ok(Self::new(config, narrator, video, music))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates the raw form values and runs the pipeline. Nothing remote is
    /// contacted when validation fails.
    pub async fn generate(
        &self,
        prompt: &str,
        language: Language,
        target_secs: u32,
    ) -> Result<ComposedOutput, PipelineError> {
        let request = Request::new(prompt, language, target_secs)?;
        self.run(&request).await
    }

    pub async fn run(&self, request: &Request) -> Result<ComposedOutput, PipelineError> {
        let workspace =
            Workspace::create(self.config.work_dir.as_deref()).map_err(PipelineError::Internal)?;
        logi(format!(
            "Generating {}s clip ({}) in {}",
            request.target_secs(),
            request.language(),
            workspace.path().display()
        ));

        logi("[1/4] Synthesizing narration...");
        let speech = self
            .narrator
            .synthesize(request.prompt(), request.language())
            .await
            .map_err(PipelineError::Narration)?;
        let narration_path = write_asset(&workspace, MediaKind::Narration, &speech).await?;
        logok(format!("Narration saved: {} bytes", speech.len()));

        logi("[2/4] Generating base clip...");
        let clip = self
            .video
            .generate(request.prompt())
            .await
            .map_err(PipelineError::Acquisition)?;
        let clip_path = write_asset(&workspace, MediaKind::SourceVideo, &clip).await?;
        let source = MediaAsset::probe(clip_path, MediaKind::SourceVideo).await?;
        logok(format!("Base clip: {:.2}s", source.duration()));

        logi("[3/4] Normalizing duration...");
        let normalized = self.normalize(&workspace, &source, request.target()).await?;

        logi("[4/4] Composing audio...");
        let music_bytes = self.music.fetch().await.map_err(PipelineError::Music)?;
        let music_path = write_asset(&workspace, MediaKind::Music, &music_bytes).await?;
        let narration = MediaAsset::probe(narration_path, MediaKind::Narration).await?;
        let music = MediaAsset::probe(music_path, MediaKind::Music).await?;
        logi(format!(
            "Narration {:.2}s, music {:.2}s, target {:.2}s",
            narration.duration(),
            music.duration(),
            request.target()
        ));

        let mix = AudioMix::new(
            request.target(),
            self.config.music_gain,
            self.config.track_fit,
        );
        let out_path = workspace.asset_path(MediaKind::Composed);
        let made = ffmpeg::ffmpeg_compose_and_mux(
            normalized.path(),
            narration.path(),
            music.path(),
            &mix,
            &out_path,
        )
        .await
        .map_err(PipelineError::Composition)?;
        if !made {
            return Err(PipelineError::Composition(anyhow::anyhow!(
                "ffmpeg produced no output"
            )));
        }

        let asset = MediaAsset::probe(out_path, MediaKind::Composed).await?;
        match duration_drift(asset.duration(), request.target()) {
            Some(drift) => logw(format!(
                "Composed clip is {:.3}s but target is {:.3}s (off by {:+.3}s)",
                asset.duration(),
                request.target(),
                drift
            )),
            None => logok(format!("Composed clip: {:.2}s", asset.duration())),
        }

        Ok(ComposedOutput { asset, workspace })
    }

    async fn normalize(
        &self,
        workspace: &Workspace,
        source: &MediaAsset,
        target: f64,
    ) -> Result<MediaAsset, PipelineError> {
        let plan = LoopPlan::new(source.duration(), target, self.config.loop_slack)?;
        if plan.is_truncation_only() {
            logi(format!(
                "Source {:.2}s covers target; truncating only",
                plan.source
            ));
        } else {
            logi(format!(
                "Looping {:.2}s source x{} ({:.2}s) then cutting at {:.2}s",
                plan.source,
                plan.repetitions,
                plan.covered(),
                plan.target
            ));
        }

        let list_path = workspace.path().join("loop_list.txt");
        fs::write(&list_path, plan.concat_list(source.path()))
            .await
            .context("Failed to write loop list")
            .map_err(PipelineError::Normalization)?;

        let out_path = workspace.asset_path(MediaKind::Normalized);
        let made = ffmpeg::ffmpeg_loop_and_trim(&list_path, plan.target, &out_path)
            .await
            .map_err(PipelineError::Normalization)?;
        if !made {
            return Err(PipelineError::Normalization(anyhow::anyhow!(
                "ffmpeg produced no output"
            )));
        }

        MediaAsset::probe(out_path, MediaKind::Normalized).await
    }
}

/// Signed difference from the target when it exceeds one frame.
pub fn duration_drift(actual: f64, target: f64) -> Option<f64> {
    let drift = actual - target;
    (drift.abs() > DURATION_TOLERANCE_SECS).then_some(drift)
}

async fn write_asset(
    workspace: &Workspace,
    kind: MediaKind,
    bytes: &[u8],
) -> Result<PathBuf, PipelineError> {
    workspace
        .write(kind, bytes)
        .await
        .with_context(|| format!("Failed to store {kind}"))
        .map_err(PipelineError::Internal)
}
