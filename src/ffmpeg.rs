use crate::compose::AudioMix;
use crate::logi;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to spawn {}", args[0]))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let snippet = stderr.trim().chars().take(600).collect::<String>();
        return Err(anyhow::anyhow!(
            "{} exited with {}: {}",
            args[0],
            output.status,
            snippet
        ));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    ffprobe_entry(path, &[], "format=duration").await
}

/// Duration of the first audio stream, independent of the container length.
pub async fn ffprobe_audio_duration_seconds(path: &Path) -> Result<f64> {
    ffprobe_entry(path, &["-select_streams", "a:0"], "stream=duration").await
}

async fn ffprobe_entry(path: &Path, select: &[&str], entry: &str) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(select)
        .args([
            "-show_entries",
            entry,
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .with_context(|| format!("ffprobe {entry} failed"))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    text.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .parse::<f64>()
        .with_context(|| format!("ffprobe reported no {entry} ({text:?})"))
}

/// Replays the clips named in `list_txt` back to back and cuts the result at
/// `target_s`. Audio in the source clip is dropped.
pub async fn ffmpeg_loop_and_trim(list_txt: &Path, target_s: f64, out_mp4: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", target_s),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Mixes narration and music per `mix` and attaches the result to `video_in`.
pub async fn ffmpeg_compose_and_mux(
    video_in: &Path,
    narration_in: &Path,
    music_in: &Path,
    mix: &AudioMix,
    out_mp4: &Path,
) -> Result<bool> {
    let filter = mix.filter_graph(1, 2);
    logi(format!("Audio filter: {}", filter));

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video_in.display().to_string(),
        "-i".to_string(),
        narration_in.display().to_string(),
        "-i".to_string(),
        music_in.display().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        format!("[{}]", AudioMix::OUTPUT_LABEL),
        "-t".to_string(),
        format!("{:.3}", mix.target),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}
