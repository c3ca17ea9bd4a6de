pub mod api;
pub mod compose;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod init;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod request;
pub mod workspace;

pub use config::Config;
pub use error::{PipelineError, Stage};
pub use pipeline::{ComposedOutput, Pipeline};
pub use request::{Language, Request};

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!(tag, "{}", message),
        _ => tracing::info!(tag, "{}", message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
