//! Narration over a background music bed.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MUSIC_GAIN: f64 = 0.3;

/// How a track shorter than the target is filled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackFit {
    #[default]
    SilencePad,
    Loop,
}

impl TrackFit {
    fn filter(&self) -> &'static str {
        match self {
            TrackFit::SilencePad => "apad",
            TrackFit::Loop => "aloop=loop=-1:size=2e+09",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMix {
    pub target: f64,
    pub music_gain: f64,
    pub track_fit: TrackFit,
}

impl AudioMix {
    pub const OUTPUT_LABEL: &'static str = "aout";

    pub fn new(target: f64, music_gain: f64, track_fit: TrackFit) -> Self {
        Self {
            target,
            music_gain,
            track_fit,
        }
    }

    /// Both inputs start at zero, are fit to exactly `target` seconds and are
    /// summed without amix's default 1/n scaling.
    pub fn filter_graph(&self, narration_input: usize, music_input: usize) -> String {
        let fit = self.track_fit.filter();
        let t = format!("{:.3}", self.target);
        format!(
            "[{narration_input}:a]{fit},atrim=0:{t},asetpts=N/SR/TB[narr];\
             [{music_input}:a]volume={gain:.3},{fit},atrim=0:{t},asetpts=N/SR/TB[bed];\
             [narr][bed]amix=inputs=2:duration=longest:normalize=0[{out}]",
            gain = self.music_gain,
            out = Self::OUTPUT_LABEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_trims_both_tracks_to_target() {
        let mix = AudioMix::new(8.0, DEFAULT_MUSIC_GAIN, TrackFit::SilencePad);
        let graph = mix.filter_graph(1, 2);
        assert_eq!(graph.matches("atrim=0:8.000").count(), 2);
        assert!(graph.starts_with("[1:a]apad,"));
        assert!(graph.contains("[2:a]volume=0.300,apad,"));
        assert!(graph.ends_with("[aout]"));
    }

    #[test]
    fn test_sum_is_not_normalized() {
        let graph = AudioMix::new(10.0, 0.3, TrackFit::SilencePad).filter_graph(1, 2);
        assert!(graph.contains("amix=inputs=2:duration=longest:normalize=0"));
    }

    #[test]
    fn test_narration_is_not_attenuated() {
        let graph = AudioMix::new(10.0, 0.3, TrackFit::SilencePad).filter_graph(1, 2);
        let narration_chain = graph.split(';').next().unwrap();
        assert!(!narration_chain.contains("volume"));
    }

    #[test]
    fn test_loop_fit() {
        let graph = AudioMix::new(12.5, 0.3, TrackFit::Loop).filter_graph(1, 2);
        assert_eq!(graph.matches("aloop=loop=-1").count(), 2);
        assert_eq!(graph.matches("atrim=0:12.500").count(), 2);
    }
}
