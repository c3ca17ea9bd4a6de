//! Stretching a short base clip to an exact target duration.
//!
//! The clip is replayed back to back enough times to cover the target and the
//! concatenation is then cut at the target. Playback speed is never touched.

use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_LOOP_SLACK: u32 = 2;
/// One frame at 100 fps.
pub const MIN_SOURCE_SECS: f64 = 0.01;
pub const MAX_REPETITIONS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("source clip has unusable duration {0}s")]
    DegenerateSource(f64),
    #[error("target duration {0}s must be positive")]
    InvalidTarget(f64),
    #[error("loop slack must be at least 1")]
    InvalidSlack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPlan {
    pub source: f64,
    pub target: f64,
    pub repetitions: u32,
}

impl LoopPlan {
    /// Plans `floor(target / source) + slack` replays when the source is
    /// shorter than the target, a single pass otherwise.
    pub fn new(source: f64, target: f64, slack: u32) -> Result<Self, NormalizeError> {
        if !source.is_finite() || source < MIN_SOURCE_SECS {
            return Err(NormalizeError::DegenerateSource(source));
        }
        if !target.is_finite() || target <= 0.0 {
            return Err(NormalizeError::InvalidTarget(target));
        }
        if slack == 0 {
            return Err(NormalizeError::InvalidSlack);
        }

        let planned = if source >= target {
            1.0
        } else {
            (target / source).floor() + f64::from(slack)
        };
        if planned > f64::from(MAX_REPETITIONS) {
            return Err(NormalizeError::DegenerateSource(source));
        }
        let mut repetitions = planned as u32;
        // float rounding in the division can leave the last replay a hair short
        while source * f64::from(repetitions) < target {
            if repetitions >= MAX_REPETITIONS {
                return Err(NormalizeError::DegenerateSource(source));
            }
            repetitions += 1;
        }

        Ok(Self {
            source,
            target,
            repetitions,
        })
    }

    pub fn is_truncation_only(&self) -> bool {
        self.repetitions == 1
    }

    /// Total seconds of material available before the cut.
    pub fn covered(&self) -> f64 {
        self.source * f64::from(self.repetitions)
    }

    /// Concat demuxer list replaying `clip` in order.
    pub fn concat_list(&self, clip: &Path) -> String {
        let escaped = clip.display().to_string().replace('\'', r"'\''");
        let mut out = String::new();
        for _ in 0..self.repetitions {
            let _ = writeln!(out, "file '{}'", escaped);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_source_is_looped() {
        let plan = LoopPlan::new(4.0, 10.0, DEFAULT_LOOP_SLACK).unwrap();
        assert_eq!(plan.repetitions, 4);
        assert!(plan.repetitions >= 3);
        assert!(plan.covered() >= 10.0);
        assert!(!plan.is_truncation_only());
    }

    #[test]
    fn test_long_source_is_truncated_only() {
        let plan = LoopPlan::new(12.0, 8.0, DEFAULT_LOOP_SLACK).unwrap();
        assert_eq!(plan.repetitions, 1);
        assert!(plan.is_truncation_only());

        let exact = LoopPlan::new(8.0, 8.0, 1).unwrap();
        assert_eq!(exact.repetitions, 1);
    }

    #[test]
    fn test_coverage_never_falls_short() {
        let sources = [0.04, 0.5, 1.0, 2.9, 3.0, 3.33, 4.0, 7.5, 9.99];
        for slack in [1, 2] {
            for target in 5..=30 {
                let target = f64::from(target);
                for &source in &sources {
                    let plan = LoopPlan::new(source, target, slack).unwrap();
                    assert!(
                        plan.covered() >= target,
                        "{source}s x{} < {target}s",
                        plan.repetitions
                    );
                }
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_source() {
        assert_eq!(
            LoopPlan::new(0.0, 10.0, 2),
            Err(NormalizeError::DegenerateSource(0.0))
        );
        assert!(matches!(
            LoopPlan::new(-1.0, 10.0, 2),
            Err(NormalizeError::DegenerateSource(_))
        ));
        assert!(matches!(
            LoopPlan::new(f64::NAN, 10.0, 2),
            Err(NormalizeError::DegenerateSource(_))
        ));
    }

    #[test]
    fn test_tiny_sources_are_rejected_without_looping() {
        for source in [1e-10, f64::MIN_POSITIVE, 1e-6, 0.009] {
            assert_eq!(
                LoopPlan::new(source, 10.0, DEFAULT_LOOP_SLACK),
                Err(NormalizeError::DegenerateSource(source))
            );
        }
        assert!(LoopPlan::new(MIN_SOURCE_SECS, 30.0, DEFAULT_LOOP_SLACK).is_ok());
    }

    #[test]
    fn test_repetitions_are_bounded() {
        assert!(matches!(
            LoopPlan::new(0.5, 1e9, DEFAULT_LOOP_SLACK),
            Err(NormalizeError::DegenerateSource(_))
        ));
        assert!(matches!(
            LoopPlan::new(1.0, 10.0, u32::MAX),
            Err(NormalizeError::DegenerateSource(_))
        ));
        let plan = LoopPlan::new(MIN_SOURCE_SECS, 30.0, DEFAULT_LOOP_SLACK).unwrap();
        assert!(plan.repetitions <= MAX_REPETITIONS);
        assert!(plan.covered() >= 30.0);
    }

    #[test]
    fn test_rejects_bad_target_and_slack() {
        assert_eq!(
            LoopPlan::new(3.0, 0.0, 2),
            Err(NormalizeError::InvalidTarget(0.0))
        );
        assert_eq!(LoopPlan::new(3.0, 10.0, 0), Err(NormalizeError::InvalidSlack));
    }

    #[test]
    fn test_concat_list_repeats_clip() {
        let plan = LoopPlan::new(3.0, 7.0, 1).unwrap();
        let list = plan.concat_list(Path::new("/tmp/it's.mp4"));
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| *l == r"file '/tmp/it'\''s.mp4'"));
    }
}
