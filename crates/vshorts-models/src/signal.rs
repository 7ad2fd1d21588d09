//! Motion and loudness readings for a single analysis window.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of every signal scale.
pub const SIGNAL_SCALE_MAX: f64 = 10.0;

/// Which signal a reading describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Motion,
    Audio,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Motion => "motion",
            SignalKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 0..10 reading with a short human description.
///
/// For motion the value is the scene-change intensity, for audio it is the
/// normalized peak volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalReading {
    pub kind: SignalKind,
    /// Normalized value in 0..=10
    pub value: f64,
    pub description: String,
}

impl SignalReading {
    /// Motion reading with the standard description for its intensity.
    pub fn motion(intensity: f64) -> Self {
        let value = clamp_scale(intensity);
        Self {
            kind: SignalKind::Motion,
            value,
            description: describe_motion(value).to_string(),
        }
    }

    /// Audio reading with the standard description for its volume.
    pub fn audio(volume: f64) -> Self {
        let value = clamp_scale(volume);
        Self {
            kind: SignalKind::Audio,
            value,
            description: describe_audio(value).to_string(),
        }
    }

    /// Override the description (e.g. an extractor-provided one).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Motion and audio readings for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalPair {
    pub motion: SignalReading,
    pub audio: SignalReading,
}

impl SignalPair {
    pub fn new(motion: SignalReading, audio: SignalReading) -> Self {
        Self { motion, audio }
    }

    /// Motion intensity (0..10).
    pub fn intensity(&self) -> f64 {
        self.motion.value
    }

    /// Audio volume (0..10).
    pub fn volume(&self) -> f64 {
        self.audio.value
    }

    /// Cheap screening score: mean of intensity and volume.
    pub fn initial_score(&self) -> f64 {
        (self.intensity() + self.volume()) / 2.0
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, SIGNAL_SCALE_MAX)
}

/// Standard wording for a motion intensity.
pub fn describe_motion(intensity: f64) -> &'static str {
    if intensity > 7.0 {
        "Very intense motion"
    } else if intensity > 5.0 {
        "Moderate motion"
    } else if intensity > 3.0 {
        "Slight motion"
    } else {
        "No noticeable motion"
    }
}

/// Standard wording for an audio volume.
pub fn describe_audio(volume: f64) -> &'static str {
    if volume > 7.0 {
        "Very loud sound"
    } else if volume > 5.0 {
        "Moderate volume"
    } else if volume > 3.0 {
        "Quiet sound"
    } else {
        "Silence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_descriptions() {
        assert_eq!(SignalReading::motion(8.0).description, "Very intense motion");
        assert_eq!(SignalReading::motion(6.0).description, "Moderate motion");
        assert_eq!(SignalReading::motion(4.0).description, "Slight motion");
        assert_eq!(SignalReading::motion(3.0).description, "No noticeable motion");
    }

    #[test]
    fn test_audio_descriptions() {
        assert_eq!(SignalReading::audio(7.5).description, "Very loud sound");
        assert_eq!(SignalReading::audio(5.5).description, "Moderate volume");
        assert_eq!(SignalReading::audio(3.5).description, "Quiet sound");
        assert_eq!(SignalReading::audio(0.0).description, "Silence");
    }

    #[test]
    fn test_values_are_clamped() {
        assert_eq!(SignalReading::motion(14.0).value, 10.0);
        assert_eq!(SignalReading::audio(-2.0).value, 0.0);
        assert_eq!(SignalReading::audio(f64::NAN).value, 0.0);
    }

    #[test]
    fn test_initial_score() {
        let pair = SignalPair::new(SignalReading::motion(6.0), SignalReading::audio(3.0));
        assert!((pair.initial_score() - 4.5).abs() < f64::EPSILON);
    }
}
