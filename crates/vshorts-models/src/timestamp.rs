//! Time offsets and span validation.

use thiserror::Error;

/// Offset into the source timeline, in seconds.
pub type TimePoint = f64;

/// Maximum reasonable video duration (24 hours in seconds).
pub const MAX_VIDEO_DURATION_SECS: f64 = 86400.0;

/// Span or duration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Value is not a finite number: {0}")]
    NotFinite(f64),

    #[error("Timestamp cannot be negative: {0}")]
    Negative(f64),

    #[error("Duration must be positive, got {0}")]
    NotPositive(f64),

    #[error("Start time ({start:.3}s) must be before end time ({end:.3}s)")]
    StartNotBeforeEnd { start: f64, end: f64 },

    #[error("Timestamps exceed maximum allowed duration ({} hours)", .0 / 3600.0)]
    ExceedsMaxDuration(f64),

    #[error("End time ({end_secs:.1}s) exceeds video duration ({video_duration:.1}s)")]
    ExceedsVideoDuration { end_secs: f64, video_duration: f64 },
}

/// Check a video duration: finite, positive and below the 24h ceiling.
pub fn validate_duration(duration: f64) -> Result<f64, TimestampError> {
    if !duration.is_finite() {
        return Err(TimestampError::NotFinite(duration));
    }
    if duration <= 0.0 {
        return Err(TimestampError::NotPositive(duration));
    }
    if duration > MAX_VIDEO_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(MAX_VIDEO_DURATION_SECS));
    }
    Ok(duration)
}

/// Validate a `[start, end)` span, optionally against the video duration.
pub fn validate_span(
    start: f64,
    end: f64,
    video_duration: Option<f64>,
) -> Result<(f64, f64), TimestampError> {
    for value in [start, end] {
        if !value.is_finite() {
            return Err(TimestampError::NotFinite(value));
        }
        if value < 0.0 {
            return Err(TimestampError::Negative(value));
        }
    }

    if start >= end {
        return Err(TimestampError::StartNotBeforeEnd { start, end });
    }

    if end > MAX_VIDEO_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(MAX_VIDEO_DURATION_SECS));
    }

    if let Some(duration) = video_duration {
        if end > duration + 1.0 {
            // 1 second of slack for container rounding
            return Err(TimestampError::ExceedsVideoDuration {
                end_secs: end,
                video_duration: duration,
            });
        }
    }

    Ok((start, end))
}

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(30.5), "00:00:30.500");
    }

    #[test]
    fn test_validate_span_valid() {
        assert_eq!(validate_span(0.0, 55.0, Some(60.0)).unwrap(), (0.0, 55.0));
    }

    #[test]
    fn test_validate_span_start_after_end() {
        assert!(matches!(
            validate_span(20.0, 10.0, None),
            Err(TimestampError::StartNotBeforeEnd { .. })
        ));
    }

    #[test]
    fn test_validate_span_exceeds_video_duration() {
        assert!(matches!(
            validate_span(0.0, 300.0, Some(240.0)),
            Err(TimestampError::ExceedsVideoDuration { .. })
        ));
    }

    #[test]
    fn test_validate_span_rejects_nan_and_negative() {
        assert!(matches!(
            validate_span(f64::NAN, 10.0, None),
            Err(TimestampError::NotFinite(_))
        ));
        assert!(matches!(
            validate_span(-1.0, 10.0, None),
            Err(TimestampError::Negative(_))
        ));
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(120.0).is_ok());
        assert_eq!(validate_duration(0.0), Err(TimestampError::NotPositive(0.0)));
        assert_eq!(
            validate_duration(-3.0).unwrap_err().to_string(),
            "Duration must be positive, got -3"
        );
        assert!(validate_duration(f64::INFINITY).is_err());
        assert!(validate_duration(MAX_VIDEO_DURATION_SECS + 1.0).is_err());
    }
}
