//! Uniform slicing for videos where nothing qualified as a highlight.

/// Consecutive `slice_secs` spans covering `[0, duration)`.
///
/// The last slice is clipped to the video end and dropped when it is shorter
/// than `min_slice_secs`.
pub fn uniform_slices(duration: f64, slice_secs: f64, min_slice_secs: f64) -> Vec<(f64, f64)> {
    if !(duration.is_finite() && duration > 0.0 && slice_secs > 0.0) {
        return Vec::new();
    }

    let mut slices = Vec::new();
    let mut index = 0u32;
    loop {
        let start = f64::from(index) * slice_secs;
        if start >= duration {
            break;
        }
        let end = (start + slice_secs).min(duration);
        if end - start >= min_slice_secs {
            slices.push((start, end));
        }
        index += 1;
    }
    slices
}
