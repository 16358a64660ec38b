// Sample rate conversion using rubato
// A clip is resampled once, at open time, to the rate of the device it plays on

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

use super::decoder::DecodedClip;
use crate::error::{ClipError, Result};

/// Resample a decoded clip to `target_rate`.
/// Returns the clip untouched when the rates already match.
pub fn resample_clip(clip: DecodedClip, target_rate: u32) -> Result<DecodedClip> {
    if clip.sample_rate == target_rate || clip.frames() == 0 {
        return Ok(clip);
    }
    if target_rate == 0 || clip.sample_rate == 0 {
        return Err(ClipError::Resample(format!(
            "Invalid sample rates {} -> {}",
            clip.sample_rate, target_rate
        )));
    }

    debug!(
        "Resampling clip from {}Hz to {}Hz ({} channels)",
        clip.sample_rate, target_rate, clip.channels
    );

    let planar_input = deinterleave(&clip.samples, clip.channels);
    let input_frames = planar_input[0].len();

    // Whole clip in a single chunk
    let mut resampler = FastFixedIn::<f32>::new(
        target_rate as f64 / clip.sample_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        clip.channels as usize,
    )
    .map_err(|e| ClipError::Resample(format!("Failed to create resampler: {}", e)))?;

    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| ClipError::Resample(e.to_string()))?;

    let samples = interleave(planar_output);
    debug!(
        "Resampled {} input frames to {} output frames",
        input_frames,
        samples.len() / clip.channels as usize
    );

    Ok(DecodedClip {
        samples,
        sample_rate: target_rate,
        channels: clip.channels,
    })
}

/// [L, R, L, R, ...] -> [[L, L, ...], [R, R, ...]]
fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let num_channels = channels as usize;
    let num_frames = samples.len() / num_channels;
    let mut planar = vec![Vec::with_capacity(num_frames); num_channels];

    for frame in samples.chunks_exact(num_channels) {
        for (plane, &sample) in planar.iter_mut().zip(frame) {
            plane.push(sample);
        }
    }
    planar
}

/// [[L, L, ...], [R, R, ...]] -> [L, R, L, R, ...]
fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }
    let num_frames = planar[0].len();
    let mut interleaved = Vec::with_capacity(num_frames * planar.len());
    for frame in 0..num_frames {
        for plane in &planar {
            interleaved.push(plane[frame]);
        }
    }
    interleaved
}
