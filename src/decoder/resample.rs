// src/decoder/resample.rs

use anyhow::Result;
use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::decoder::dsp::{self, STEREO};

pub fn build_resampler(
    src_rate: u32,
    dst_rate: u32,
    channels: usize,
) -> Result<Option<SincFixedIn<f32>>> {
    if src_rate == dst_rate {
        return Ok(None);
    }
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let r = SincFixedIn::<f32>::new(ratio, 2.0, params, 1024, channels)?;
    Ok(Some(r))
}

/// Resample a whole interleaved stereo buffer in one go.
/// Output length is `frames * dst / src` with the filter delay removed.
pub fn resample_stereo(samples: Vec<f32>, src_rate: u32, dst_rate: u32) -> Result<Vec<f32>> {
    let Some(mut resampler) = build_resampler(src_rate, dst_rate, STEREO)? else {
        return Ok(samples);
    };

    let planar = dsp::deinterleave(&samples, STEREO);
    let frames = planar[0].len();
    let expected = (frames as f64 * dst_rate as f64 / src_rate as f64).round() as usize;
    let delay = resampler.output_delay();
    let mut out_planar: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); STEREO];

    let mut cursor = 0usize;
    loop {
        let need = resampler.input_frames_next();
        if frames - cursor < need {
            break;
        }
        let block: Vec<&[f32]> = planar.iter().map(|ch| &ch[cursor..cursor + need]).collect();
        let out = resampler.process(&block, None)?;
        append_planar(&mut out_planar, out);
        cursor += need;
    }

    if cursor < frames {
        let block: Vec<&[f32]> = planar.iter().map(|ch| &ch[cursor..]).collect();
        let out = resampler.process_partial(Some(&block), None)?;
        append_planar(&mut out_planar, out);
    }

    // Flush the filter tail so the delay can be trimmed off the front.
    while out_planar[0].len() < expected + delay {
        let out = resampler.process_partial::<&[f32]>(None, None)?;
        if out.first().is_none_or(|ch| ch.is_empty()) {
            break;
        }
        append_planar(&mut out_planar, out);
    }

    for ch in &mut out_planar {
        ch.drain(..delay.min(ch.len()));
        ch.truncate(expected);
    }

    let mut out = Vec::with_capacity(expected * STEREO);
    dsp::interleave_into(&out_planar, &mut out);
    Ok(out)
}

fn append_planar(dst: &mut [Vec<f32>], src: Vec<Vec<f32>>) {
    for (d, s) in dst.iter_mut().zip(src) {
        d.extend_from_slice(&s);
    }
}
