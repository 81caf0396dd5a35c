// src/decoder/dsp.rs

/// Deck audio is always rendered as interleaved stereo.
pub const STEREO: usize = 2;

/// Map one interleaved block with `in_ch` channels onto stereo and append it to `out`.
/// Mono is duplicated, stereo copied, anything wider is folded by averaging
/// even channels into L and odd channels into R.
pub fn append_as_stereo(input: &[f32], in_ch: usize, out: &mut Vec<f32>) {
    if in_ch == 0 {
        return;
    }
    let frames = input.len() / in_ch;
    out.reserve(frames * STEREO);

    match in_ch {
        1 => {
            for &m in &input[..frames] {
                out.push(m);
                out.push(m);
            }
        }
        2 => out.extend_from_slice(&input[..frames * 2]),
        _ => {
            let left_n = in_ch.div_ceil(2) as f32;
            let right_n = (in_ch / 2) as f32;
            for frame in input.chunks_exact(in_ch) {
                let (mut l, mut r) = (0.0f32, 0.0f32);
                for (c, s) in frame.iter().enumerate() {
                    if c % 2 == 0 { l += s } else { r += s }
                }
                out.push(l / left_n);
                out.push(r / right_n);
            }
        }
    }
}

pub fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, s) in frame.iter().enumerate() {
            planar[ch].push(*s);
        }
    }
    planar
}

pub fn interleave_into(planar: &[Vec<f32>], out: &mut Vec<f32>) {
    let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
    out.reserve(frames * planar.len());
    for f in 0..frames {
        for ch in planar {
            out.push(ch[f]);
        }
    }
}

/// Mono downmix of one stereo frame, as fed to analysis taps.
#[inline]
pub fn mono(l: f32, r: f32) -> f32 {
    0.5 * (l + r)
}
