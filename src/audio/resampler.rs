//! Sample rate and channel conversion between decoded speech and the device stream.
//!
//! Speech arrives as 24 kHz mono while most devices run at 44.1 or 48 kHz with
//! two or more channels. `LinearResampler` interpolates interleaved f32 frames
//! and keeps its phase across `process` calls so chunked input stays continuous.

#[derive(Debug, Clone)]
pub struct LinearResampler {
    src_rate: u32,
    dst_rate: u32,
    channels: usize,

    // Source frames consumed per output frame (src/dst)
    step: f64,

    // Source position relative to `prev_frame`
    pos: f64,
    prev_frame: Vec<f32>,
}

impl LinearResampler {
    pub fn new(src_rate: u32, dst_rate: u32, channels: usize) -> Self {
        let step = if dst_rate == 0 { 0.0 } else { src_rate as f64 / dst_rate as f64 };
        Self {
            src_rate,
            dst_rate,
            channels,
            step,
            pos: 0.0,
            prev_frame: Vec::new(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.src_rate == self.dst_rate
    }

    /// Resample interleaved `input` (frames * channels samples) to the destination rate
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.channels == 0 || self.dst_rate == 0 || self.src_rate == 0 {
            return Vec::new();
        }
        if self.is_passthrough() {
            return input.to_vec();
        }

        let ch = self.channels;
        let in_frames = input.len() / ch;

        // [prev_frame, input frames...] so interpolation can straddle call boundaries.
        // On the first call the input's own first frame stands in for history.
        let mut work = Vec::with_capacity((in_frames + 1) * ch);
        if self.prev_frame.len() == ch {
            work.extend_from_slice(&self.prev_frame);
        } else if in_frames > 0 {
            work.extend_from_slice(&input[..ch]);
            self.pos = 1.0;
        } else {
            return Vec::new();
        }
        work.extend_from_slice(&input[..in_frames * ch]);

        let total_frames = work.len() / ch;
        let expected_out_frames =
            ((in_frames as f64) * (self.dst_rate as f64 / self.src_rate as f64)).ceil() as usize + 4;
        let mut out = Vec::with_capacity(expected_out_frames * ch);

        while self.pos + 1.0 <= (total_frames as f64 - 1.0) {
            let i = self.pos.floor() as usize;
            let frac = (self.pos - i as f64) as f32;
            let base0 = i * ch;
            let base1 = (i + 1) * ch;

            out.extend((0..ch).map(|c| {
                let s0 = work[base0 + c];
                let s1 = work[base1 + c];
                s0 + (s1 - s0) * frac
            }));

            self.pos += self.step;
        }

        // The last frame becomes index 0 of the next call's working buffer
        let last_base = (total_frames - 1) * ch;
        self.prev_frame.clear();
        self.prev_frame.extend_from_slice(&work[last_base..last_base + ch]);
        self.pos = (self.pos - (total_frames as f64 - 1.0)).max(0.0);

        out
    }
}

/// Re-lay interleaved frames from `from` channels to `to` channels.
///
/// Mono is copied into every output channel. Otherwise extra channels are
/// dropped and missing ones are silent.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to < from {
            out.extend_from_slice(&frame[..to]);
        } else {
            out.extend_from_slice(frame);
            out.extend(std::iter::repeat(0.0).take(to - from));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen_sine(f_hz: f32, sr: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|n| (2.0 * std::f32::consts::PI * f_hz * n as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn resample_speech_rate_to_48k_doubles_length() {
        let input = gen_sine(220.0, 24_000, 2_400);
        let mut rs = LinearResampler::new(24_000, 48_000, 1);
        let out = rs.process(&input);

        let expected = 4_800isize;
        assert!((out.len() as isize - expected).abs() <= 4, "got {}", out.len());
        // Every other output sample lands on a source sample
        assert!((out[0] - input[0]).abs() < 1e-6);
        assert!((out[2] - input[1]).abs() < 1e-6);
    }

    #[test]
    fn resample_to_44k1_length() {
        let input = gen_sine(1000.0, 24_000, 24_000);
        let mut rs = LinearResampler::new(24_000, 44_100, 1);
        let out = rs.process(&input);

        assert!((out.len() as isize - 44_100).abs() <= 4, "got {}", out.len());
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn streaming_matches_one_shot() {
        let input = gen_sine(440.0, 24_000, 10_000);

        let mut one = LinearResampler::new(24_000, 48_000, 1);
        let out_one = one.process(&input);

        let mut two = LinearResampler::new(24_000, 48_000, 1);
        let mut out_streamed = Vec::new();
        for chunk in input.chunks(777) {
            out_streamed.extend(two.process(chunk));
        }

        assert!((out_one.len() as isize - out_streamed.len() as isize).abs() <= 4);
        for (a, b) in out_one.iter().zip(out_streamed.iter()).step_by(97) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn passthrough_keeps_samples() {
        let input = vec![0.1, 0.2, 0.3];
        let mut rs = LinearResampler::new(48_000, 48_000, 1);
        assert_eq!(rs.process(&input), input);
    }

    #[test]
    fn mono_is_copied_to_every_channel() {
        assert_eq!(remap_channels(&[0.5, -0.5], 1, 2), vec![0.5, 0.5, -0.5, -0.5]);
        assert_eq!(remap_channels(&[0.25], 1, 3), vec![0.25, 0.25, 0.25]);
    }

    #[test]
    fn stereo_remap_truncates_or_pads() {
        assert_eq!(remap_channels(&[0.1, 0.2, 0.3, 0.4], 2, 1), vec![0.1, 0.3]);
        assert_eq!(remap_channels(&[0.1, 0.2], 2, 4), vec![0.1, 0.2, 0.0, 0.0]);
        assert_eq!(remap_channels(&[0.1, 0.2], 2, 2), vec![0.1, 0.2]);
    }
}
