/// Sound engine: procedural retro sound effects via rodio.
///
/// Every effect is synthesised into an in-memory WAV buffer at start-up.
/// Playback is fire-and-forget through a detached rodio `Sink`, with the
/// per-effect volume from `[sound]` in config.toml.
///
/// Without the "sound" feature the stub `SoundEngine` does nothing.

use crate::config::SoundConfig;
use crate::domain::context::Sfx;

const SAMPLE_RATE: u32 = 22050;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn volume_for(cfg: &SoundConfig, sfx: Sfx) -> f32 {
    match sfx {
        Sfx::Jump => cfg.jump,
        Sfx::Dash => cfg.dash,
        Sfx::Hit => cfg.hit,
        Sfx::Shoot => cfg.shoot,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, volume_for};
    use crate::config::SoundConfig;
    use crate::domain::context::Sfx;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        volumes: SoundConfig,
        jump: Arc<Vec<u8>>,
        dash: Arc<Vec<u8>>,
        hit: Arc<Vec<u8>>,
        shoot: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(volumes: &SoundConfig) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                volumes: volumes.clone(),
                jump: Arc::new(synth::encode_wav(&synth::jump())),
                dash: Arc::new(synth::encode_wav(&synth::dash())),
                hit: Arc::new(synth::encode_wav(&synth::hit())),
                shoot: Arc::new(synth::encode_wav(&synth::shoot())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Jump => &self.jump,
                Sfx::Dash => &self.dash,
                Sfx::Hit => &self.hit,
                Sfx::Shoot => &self.shoot,
            };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.set_volume(volume_for(&self.volumes, sfx));
                sink.append(src);
                sink.detach();
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators — mono f32 samples in -1.0..=1.0
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::SAMPLE_RATE;

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Square wave with a linear pitch sweep from `f0` to `f1`.
    fn sweep_square(f0: f32, f1: f32, duration: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase = (phase + (f0 + (f1 - f0) * t) / SAMPLE_RATE as f32).fract();
                let wave = if phase < 0.5 { 1.0 } else { -1.0 };
                wave * (1.0 - t)
            })
            .collect()
    }

    /// Jump: short rising chirp.
    pub fn jump() -> Vec<f32> {
        sweep_square(280.0, 720.0, 0.12).into_iter().map(|s| s * 0.5).collect()
    }

    /// Dash: filtered noise whoosh that swells then fades.
    pub fn dash() -> Vec<f32> {
        let n = sample_count(0.25);
        let mut rng = StdRng::seed_from_u64(7);
        let mut low = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let noise: f32 = rng.gen_range(-1.0..1.0);
                // One-pole low-pass opening up over time
                low += (noise - low) * (0.05 + 0.4 * t);
                let env = (t * std::f32::consts::PI).sin();
                low * env * 0.9
            })
            .collect()
    }

    /// Hit: noise crack over a falling low thump.
    pub fn hit() -> Vec<f32> {
        let n = sample_count(0.3);
        let mut rng = StdRng::seed_from_u64(11);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase = (phase + (160.0 - 110.0 * t) / SAMPLE_RATE as f32).fract();
                let thump = (phase * TAU).sin();
                let noise: f32 = rng.gen_range(-1.0..1.0);
                let crack = noise * (1.0 - t).powi(4);
                (thump * 0.55 + crack * 0.45) * (1.0 - t).powf(0.7)
            })
            .collect()
    }

    /// Shoot: quick descending zap.
    pub fn shoot() -> Vec<f32> {
        sweep_square(1400.0, 300.0, 0.09).into_iter().map(|s| s * 0.4).collect()
    }

    /// Wrap samples in a 16-bit mono PCM WAV container.
    pub fn encode_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let byte_rate = SAMPLE_RATE * CHANNELS as u32 * BITS as u32 / 8;
        let block_align = CHANNELS * BITS / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volumes: &SoundConfig) -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
