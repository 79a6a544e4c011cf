/// Sound engine: procedural chiptune effects via rodio.
///
/// Each effect is a short list of `Tone`s (pitch sweep + optional noise),
/// rendered to an in-memory WAV buffer once at init time. Playback is
/// fire-and-forget through a detached rodio `Sink`.
///
/// Without the "sound" feature the stub `SoundEngine` does nothing.

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// One sound effect per audible game event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Launch,
    Capture,
    Fizzle,
    Hit,
    GameOver,
    Clear,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub const ALL: [Sfx; 6] = [Sfx::Launch, Sfx::Capture, Sfx::Fizzle, Sfx::Hit, Sfx::GameOver, Sfx::Clear];

    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::IncursionStarted => Some(Sfx::Launch),
            GameEvent::IncursionDiscarded => Some(Sfx::Fizzle),
            GameEvent::RegionCaptured { .. } => Some(Sfx::Capture),
            GameEvent::PlayerHit { lives } if *lives > 0 => Some(Sfx::Hit),
            // the game-over jingle covers the final hit
            GameEvent::PlayerHit { .. } => None,
            GameEvent::GameOver => Some(Sfx::GameOver),
            GameEvent::LevelCleared => Some(Sfx::Clear),
        }
    }

    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    fn tones(self) -> &'static [Tone] {
        const LAUNCH: &[Tone] = &[Tone::sweep(400.0, 900.0, 0.06)];
        const CAPTURE: &[Tone] = &[
            Tone::note(523.0, 0.06),  // C5
            Tone::note(659.0, 0.06),  // E5
            Tone::note(784.0, 0.06),  // G5
            Tone::note(1047.0, 0.14), // C6
        ];
        const FIZZLE: &[Tone] = &[Tone::noisy(300.0, 120.0, 0.10)];
        const HIT: &[Tone] = &[Tone::noisy(220.0, 80.0, 0.18)];
        const GAME_OVER: &[Tone] = &[
            Tone::note(440.0, 0.14),
            Tone::note(370.0, 0.14),
            Tone::note(311.0, 0.14),
            Tone::sweep(261.0, 130.0, 0.35),
        ];
        const CLEAR: &[Tone] = &[
            Tone::note(784.0, 0.08),
            Tone::note(1047.0, 0.08),
            Tone::note(1319.0, 0.08),
            Tone::note(1568.0, 0.30),
        ];

        match self {
            Sfx::Launch => LAUNCH,
            Sfx::Capture => CAPTURE,
            Sfx::Fizzle => FIZZLE,
            Sfx::Hit => HIT,
            Sfx::GameOver => GAME_OVER,
            Sfx::Clear => CLEAR,
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Synth: tones → mono f32 samples → 16-bit PCM WAV
// ════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
struct Tone {
    from_hz: f32,
    to_hz: f32,
    secs: f32,
    /// Share of white noise mixed in, 0.0..=1.0.
    noise: f32,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
impl Tone {
    const fn note(hz: f32, secs: f32) -> Tone {
        Tone { from_hz: hz, to_hz: hz, secs, noise: 0.0 }
    }

    const fn sweep(from_hz: f32, to_hz: f32, secs: f32) -> Tone {
        Tone { from_hz, to_hz, secs, noise: 0.0 }
    }

    const fn noisy(from_hz: f32, to_hz: f32, secs: f32) -> Tone {
        Tone { from_hz, to_hz, secs, noise: 0.6 }
    }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn render(tones: &[Tone], volume: f32) -> Vec<f32> {
    let mut out = Vec::new();
    let mut lcg: u32 = 0x2545_f491;
    for tone in tones {
        let n = (SAMPLE_RATE as f32 * tone.secs) as usize;
        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / n.max(1) as f32;
            let hz = tone.from_hz + (tone.to_hz - tone.from_hz) * t;
            phase += hz / SAMPLE_RATE as f32;
            // sine plus a third harmonic for a squarer edge
            let wave = (phase * std::f32::consts::TAU).sin() * 0.75
                + (phase * 3.0 * std::f32::consts::TAU).sin() * 0.25;
            lcg = lcg.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let white = (lcg >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
            let env = (1.0 - t).powf(0.7);
            out.push((wave * (1.0 - tone.noise) + white * tone.noise) * env * volume);
        }
    }
    out
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn encode_wav(samples: &[f32]) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let byte_rate = SAMPLE_RATE * block_align as u32;
    let data_len = samples.len() as u32 * block_align as u32;

    let mut buf = Vec::with_capacity(44 + data_len as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
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
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        buf.extend_from_slice(&pcm.to_le_bytes());
    }
    buf
}

// ════════════════════════════════════════════════════════════
//  Playback
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{encode_wav, render, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(encode_wav(&render(sfx.tones(), 0.3)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match self.buffers.iter().find(|(s, _)| *s == sfx) {
                Some((_, b)) => b,
                None => return,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
