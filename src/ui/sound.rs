/// Sound engine: procedural synth effects and the Geiger ambience via rodio.
///
/// Fixed effects are rendered to in-memory WAV buffers at init time; pitched
/// ones (plutonium pickup, Geiger clicks, arpeggio notes) are rendered on
/// demand. Playback is fire-and-forget through a detached rodio `Sink`.
///
/// The ambience is polled, not signalled: call `update_ambience` each frame
/// with the world's `(radiation, carrying_count, carrying)` sample.
///
/// Build without the "sound" feature to get a stub engine that does nothing.

#[cfg(not(feature = "sound"))]
use std::time::Instant;

use crate::sim::world::Ambience;

/// Cm7 extended, shared by the tension arpeggio and the pickup chime.
pub const SCALE: [f32; 11] = [
    130.81, 155.56, 196.00, 233.08, 261.63, 311.13, 392.00, 466.16, 523.25, 622.25, 783.99,
];

/// Pickup chime: one octave above the arpeggio note for the carried count.
pub fn pickup_freq(count: u32) -> f32 {
    let idx = (count.max(1) - 1) as usize % SCALE.len();
    SCALE[idx] * 2.0
}

// ════════════════════════════════════════════════════════════
//  Ambience scheduling (pure, audio-free)
// ════════════════════════════════════════════════════════════

/// What the ambience wants played this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AmbienceCue {
    pub geiger: bool,
    pub arp_note: Option<f32>,
    /// Harsher voice once more than five units are carried.
    pub harsh: bool,
}

/// Next-due times for the Geiger clicks and the tension arpeggio.
#[derive(Debug, Default)]
pub struct AmbienceClock {
    geiger_next: f64,
    arp_next: f64,
    arp_idx: usize,
}

impl AmbienceClock {
    pub fn new() -> Self {
        AmbienceClock::default()
    }

    /// Advance to `now_s` seconds. `jitter` in [0, 1) spreads the clicks.
    /// Silent unless the player is carrying.
    pub fn poll(&mut self, amb: Ambience, now_s: f64, jitter: f32) -> AmbienceCue {
        let mut cue = AmbienceCue::default();
        if !amb.carrying {
            return cue;
        }

        if now_s >= self.geiger_next {
            cue.geiger = true;
            let intensity = amb.radiation.clamp(0.0, 90.0) / 100.0;
            let interval = 1.0 - intensity * 0.95;
            let wait = (interval * (0.5 + jitter * 0.5)).max(0.05);
            self.geiger_next = now_s + wait as f64;
        }

        if amb.carrying_count > 0 && now_s >= self.arp_next {
            let speed = amb.carrying_count.min(8) as f32 / 8.0;
            let range = (3 + amb.carrying_count as usize).min(SCALE.len());
            cue.arp_note = Some(SCALE[self.arp_idx % range]);
            cue.harsh = amb.carrying_count > 5;
            // Stumble forward now and then at high counts
            self.arp_idx += if cue.harsh && jitter > 0.7 { 2 } else { 1 };
            self.arp_next = now_s + (0.3 - speed * 0.2) as f64;
        }
        cue
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Instant;

    use rand::Rng;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{pickup_freq, AmbienceClock};
    use crate::sim::world::Ambience;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::PI * 2.0;

    /// Pre-generated WAV buffers for each fixed effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        started: Instant,
        clock: AmbienceClock,
        sfx_step: Arc<Vec<u8>>,
        sfx_grass: Arc<Vec<u8>>,
        sfx_door: Arc<Vec<u8>>,
        sfx_key: Arc<Vec<u8>>,
        sfx_deposit: Arc<Vec<u8>>,
        sfx_block_place: Arc<Vec<u8>>,
        sfx_block_recover: Arc<Vec<u8>>,
        sfx_block_refill: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_level_start: Arc<Vec<u8>>,
        sfx_level_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            let wav = |s: Vec<f32>| Arc::new(make_wav(&s));
            Some(SoundEngine {
                _stream: stream,
                handle,
                started: Instant::now(),
                clock: AmbienceClock::new(),
                sfx_step: wav(gen_step()),
                sfx_grass: wav(gen_grass()),
                sfx_door: wav(sweep(Wave::Square, 100.0, 50.0, 0.3, 0.2)),
                sfx_key: wav(sweep(Wave::Sine, 1500.0, 2500.0, 0.1, 0.2)),
                sfx_deposit: wav(gen_deposit()),
                sfx_block_place: wav(sweep(Wave::Saw, 100.0, 50.0, 0.2, 0.3)),
                sfx_block_recover: wav(sweep(Wave::Triangle, 880.0, 1760.0, 0.1, 0.1)),
                sfx_block_refill: wav(sweep(Wave::Square, 440.0, 880.0, 0.1, 0.1)),
                sfx_die: wav(gen_die()),
                sfx_level_start: wav(gen_level_start()),
                sfx_level_clear: wav(gen_level_clear()),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_bytes(buf.as_ref().clone());
        }

        fn play_bytes(&self, bytes: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(bytes)) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_step(&self) { self.play(&self.sfx_step); }
        pub fn play_grass(&self) { self.play(&self.sfx_grass); }
        pub fn play_door(&self) { self.play(&self.sfx_door); }
        pub fn play_key(&self) { self.play(&self.sfx_key); }
        pub fn play_deposit(&self) { self.play(&self.sfx_deposit); }
        pub fn play_block_place(&self) { self.play(&self.sfx_block_place); }
        pub fn play_block_recover(&self) { self.play(&self.sfx_block_recover); }
        pub fn play_block_refill(&self) { self.play(&self.sfx_block_refill); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_level_start(&self) { self.play(&self.sfx_level_start); }
        pub fn play_level_clear(&self) { self.play(&self.sfx_level_clear); }

        /// Pitch follows the number of units now carried.
        pub fn play_pickup(&self, count: u32) {
            let f = pickup_freq(count);
            self.play_bytes(make_wav(&sweep(Wave::Square, f, f * 1.01, 0.3, 0.1)));
        }

        pub fn update_ambience(&mut self, amb: Ambience, now: Instant) {
            let mut rng = rand::rng();
            let now_s = now.duration_since(self.started).as_secs_f64();
            let cue = self.clock.poll(amb, now_s, rng.random::<f32>());

            if cue.geiger {
                let f = 1200.0 + rng.random::<f32>() * 500.0;
                self.play_bytes(make_wav(&sweep(Wave::Square, f, f, 0.05, 0.05)));
            }
            if let Some(f) = cue.arp_note {
                let wave = if cue.harsh { Wave::Saw } else { Wave::Triangle };
                self.play_bytes(make_wav(&sweep(wave, f, f, 0.2, 0.1)));
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        Square,
        Triangle,
        Saw,
    }

    fn sample(wave: Wave, phase: f32) -> f32 {
        let p = phase.fract();
        match wave {
            Wave::Sine => (p * TAU).sin(),
            Wave::Square => if p < 0.5 { 1.0 } else { -1.0 },
            Wave::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Wave::Saw => 2.0 * p - 1.0,
        }
    }

    /// Linear pitch sweep with a linear fade out.
    fn sweep(wave: Wave, from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                sample(wave, phase) * (1.0 - t) * volume
            })
            .collect()
    }

    fn noise(n: usize, seed: u32) -> impl Iterator<Item = f32> {
        let mut rng = seed;
        (0..n).map(move |_| {
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            (rng as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
    }

    /// Footstep: 50ms of high-passed noise
    fn gen_step() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.05) as usize;
        let mut prev = 0.0_f32;
        noise(n, 777)
            .enumerate()
            .map(|(i, x)| {
                // First difference is a cheap high-pass
                let hp = x - prev;
                prev = x;
                let env = (1.0 - i as f32 / n as f32).powf(3.0);
                hp * env * 0.05
            })
            .collect()
    }

    fn gen_grass() -> Vec<f32> {
        sweep(Wave::Triangle, 340.0, 340.0, 0.1, 0.05)
    }

    /// Deposit: staggered A major arpeggio
    fn gen_deposit() -> Vec<f32> {
        let notes = [440.0_f32, 554.0, 659.0, 880.0];
        let stagger = (SAMPLE_RATE as f32 * 0.05) as usize;
        let voice = (SAMPLE_RATE as f32 * 0.45) as usize;
        let mut out = vec![0.0_f32; stagger * notes.len() + voice];
        for (k, &freq) in notes.iter().enumerate() {
            for i in 0..voice {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / voice as f32).powf(2.0);
                out[k * stagger + i] += sample(Wave::Triangle, t * freq) * env * 0.1;
            }
        }
        out
    }

    /// Death: low falling boom over a noise burst
    fn gen_die() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 1.5) as usize;
        let boom = sweep(Wave::Saw, 100.0, 10.0, 1.0, 0.4);
        noise(n, 4242)
            .enumerate()
            .map(|(i, x)| {
                let env = (1.0 - i as f32 / n as f32).powf(4.0);
                x * env * 0.5 + boom.get(i).copied().unwrap_or(0.0)
            })
            .collect()
    }

    /// Level banner: one second rising saw
    fn gen_level_start() -> Vec<f32> {
        let n = SAMPLE_RATE as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                // Exponential 110Hz -> 880Hz
                phase += 110.0 * 8.0_f32.powf(t) / SAMPLE_RATE as f32;
                let env = if t < 0.1 { t / 0.1 } else { (1.0 - t) / 0.9 };
                sample(Wave::Saw, phase) * env * 0.2
            })
            .collect()
    }

    /// Level clear: C major fanfare
    fn gen_level_clear() -> Vec<f32> {
        let notes = [261.63_f32, 329.63, 392.00, 523.25];
        let stagger = (SAMPLE_RATE as f32 * 0.1) as usize;
        let voice = (SAMPLE_RATE as f32 * 1.2) as usize;
        let mut out = vec![0.0_f32; stagger * notes.len() + voice];
        for (k, &freq) in notes.iter().enumerate() {
            for i in 0..voice {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / voice as f32).powf(3.0);
                out[k * stagger + i] += sample(Wave::Square, t * freq) * env * 0.08;
            }
        }
        out
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes_match_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }

        #[test]
        fn sweep_length_follows_duration() {
            assert_eq!(sweep(Wave::Sine, 440.0, 440.0, 0.1, 1.0).len(), 2205);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_step(&self) {}
    pub fn play_grass(&self) {}
    pub fn play_door(&self) {}
    pub fn play_key(&self) {}
    pub fn play_deposit(&self) {}
    pub fn play_block_place(&self) {}
    pub fn play_block_recover(&self) {}
    pub fn play_block_refill(&self) {}
    pub fn play_die(&self) {}
    pub fn play_level_start(&self) {}
    pub fn play_level_clear(&self) {}
    pub fn play_pickup(&self, _count: u32) {}
    pub fn update_ambience(&mut self, _amb: Ambience, _now: Instant) {}
}
