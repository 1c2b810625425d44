/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory sample buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One sound effect.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Key,
    Unlock,
    Fields,
    Fill,
    Bump,
    Win,
    Lose,
}

impl Sfx {
    const ALL: [Sfx; 7] = [Sfx::Key, Sfx::Unlock, Sfx::Fields, Sfx::Fill, Sfx::Bump, Sfx::Win, Sfx::Lose];

    /// The effect an event should trigger, if any.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::KeyCollected { .. } => Some(Sfx::Key),
            GameEvent::LockOpened { .. } => Some(Sfx::Unlock),
            GameEvent::ForceFieldsOpened { .. } => Some(Sfx::Fields),
            GameEvent::BoxFilledGap { .. } => Some(Sfx::Fill),
            GameEvent::Status(_) => Some(Sfx::Bump),
            GameEvent::LevelWon => Some(Sfx::Win),
            GameEvent::LevelLost(_) => Some(Sfx::Lose),
            GameEvent::TileChanged { .. } => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Effects for one command's events: each effect at most once, terminal
/// jingles replacing everything else.
pub fn effects_for(events: &[GameEvent]) -> Vec<Sfx> {
    if let Some(end) = events.iter().rev().find(|e| e.is_terminal()) {
        return Sfx::for_event(end).into_iter().collect();
    }
    let mut out = vec![];
    for sfx in events.iter().filter_map(Sfx::for_event) {
        if !out.contains(&sfx) {
            out.push(sfx);
        }
    }
    out
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated sample buffers, indexed by `Sfx`.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Vec<f32>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(err) => {
                    debug!(%err, "no audio output");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter().map(|&sfx| generate(sfx)).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let samples = self.buffers[sfx.index()].clone();
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
                sink.detach(); // fire-and-forget
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // Quick ascending arpeggio C6→E6→G6
            Sfx::Key => notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.045)], 0.25),
            // Two low clicks then a ring
            Sfx::Unlock => notes(&[(330.0, 0.03), (0.0, 0.02), (330.0, 0.03), (880.0, 0.12)], 0.25),
            Sfx::Fields => sweep(300.0, 1200.0, 0.25, 0.2),
            Sfx::Fill => thud(0.14),
            Sfx::Bump => notes(&[(140.0, 0.06)], 0.2),
            // C5→E5→G5→C6, last note held
            Sfx::Win => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
            // A4→F#4→Eb4→C4
            Sfx::Lose => notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.25)], 0.3),
        }
    }

    /// A sequence of (frequency, seconds) notes with a 3rd harmonic for a
    /// retro edge. Frequency 0 is a rest.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Rising sine sweep.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - t) * volume
            })
            .collect()
    }

    /// Low tone mixed with LCG noise, fading fast.
    fn thud(duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * (120.0 - t * 60.0) * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.6 + noise * 0.4) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
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
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::sim::event::{LossReason, Notice};

    #[test]
    fn effects_play_once_per_command() {
        let pos = Position::new(1, 1);
        let events = vec![
            GameEvent::TileChanged { pos },
            GameEvent::Status(Notice::HitWall),
            GameEvent::KeyCollected { pos },
            GameEvent::Status(Notice::BoxStuck),
        ];
        assert_eq!(effects_for(&events), vec![Sfx::Bump, Sfx::Key]);
    }

    #[test]
    fn level_end_drowns_out_the_rest() {
        let pos = Position::new(1, 1);
        let events = vec![
            GameEvent::KeyCollected { pos },
            GameEvent::LevelLost(LossReason::Spotted),
        ];
        assert_eq!(effects_for(&events), vec![Sfx::Lose]);
    }
}
