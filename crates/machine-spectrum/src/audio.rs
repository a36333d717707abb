//! Audio ring buffer between the emulator and a playback thread.
//!
//! Single producer (the frame loop) and single consumer (the audio
//! callback) exchange stereo f32 samples. Overrun drops the excess and
//! underrun pads with silence; both are counted, neither is an error.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

struct RingState {
    buffer: Vec<[f32; 2]>,
    write_index: u64,
    read_index: u64,
}

/// Bounded SPSC ring of stereo samples.
pub struct RingBuffer {
    state: Mutex<RingState>,
    capacity: usize,
    overruns: AtomicU64,
    underruns: AtomicU64,
}

impl RingBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RingState {
                buffer: vec![[0.0; 2]; capacity],
                write_index: 0,
                read_index: 0,
            }),
            capacity,
            overruns: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        }
    }

    /// Queue samples for playback. Returns how many were accepted;
    /// anything beyond the free space is dropped and counted as one
    /// overrun.
    pub fn push(&self, samples: &[[f32; 2]]) -> usize {
        let mut state = self.state.lock().expect("audio ring poisoned");

        let used = (state.write_index - state.read_index) as usize;
        let space = self.capacity - used;
        let accepted = samples.len().min(space);
        if accepted < samples.len() {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }

        for &sample in &samples[..accepted] {
            let slot = (state.write_index as usize) % self.capacity;
            state.buffer[slot] = sample;
            state.write_index += 1;
        }
        accepted
    }

    /// Fill `out` for playback. Returns how many real samples were
    /// available; the remainder is silence and counts as one underrun.
    pub fn pop(&self, out: &mut [[f32; 2]]) -> usize {
        let mut state = self.state.lock().expect("audio ring poisoned");

        let available = (state.write_index - state.read_index) as usize;
        let taken = out.len().min(available);

        for slot in out.iter_mut().take(taken) {
            *slot = state.buffer[(state.read_index as usize) % self.capacity];
            state.read_index += 1;
        }
        for slot in out.iter_mut().skip(taken) {
            *slot = [0.0; 2];
        }

        if taken < out.len() {
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
        taken
    }

    /// Samples currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("audio ring poisoned");
        (state.write_index - state.read_index) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Times `push` ran out of space.
    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Times `pop` ran dry.
    #[must_use]
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let ring = RingBuffer::new(8);
        assert_eq!(ring.push(&[[0.1, 0.2], [0.3, 0.4]]), 2);
        assert_eq!(ring.len(), 2);

        let mut out = [[0.0; 2]; 2];
        assert_eq!(ring.pop(&mut out), 2);
        assert_eq!(out[0], [0.1, 0.2]);
        assert_eq!(out[1], [0.3, 0.4]);
        assert!(ring.is_empty());
    }

    #[test]
    fn overrun_drops_and_counts() {
        let ring = RingBuffer::new(4);
        let samples = [[1.0, 1.0]; 6];
        assert_eq!(ring.push(&samples), 4);
        assert_eq!(ring.overruns(), 1);
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn underrun_pads_silence_and_counts() {
        let ring = RingBuffer::new(4);
        ring.push(&[[0.5, 0.5]]);

        let mut out = [[9.0; 2]; 3];
        assert_eq!(ring.pop(&mut out), 1);
        assert_eq!(out[0], [0.5, 0.5]);
        assert_eq!(out[1], [0.0, 0.0]);
        assert_eq!(out[2], [0.0, 0.0]);
        assert_eq!(ring.underruns(), 1);
    }

    #[test]
    fn wraps_around_capacity() {
        let ring = RingBuffer::new(4);
        let mut out = [[0.0; 2]; 3];

        for round in 0..5 {
            let value = round as f32;
            ring.push(&[[value, value]; 3]);
            assert_eq!(ring.pop(&mut out), 3);
            assert!(out.iter().all(|&s| s == [value, value]));
        }
        assert_eq!(ring.overruns(), 0);
        assert_eq!(ring.underruns(), 0);
    }
}
