//! Top-level Spectrum machine.
//!
//! `run_frame()` steps the CPU until the model's frame budget elapses,
//! then asserts the maskable interrupt — the ULA raises INT at the top
//! of every frame. Video and audio are separate pulls so the host
//! controls pacing: the core never waits on real time.

use ay38910::{SPECTRUM_CLOCK_HZ, StereoMode};
use cpu_z80::Z80;
use emu_core::{IoDevice, MemoryError, TapeProvider};
use spectrum_ula::Ula;

use crate::bus::SpectrumBus;
use crate::hardware128::Hardware128;
use crate::memory::{Memory48K, Memory128K, SpectrumMemory};

/// ROM address of the LD-BYTES routine (tape loading entry point).
const LD_BYTES_ADDR: u16 = 0x0556;

/// Spectrum model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectrumModel {
    #[default]
    Spectrum48K,
    Spectrum128K,
}

/// Machine configuration.
pub struct SpectrumConfig {
    pub model: SpectrumModel,
    /// ROM image: 16 KiB for 48K, 32 KiB (two halves) for 128K.
    pub rom: Vec<u8>,
    /// AY stereo arrangement (128K only).
    pub stereo_mode: StereoMode,
    /// Host audio sample rate, Hz.
    pub sample_rate: u32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            model: SpectrumModel::Spectrum48K,
            rom: Vec::new(),
            stereo_mode: StereoMode::Mono,
            sample_rate: 44_100,
        }
    }
}

/// ZX Spectrum system: CPU, bus and tape deck.
pub struct Spectrum {
    pub cpu: Z80,
    pub bus: SpectrumBus,
    model: SpectrumModel,
    sample_rate: u32,
    tape: Option<Box<dyn TapeProvider>>,
}

impl Spectrum {
    /// Build a machine from the configuration. ROM images that do not
    /// fit their slots are rejected here, before anything runs.
    pub fn new(config: &SpectrumConfig) -> Result<Self, MemoryError> {
        let is_128k = config.model == SpectrumModel::Spectrum128K;

        let memory: Box<dyn SpectrumMemory> = if is_128k {
            let mut memory = Memory128K::new();
            let split = config.rom.len().min(0x4000);
            memory.load_rom(&config.rom[..split], 0)?;
            if config.rom.len() > 0x4000 {
                memory.load_rom(&config.rom[0x4000..], 1)?;
            }
            Box::new(memory)
        } else {
            let mut memory = Memory48K::new();
            memory.load_rom(&config.rom, 0)?;
            Box::new(memory)
        };

        let mut bus = SpectrumBus::new(memory, Ula::new(is_128k));
        if is_128k {
            bus.hardware128 = Some(Hardware128::new(SPECTRUM_CLOCK_HZ, config.stereo_mode));
        }

        Ok(Self {
            cpu: Z80::new(),
            bus,
            model: config.model,
            sample_rate: config.sample_rate,
            tape: None,
        })
    }

    /// The Spectrum model.
    #[must_use]
    pub const fn model(&self) -> SpectrumModel {
        self.model
    }

    /// Attach a tape block source for the ROM loading trap.
    pub fn attach_tape(&mut self, tape: Box<dyn TapeProvider>) {
        self.tape = Some(tape);
    }

    /// Attach a peripheral to the I/O bus.
    pub fn add_device(&mut self, device: Box<dyn IoDevice>) {
        self.bus.io.add_device(device);
    }

    /// Press or release a key on the matrix.
    pub fn set_key(&mut self, row_addr: u8, bit: u8, pressed: bool) {
        self.bus.ula.set_key(row_addr, bit, pressed);
    }

    /// Run one frame of CPU time, then raise the frame interrupt.
    /// Returns the T-states actually executed (the last instruction may
    /// overshoot the budget).
    pub fn run_frame(&mut self) -> u64 {
        let start = self.cpu.cycles();
        let target = start + self.bus.ula.cycles_per_frame();

        while self.cpu.cycles() < target {
            self.check_tape_trap();
            self.cpu.step(&mut self.bus);
        }
        self.cpu.interrupt(&mut self.bus);

        self.cpu.cycles() - start
    }

    /// Rasterise the current frame: 256 rows x 320 columns x RGB.
    pub fn render_screen(&mut self) -> &[u8] {
        let memory = &*self.bus.memory;
        self.bus
            .ula
            .render_screen(|offset| memory.vram_peek(offset))
    }

    /// Render `samples` interleaved stereo samples covering
    /// `cycles_in_frame` T-states: the beeper, mixed 50:50 with the AY
    /// when one is fitted.
    pub fn render_audio(&mut self, samples: usize, cycles_in_frame: u64) -> Vec<[f32; 2]> {
        let beeper = self.bus.ula.render_beeper(samples, cycles_in_frame);

        if let Some(hw) = &mut self.bus.hardware128 {
            let ay = hw.ay.render_audio(samples, self.sample_rate);
            beeper
                .iter()
                .zip(&ay)
                .map(|(&b, &[l, r])| [b.mul_add(0.5, l * 0.5), b.mul_add(0.5, r * 0.5)])
                .collect()
        } else {
            beeper.iter().map(|&b| [b, b]).collect()
        }
    }

    /// ROM tape-loading trap.
    ///
    /// The ROM's LD-BYTES routine at $0556 loads DE bytes to IX with
    /// the expected flag byte in A. When PC reaches it with the 48K
    /// BASIC ROM paged in and a block available, splice the payload
    /// straight into memory, set carry for success and return to the
    /// caller. A block too short to carry flag and checksum clears
    /// carry instead; flag verification is left to the emulated loader.
    fn check_tape_trap(&mut self) {
        if self.cpu.regs.pc != LD_BYTES_ADDR || !self.bus.memory.basic_rom_active() {
            return;
        }
        let Some(tape) = self.tape.as_mut() else {
            return;
        };
        let Some(block) = tape.next_block() else {
            return;
        };

        if block.len() < 2 {
            // Nothing between flag and checksum: signal failure
            self.cpu.regs.f &= !0x01;
            self.bus.pop_return_address(&mut self.cpu);
            return;
        }

        let requested = self.cpu.regs.de() as usize;
        let dest = self.cpu.regs.ix;
        let payload = &block[1..block.len() - 1];
        let count = payload.len().min(requested);

        for (i, &byte) in payload[..count].iter().enumerate() {
            self.bus.memory.write(dest.wrapping_add(i as u16), byte);
        }

        log::debug!(
            "tape trap: flag {:#04X} (A={:#04X}), {count} bytes to {dest:#06X}",
            block[0],
            self.cpu.regs.a
        );

        self.cpu.regs.f |= 0x01;
        self.bus.pop_return_address(&mut self.cpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::TapeDeck;
    use emu_core::Bus;

    /// A 16K ROM whose reset vector parks the CPU in a tight loop.
    fn idle_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0xC3; // JP 0x0000
        rom[1] = 0x00;
        rom[2] = 0x00;
        rom
    }

    fn make_48k() -> Spectrum {
        Spectrum::new(&SpectrumConfig {
            rom: idle_rom(),
            ..SpectrumConfig::default()
        })
        .expect("valid config")
    }

    fn make_128k() -> Spectrum {
        let mut rom = idle_rom();
        rom.extend_from_slice(&idle_rom());
        Spectrum::new(&SpectrumConfig {
            model: SpectrumModel::Spectrum128K,
            rom,
            stereo_mode: StereoMode::Acb,
            ..SpectrumConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn frame_runs_the_cycle_budget() {
        let mut machine = make_48k();
        let executed = machine.run_frame();
        assert!(executed >= 69_888);
        // Overshoot is at most one instruction
        assert!(executed < 69_888 + 32);
    }

    #[test]
    fn frame_interrupt_fires_when_enabled() {
        let mut machine = make_48k();
        // EI; JP self
        let mut rom = idle_rom();
        rom[0] = 0xFB;
        rom[1] = 0xC3;
        rom[2] = 0x01;
        rom[3] = 0x00;
        machine.bus.memory.load_rom(&rom, 0).expect("rom fits");

        machine.cpu.regs.sp = 0x8000;
        machine.run_frame();
        assert_eq!(machine.cpu.regs.pc, 0x0038, "interrupt vector taken");
        assert!(!machine.cpu.regs.iff1);
    }

    #[test]
    fn oversized_rom_rejected() {
        let result = Spectrum::new(&SpectrumConfig {
            rom: vec![0; 0x4001],
            ..SpectrumConfig::default()
        });
        assert!(matches!(result, Err(MemoryError::RomTooLarge { .. })));
    }

    #[test]
    fn rom_splits_for_128k() {
        let mut rom = vec![0x11u8; 0x4000];
        rom.extend_from_slice(&[0x22; 0x4000]);
        let machine = Spectrum::new(&SpectrumConfig {
            model: SpectrumModel::Spectrum128K,
            rom,
            ..SpectrumConfig::default()
        })
        .expect("valid config");

        assert_eq!(machine.bus.memory.read(0x0000), 0x11);
        let state = machine.bus.memory.paging_state().expect("128K pages");
        assert_eq!(state.rom_bank, 0);
    }

    #[test]
    fn tape_trap_splices_block() {
        let mut machine = make_48k();
        let mut deck = TapeDeck::new();
        // Flag 0xFF, payload 11 22 33, checksum
        deck.insert_block(vec![0xFF, 0x11, 0x22, 0x33, 0xDD]);
        machine.attach_tape(Box::new(deck));

        // Fake a CALL into LD-BYTES: return address 0x9000 on the stack
        machine.cpu.regs.pc = LD_BYTES_ADDR;
        machine.cpu.regs.sp = 0xFFFC;
        machine.bus.memory.write(0xFFFC, 0x00);
        machine.bus.memory.write(0xFFFD, 0x90);
        machine.cpu.regs.a = 0xFF;
        machine.cpu.regs.ix = 0x8000;
        machine.cpu.regs.set_de(3);

        machine.check_tape_trap();

        assert_eq!(machine.bus.memory.read(0x8000), 0x11);
        assert_eq!(machine.bus.memory.read(0x8001), 0x22);
        assert_eq!(machine.bus.memory.read(0x8002), 0x33);
        assert_eq!(machine.cpu.regs.f & 0x01, 0x01, "carry = success");
        assert_eq!(machine.cpu.regs.pc, 0x9000, "returned to caller");
        assert_eq!(machine.cpu.regs.sp, 0xFFFE);
    }

    #[test]
    fn tape_trap_truncates_to_de() {
        let mut machine = make_48k();
        let mut deck = TapeDeck::new();
        deck.insert_block(vec![0xFF, 0x11, 0x22, 0x33, 0x44, 0xDD]);
        machine.attach_tape(Box::new(deck));

        machine.cpu.regs.pc = LD_BYTES_ADDR;
        machine.cpu.regs.sp = 0xFFFC;
        machine.cpu.regs.ix = 0x8000;
        machine.cpu.regs.set_de(2);

        machine.check_tape_trap();

        assert_eq!(machine.bus.memory.read(0x8000), 0x11);
        assert_eq!(machine.bus.memory.read(0x8001), 0x22);
        assert_eq!(machine.bus.memory.read(0x8002), 0x00, "truncated at DE");
    }

    #[test]
    fn tape_trap_short_block_fails() {
        let mut machine = make_48k();
        let mut deck = TapeDeck::new();
        deck.insert_block(vec![0xFF]);
        machine.attach_tape(Box::new(deck));

        machine.cpu.regs.pc = LD_BYTES_ADDR;
        machine.cpu.regs.sp = 0xFFFC;
        machine.bus.memory.write(0xFFFD, 0x90);
        machine.cpu.regs.f = 0x01;

        machine.check_tape_trap();

        assert_eq!(machine.cpu.regs.f & 0x01, 0x00, "carry cleared = error");
        assert_eq!(machine.cpu.regs.pc, 0x9000);
    }

    #[test]
    fn tape_trap_needs_basic_rom_on_128k() {
        let mut machine = make_128k();
        let mut deck = TapeDeck::new();
        deck.insert_block(vec![0xFF, 0x11, 0xDD]);
        machine.attach_tape(Box::new(deck));

        // ROM bank 0 (the 128K editor) is paged in: no trap
        machine.cpu.regs.pc = LD_BYTES_ADDR;
        machine.cpu.regs.ix = 0x8000;
        machine.cpu.regs.set_de(1);
        machine.check_tape_trap();
        assert_eq!(machine.cpu.regs.pc, LD_BYTES_ADDR, "trap skipped");

        // Page in ROM 1 (48K BASIC): trap fires
        machine.bus.memory.write_paging_latch(0x10);
        machine.cpu.regs.sp = 0xFFFC;
        machine.bus.memory.write(0xFFFD, 0x90);
        machine.check_tape_trap();
        assert_eq!(machine.cpu.regs.pc, 0x9000);
        assert_eq!(machine.bus.memory.read(0x8000), 0x11);
    }

    #[test]
    fn audio_mixes_beeper_and_ay() {
        let mut machine = make_128k();
        // Beeper high from cycle 0
        machine.bus.io_write(0x00FE, 0x10, 0);

        let buffer = machine.render_audio(10, 70_908);
        assert_eq!(buffer.len(), 10);
        // AY silent, beeper at EAR level halved by the mix
        let expected = (160.0 / 255.0) * 0.5;
        assert!((buffer[5][0] - expected).abs() < 1e-4);
    }

    #[test]
    fn audio_duplicates_beeper_on_48k() {
        let mut machine = make_48k();
        machine.bus.io_write(0x00FE, 0x10, 0);

        let buffer = machine.render_audio(4, 69_888);
        assert_eq!(buffer[0][0], buffer[0][1]);
        assert!((buffer[0][0] - 160.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn screen_render_uses_selected_bank() {
        let mut machine = make_128k();
        // Pixel data in bank 5 (normal screen)
        machine.bus.memory.write(0x4000, 0xFF);
        machine.bus.memory.write(0x5800, 0x07); // white ink

        let frame = machine.render_screen();
        let offset = (32 * 320 + 32) * 3;
        assert_eq!(&frame[offset..offset + 3], &[0xD7, 0xD7, 0xD7]);
    }
}
