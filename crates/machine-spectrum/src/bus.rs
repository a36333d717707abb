//! Spectrum bus: memory and I/O routing.
//!
//! The bus connects the Z80 to memory, the ULA, the 128K hardware and
//! any further devices on the `IoBus`. Contention is delegated to the
//! ULA; the wait states ride back to the CPU on every access. I/O data
//! is sampled after the contention and the four base T-states have
//! elapsed, so floating-bus reads and beeper events land on the exact
//! cycle the hardware would see.

use cpu_z80::Z80;
use emu_core::{Bus, IoBus, IoDevice, ReadResult};
use spectrum_ula::Ula;

use crate::hardware128::Hardware128;
use crate::memory::SpectrumMemory;

/// Base T-states of an I/O cycle.
const IO_CYCLE: u64 = 4;

/// The Spectrum bus, implementing `emu_core::Bus`.
pub struct SpectrumBus {
    pub memory: Box<dyn SpectrumMemory>,
    pub ula: Ula,
    /// AY and its port decode; present on 128K machines.
    pub hardware128: Option<Hardware128>,
    /// Further peripherals (first-responder reads, broadcast writes).
    pub io: IoBus,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Box<dyn SpectrumMemory>, ula: Ula) -> Self {
        Self {
            memory,
            ula,
            hardware128: None,
            io: IoBus::new(),
        }
    }

    /// Run a tape-trap style return: pop the stored address into the
    /// CPU without booking T-states.
    pub fn pop_return_address(&mut self, cpu: &mut Z80) {
        let sp = cpu.regs.sp;
        let lo = self.memory.read(sp);
        let hi = self.memory.read(sp.wrapping_add(1));
        cpu.regs.sp = sp.wrapping_add(2);
        cpu.regs.pc = u16::from(lo) | (u16::from(hi) << 8);
    }
}

impl Bus for SpectrumBus {
    fn read(&mut self, address: u16, cycle: u64) -> ReadResult {
        let wait = self.ula.contention(cycle, self.memory.contended(address));
        ReadResult::with_wait(self.memory.read(address), wait)
    }

    fn write(&mut self, address: u16, value: u8, cycle: u64) -> u32 {
        let wait = self.ula.contention(cycle, self.memory.contended(address));
        self.memory.write(address, value);
        wait
    }

    fn io_read(&mut self, port: u16, cycle: u64) -> ReadResult {
        let ula_port = port & 1 == 0;
        let wait = self
            .ula
            .io_contention(cycle, ula_port, self.memory.contended(port));
        let sample_cycle = cycle + u64::from(wait) + IO_CYCLE;

        // First responder: ULA, 128K hardware, then the open bus
        let data = self
            .ula
            .read_port(port)
            .or_else(|| {
                self.hardware128
                    .as_mut()
                    .and_then(|hw| hw.read_port(port, sample_cycle))
            })
            .or_else(|| self.io.read_byte(port, sample_cycle))
            .unwrap_or_else(|| {
                let memory = &*self.memory;
                self.ula
                    .floating_bus(sample_cycle, |offset| memory.vram_peek(offset))
            });

        ReadResult::with_wait(data, wait)
    }

    fn io_write(&mut self, port: u16, value: u8, cycle: u64) -> u32 {
        let ula_port = port & 1 == 0;
        let wait = self
            .ula
            .io_contention(cycle, ula_port, self.memory.contended(port));
        let effective_cycle = cycle + u64::from(wait) + IO_CYCLE;

        self.ula.write_port(port, value, effective_cycle);

        // $7FFD (A15=0, A1=0): the 128K paging latch
        if port & 0x8002 == 0x0000 {
            self.memory.write_paging_latch(value);
        }

        if let Some(hw) = &mut self.hardware128 {
            hw.write_port(port, value, effective_cycle);
        }
        self.io.write_byte(port, value, effective_cycle);

        wait
    }
}
