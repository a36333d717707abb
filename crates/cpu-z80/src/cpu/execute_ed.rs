//! ED-prefixed instructions: block operations, 16-bit arithmetic,
//! interrupt control and the digit rotates.

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};

use super::Z80;

impl Z80 {
    /// Execute an ED-prefixed instruction. Both fetches are done.
    pub(crate) fn execute_ed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // IN r, (C) — ED 70 is the flags-only IN (C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc();
                let value = self.io_read(bus, port);
                self.regs.wz = port.wrapping_add(1);

                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_reg8(r, value);
                }
                self.set_f((self.regs.f & CF) | sz53p(value));
            }

            // OUT (C), r — ED 71 outputs 0 on NMOS silicon
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.get_reg8(r) };
                let port = self.regs.bc();
                self.io_write(bus, port, value);
                self.regs.wz = port.wrapping_add(1);
            }

            // SBC HL, ss (42=BC, 52=DE, 62=HL, 72=SP)
            0x42 | 0x52 | 0x62 | 0x72 => {
                self.internal(7);
                let hl = self.regs.hl();
                let ss = self.get_reg16((op >> 4) & 3);
                let (result, flags) = alu::sbc16(hl, ss, self.regs.f & CF != 0);
                self.regs.set_hl(result);
                self.set_f(flags);
                self.regs.wz = hl.wrapping_add(1);
            }

            // ADC HL, ss (4A=BC, 5A=DE, 6A=HL, 7A=SP)
            0x4A | 0x5A | 0x6A | 0x7A => {
                self.internal(7);
                let hl = self.regs.hl();
                let ss = self.get_reg16((op >> 4) & 3);
                let (result, flags) = alu::adc16(hl, ss, self.regs.f & CF != 0);
                self.regs.set_hl(result);
                self.set_f(flags);
                self.regs.wz = hl.wrapping_add(1);
            }

            // LD (nn), dd (43=BC, 53=DE, 63=HL, 73=SP)
            0x43 | 0x53 | 0x63 | 0x73 => {
                let addr = self.read_word_pc(bus);
                let value = self.get_reg16((op >> 4) & 3);
                self.write_word(bus, addr, value);
                self.regs.wz = addr.wrapping_add(1);
            }

            // LD dd, (nn) (4B=BC, 5B=DE, 6B=HL, 7B=SP)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let addr = self.read_word_pc(bus);
                let value = self.read_word(bus, addr);
                self.set_reg16((op >> 4) & 3, value);
                self.regs.wz = addr.wrapping_add(1);
            }

            // NEG (all eight decodes)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // RETN / RETI — both copy IFF2 back into IFF1
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.iff1 = self.regs.iff2;
                let addr = self.pop_word(bus);
                self.regs.pc = addr;
                self.regs.wz = addr;
            }

            // IM 0 / IM 1 / IM 2
            0x46 | 0x4E | 0x66 | 0x6E => self.regs.im = 0,
            0x56 | 0x76 => self.regs.im = 1,
            0x5E | 0x7E => self.regs.im = 2,

            // LD I, A
            0x47 => {
                self.internal(1);
                self.regs.i = self.regs.a;
            }

            // LD R, A
            0x4F => {
                self.internal(1);
                self.regs.r = self.regs.a;
            }

            // LD A, I — P/V leaks IFF2
            0x57 => {
                self.internal(1);
                self.regs.a = self.regs.i;
                let mut f = (self.regs.f & CF) | sz53(self.regs.a);
                if self.regs.iff2 {
                    f |= PF;
                }
                self.set_f(f);
            }

            // LD A, R — P/V leaks IFF2
            0x5F => {
                self.internal(1);
                self.regs.a = self.regs.r;
                let mut f = (self.regs.f & CF) | sz53(self.regs.a);
                if self.regs.iff2 {
                    f |= PF;
                }
                self.set_f(f);
            }

            // RRD — low nibble of (HL) into A, A's low nibble into the
            // high nibble of (HL)
            0x67 => {
                let addr = self.regs.hl();
                let mem = self.read_mem(bus, addr);
                self.internal(4);
                let result = (self.regs.a << 4) | (mem >> 4);
                self.write_mem(bus, addr, result);
                self.regs.a = (self.regs.a & 0xF0) | (mem & 0x0F);
                self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                self.regs.wz = addr.wrapping_add(1);
            }

            // RLD — high nibble of (HL) into A, A's low nibble into the
            // low nibble of (HL)
            0x6F => {
                let addr = self.regs.hl();
                let mem = self.read_mem(bus, addr);
                self.internal(4);
                let result = (mem << 4) | (self.regs.a & 0x0F);
                self.write_mem(bus, addr, result);
                self.regs.a = (self.regs.a & 0xF0) | (mem >> 4);
                self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                self.regs.wz = addr.wrapping_add(1);
            }

            // Block transfer / compare / I-O
            0xA0 => self.ldi_ldd(bus, 1),
            0xA8 => self.ldi_ldd(bus, -1),
            0xB0 => {
                self.ldi_ldd(bus, 1);
                self.block_repeat(self.regs.bc() != 0);
            }
            0xB8 => {
                self.ldi_ldd(bus, -1);
                self.block_repeat(self.regs.bc() != 0);
            }

            0xA1 => self.cpi_cpd(bus, 1),
            0xA9 => self.cpi_cpd(bus, -1),
            0xB1 => {
                self.cpi_cpd(bus, 1);
                self.block_repeat(self.regs.bc() != 0 && self.regs.f & ZF == 0);
            }
            0xB9 => {
                self.cpi_cpd(bus, -1);
                self.block_repeat(self.regs.bc() != 0 && self.regs.f & ZF == 0);
            }

            0xA2 => self.ini_ind(bus, 1),
            0xAA => self.ini_ind(bus, -1),
            0xB2 => {
                self.ini_ind(bus, 1);
                self.block_io_repeat(self.regs.b != 0);
            }
            0xBA => {
                self.ini_ind(bus, -1);
                self.block_io_repeat(self.regs.b != 0);
            }

            0xA3 => self.outi_outd(bus, 1),
            0xAB => self.outi_outd(bus, -1),
            0xB3 => {
                self.outi_outd(bus, 1);
                self.block_io_repeat(self.regs.b != 0);
            }
            0xBB => {
                self.outi_outd(bus, -1);
                self.block_io_repeat(self.regs.b != 0);
            }

            // Every other ED opcode is a two-byte NOP on NMOS silicon.
            _ => {
                log::warn!(
                    "undefined ED opcode {op:#04X} at {:#06X}",
                    self.regs.pc.wrapping_sub(2)
                );
            }
        }
    }

    /// LDI / LDD: move (HL) to (DE), step both pointers, decrement BC.
    /// X/Y leak bits 1 and 3 of A + transferred byte.
    fn ldi_ldd<B: Bus>(&mut self, bus: &mut B, step: i16) {
        let value = self.read_mem(bus, self.regs.hl());
        self.write_mem(bus, self.regs.de(), value);
        self.internal(2);

        let n = self.regs.a.wrapping_add(value);

        self.regs.set_hl(self.regs.hl().wrapping_add(step as u16));
        self.regs.set_de(self.regs.de().wrapping_add(step as u16));
        self.regs.set_bc(self.regs.bc().wrapping_sub(1));

        let mut f = self.regs.f & (SF | ZF | CF);
        if self.regs.bc() != 0 {
            f |= PF;
        }
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        self.set_f(f);
    }

    /// CPI / CPD: compare A with (HL), step HL, decrement BC. X/Y leak
    /// bits of the difference, minus one more when half-borrow hit.
    fn cpi_cpd<B: Bus>(&mut self, bus: &mut B, step: i16) {
        let value = self.read_mem(bus, self.regs.hl());
        self.internal(5);
        let result = self.regs.a.wrapping_sub(value);
        let half_borrow = (self.regs.a & 0x0F) < (value & 0x0F);
        let n = if half_borrow {
            result.wrapping_sub(1)
        } else {
            result
        };

        self.regs.set_hl(self.regs.hl().wrapping_add(step as u16));
        self.regs.set_bc(self.regs.bc().wrapping_sub(1));

        let mut f = (self.regs.f & CF) | NF;
        if result & 0x80 != 0 {
            f |= SF;
        }
        if result == 0 {
            f |= ZF;
        }
        if half_borrow {
            f |= HF;
        }
        if self.regs.bc() != 0 {
            f |= PF;
        }
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        self.set_f(f);

        self.regs.wz = self.regs.wz.wrapping_add(step as u16);
    }

    /// INI / IND: read port (BC before B decrements), store at (HL),
    /// step HL.
    fn ini_ind<B: Bus>(&mut self, bus: &mut B, step: i16) {
        let port = self.regs.bc();
        let b_before = self.regs.b;
        let modifier = self.regs.c.wrapping_add(step as u8);
        self.regs.b = self.regs.b.wrapping_sub(1);

        self.internal(1);
        let value = self.io_read(bus, port);
        self.write_mem(bus, self.regs.hl(), value);
        self.regs.wz = port.wrapping_add(step as u16);

        self.regs.set_hl(self.regs.hl().wrapping_add(step as u16));
        self.block_io_flags(value, modifier, b_before);
    }

    /// OUTI / OUTD: read (HL), write port (BC after B decrements),
    /// step HL. The flag modifier is L after the step.
    fn outi_outd<B: Bus>(&mut self, bus: &mut B, step: i16) {
        let b_before = self.regs.b;
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();

        self.internal(1);
        let value = self.read_mem(bus, self.regs.hl());
        self.io_write(bus, port, value);
        self.regs.wz = port.wrapping_add(step as u16);

        self.regs.set_hl(self.regs.hl().wrapping_add(step as u16));
        let modifier = self.regs.l;
        self.block_io_flags(value, modifier, b_before);
    }

    /// Undocumented flags shared by the four block I/O primitives.
    ///
    /// S/Z/X/Y come from B after the decrement; N is bit 7 of the
    /// transferred byte; H and C are the 9-bit carry of value+modifier;
    /// P/V is the parity of ((value+modifier) & 7) XOR B-before XOR the
    /// half carry of value+modifier.
    fn block_io_flags(&mut self, value: u8, modifier: u8, b_before: u8) {
        let b = self.regs.b;
        let mut f = (b & SF) | (b & (YF | XF));
        if b == 0 {
            f |= ZF;
        }
        if value & 0x80 != 0 {
            f |= NF;
        }

        let sum = u16::from(value) + u16::from(modifier);
        if sum > 0xFF {
            f |= HF | CF;
        }

        let half = u8::from((value & 0x0F) + (modifier & 0x0F) > 0x0F);
        if parity(((sum as u8) & 0x07) ^ b_before ^ half) {
            f |= PF;
        }

        self.set_f(f);
    }

    /// Repeat step for LDIR/LDDR/CPIR/CPDR: rewind PC to the opcode,
    /// leak the new PC high byte into X/Y, point MEMPTR past the opcode.
    fn block_repeat(&mut self, repeat: bool) {
        if !repeat {
            return;
        }
        self.internal(5);
        self.regs.wz = self.regs.pc.wrapping_sub(1);
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        let f = (self.regs.f & !(YF | XF)) | (((self.regs.pc >> 8) as u8) & (YF | XF));
        self.set_f(f);
    }

    /// Repeat step for INIR/INDR/OTIR/OTDR. H clears alongside the X/Y
    /// leak on these.
    fn block_io_repeat(&mut self, repeat: bool) {
        if !repeat {
            return;
        }
        self.internal(5);
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        let f = (self.regs.f & !(YF | HF | XF))
            | (((self.regs.pc >> 8) as u8) & (YF | XF));
        self.set_f(f);
    }
}
