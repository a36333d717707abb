//! DD/FD-prefixed instructions: HL rebinds to IX or IY.
//!
//! Three rewrite rules apply to the opcode that follows the prefix:
//! 1. A (HL) operand becomes (IX+d) with a displacement byte after the
//!    opcode — and H/L operands in the same instruction stay H/L.
//! 2. Plain H/L register operands become IXH/IXL.
//! 3. DD CB reorders as DD CB d op, always operates on (IX+d), and for
//!    z != 6 also copies the result into register z (the undocumented
//!    copy forms). The op byte is fetched without refresh, so R bumps
//!    only for the two prefix bytes.
//!
//! Anything untouched by the rules falls through to the unprefixed
//! handler, so DD DD chains and DD ED sequences behave like hardware
//! (each prefix costs its own M1 cycle).

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, PF, SF, ZF};

use super::{Index, Z80};

impl Z80 {
    /// Execute the opcode following a DD/FD prefix. The prefix and the
    /// opcode fetches are both done.
    pub(crate) fn execute_index<B: Bus>(&mut self, bus: &mut B, op: u8, index: Index) {
        match op {
            // ADD IX, rr (09=BC, 19=DE, 29=IX, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.internal(7);
                let ix = self.index_reg(index);
                let rp = (op >> 4) & 3;
                let rr = if rp == 2 { ix } else { self.get_reg16(rp) };
                self.regs.wz = ix.wrapping_add(1);
                let (result, flags) = alu::add16(ix, rr);
                self.set_index_reg(index, result);
                self.set_f((self.regs.f & (SF | ZF | PF)) | flags);
            }

            // LD IX, nn
            0x21 => {
                let value = self.read_word_pc(bus);
                self.set_index_reg(index, value);
            }

            // LD (nn), IX
            0x22 => {
                let addr = self.read_word_pc(bus);
                let value = self.index_reg(index);
                self.write_word(bus, addr, value);
                self.regs.wz = addr.wrapping_add(1);
            }

            // INC IX
            0x23 => {
                self.internal(2);
                let value = self.index_reg(index).wrapping_add(1);
                self.set_index_reg(index, value);
            }

            // INC IXH / DEC IXH / LD IXH, n
            0x24 => {
                let result = alu::inc8(self.index_high(index));
                self.set_index_high(index, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }
            0x25 => {
                let result = alu::dec8(self.index_high(index));
                self.set_index_high(index, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }
            0x26 => {
                let value = self.read_byte_pc(bus);
                self.set_index_high(index, value);
            }

            // LD IX, (nn)
            0x2A => {
                let addr = self.read_word_pc(bus);
                let value = self.read_word(bus, addr);
                self.set_index_reg(index, value);
                self.regs.wz = addr.wrapping_add(1);
            }

            // DEC IX
            0x2B => {
                self.internal(2);
                let value = self.index_reg(index).wrapping_sub(1);
                self.set_index_reg(index, value);
            }

            // INC IXL / DEC IXL / LD IXL, n
            0x2C => {
                let result = alu::inc8(self.index_low(index));
                self.set_index_low(index, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }
            0x2D => {
                let result = alu::dec8(self.index_low(index));
                self.set_index_low(index, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }
            0x2E => {
                let value = self.read_byte_pc(bus);
                self.set_index_low(index, value);
            }

            // INC (IX+d) / DEC (IX+d)
            0x34 => {
                let addr = self.effective_addr(bus, index);
                let result = alu::inc8(self.read_mem(bus, addr));
                self.internal(1);
                self.write_mem(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }
            0x35 => {
                let addr = self.effective_addr(bus, index);
                let result = alu::dec8(self.read_mem(bus, addr));
                self.internal(1);
                self.write_mem(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // LD (IX+d), n — displacement and immediate share the
            // internal cycles, so this form costs only 2 extra T-states
            0x36 => {
                let d = self.read_byte_pc(bus) as i8;
                let addr = self.index_reg(index).wrapping_add(d as u16);
                self.regs.wz = addr;
                let value = self.read_byte_pc(bus);
                self.internal(2);
                self.write_mem(bus, addr, value);
            }

            // LD r, r' with rebinding (40-7F except 76)
            0x40..=0x7F if op != 0x76 => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    // LD r, (IX+d) — destination is never rebound
                    let addr = self.effective_addr(bus, index);
                    let value = self.read_mem(bus, addr);
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    // LD (IX+d), r — source is never rebound
                    let addr = self.effective_addr(bus, index);
                    let value = self.get_reg8(src);
                    self.write_mem(bus, addr, value);
                } else {
                    let value = self.get_reg8_idx(src, index);
                    self.set_reg8_idx(dst, value, index);
                }
            }

            // ALU A, r with rebinding (80-BF)
            0x80..=0xBF => {
                let r = op & 7;
                let value = if r == 6 {
                    let addr = self.effective_addr(bus, index);
                    self.read_mem(bus, addr)
                } else {
                    self.get_reg8_idx(r, index)
                };
                self.alu_a((op >> 3) & 7, value);
            }

            // DD CB d op
            0xCB => self.execute_index_cb(bus, index),

            // POP IX / PUSH IX
            0xE1 => {
                let value = self.pop_word(bus);
                self.set_index_reg(index, value);
            }
            0xE5 => {
                self.internal(1);
                let value = self.index_reg(index);
                self.push_word(bus, value);
            }

            // EX (SP), IX
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read_word(bus, sp);
                self.internal(1);
                let ix = self.index_reg(index);
                self.write_word(bus, sp, ix);
                self.internal(2);
                self.set_index_reg(index, value);
                self.regs.wz = value;
            }

            // JP (IX)
            0xE9 => {
                self.regs.pc = self.index_reg(index);
            }

            // LD SP, IX
            0xF9 => {
                self.internal(2);
                self.regs.sp = self.index_reg(index);
            }

            // The prefix does not touch this opcode: execute it as
            // unprefixed. Chained DD/FD/ED prefixes re-dispatch here.
            _ => self.execute_unprefixed(bus, op),
        }
    }

    /// DD CB d op: displacement before the opcode, always acting on
    /// (IX+d), with the undocumented register copy for z != 6.
    fn execute_index_cb<B: Bus>(&mut self, bus: &mut B, index: Index) {
        let d = self.read_byte_pc(bus) as i8;
        let addr = self.index_reg(index).wrapping_add(d as u16);
        // The op byte is a plain read, not an M1 cycle.
        let op = self.read_byte_pc(bus);
        self.internal(2);
        self.regs.wz = addr;

        let x = op >> 6;
        let y = (op >> 3) & 7;
        let z = op & 7;

        let value = self.read_mem(bus, addr);
        self.internal(1);

        if x == 1 {
            // BIT y, (IX+d): X/Y leak the effective address high byte
            self.bit_test(y, value, (addr >> 8) as u8);
            return;
        }

        let result = match x {
            0 => self.shift_rotate(y, value),
            2 => value & !(1 << y), // RES
            _ => value | (1 << y), // SET
        };
        self.write_mem(bus, addr, result);
        if z != 6 {
            self.set_reg8(z, result);
        }
    }

    /// Read the displacement byte and form IX+d, booking the five
    /// internal T-states of address preparation. MEMPTR tracks the
    /// effective address.
    fn effective_addr<B: Bus>(&mut self, bus: &mut B, index: Index) -> u16 {
        let d = self.read_byte_pc(bus) as i8;
        self.internal(5);
        let addr = self.index_reg(index).wrapping_add(d as u16);
        self.regs.wz = addr;
        addr
    }

    // === IXH/IXL plumbing ===

    const fn index_high(&self, index: Index) -> u8 {
        match index {
            Index::Ix => self.regs.ixh(),
            Index::Iy => self.regs.iyh(),
        }
    }

    const fn index_low(&self, index: Index) -> u8 {
        match index {
            Index::Ix => self.regs.ixl(),
            Index::Iy => self.regs.iyl(),
        }
    }

    const fn set_index_high(&mut self, index: Index, value: u8) {
        let reg = self.index_reg(index);
        self.set_index_reg(index, (reg & 0x00FF) | ((value as u16) << 8));
    }

    const fn set_index_low(&mut self, index: Index, value: u8) {
        let reg = self.index_reg(index);
        self.set_index_reg(index, (reg & 0xFF00) | value as u16);
    }

    /// 8-bit register with H/L rebound to the index halves.
    fn get_reg8_idx(&self, field: u8, index: Index) -> u8 {
        match field {
            4 => self.index_high(index),
            5 => self.index_low(index),
            _ => self.get_reg8(field),
        }
    }

    fn set_reg8_idx(&mut self, field: u8, value: u8, index: Index) {
        match field {
            4 => self.set_index_high(index, value),
            5 => self.set_index_low(index, value),
            _ => self.set_reg8(field, value),
        }
    }
}
