//! Instruction execution for the Z80: unprefixed opcodes.

use emu_core::Bus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53p};

use super::{Index, Z80};

impl Z80 {
    /// Execute an unprefixed instruction. The opcode fetch (4 T-states,
    /// R increment) has already happened.
    pub(crate) fn execute_unprefixed<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.read_word_pc(bus);
                self.set_reg16((op >> 4) & 3, value);
            }

            // LD (BC), A
            0x02 => {
                let addr = self.regs.bc();
                self.write_mem(bus, addr, self.regs.a);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.internal(2);
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (op >> 3) & 7;
                let result = alu::inc8(self.get_reg8(r));
                self.set_reg8(r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (op >> 3) & 7;
                let result = alu::dec8(self.get_reg8(r));
                self.set_reg8(r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.read_byte_pc(bus);
                self.set_reg8((op >> 3) & 7, value);
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | (self.regs.a & (YF | XF))
                        | if carry != 0 { CF } else { 0 },
                );
            }

            // EX AF, AF'
            0x08 => {
                core::mem::swap(&mut self.regs.a, &mut self.regs.a_alt);
                let f_alt = self.regs.f_alt;
                self.regs.f_alt = self.regs.f;
                self.set_f(f_alt);
            }

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.internal(7);
                let hl = self.regs.hl();
                let rr = self.get_reg16((op >> 4) & 3);
                self.regs.wz = hl.wrapping_add(1);
                let (result, flags) = alu::add16(hl, rr);
                self.regs.set_hl(result);
                self.set_f((self.regs.f & (SF | ZF | PF)) | flags);
            }

            // LD A, (BC)
            0x0A => {
                let addr = self.regs.bc();
                self.regs.a = self.read_mem(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.internal(2);
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry << 7);
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | (self.regs.a & (YF | XF))
                        | if carry != 0 { CF } else { 0 },
                );
            }

            // DJNZ e
            0x10 => {
                self.internal(1);
                let offset = self.read_byte_pc(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.internal(5);
                    let target = self.regs.pc.wrapping_add(offset as u16);
                    self.regs.pc = target;
                    self.regs.wz = target;
                }
            }

            // LD (DE), A
            0x12 => {
                let addr = self.regs.de();
                self.write_mem(bus, addr, self.regs.a);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
            }

            // RLA
            0x17 => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | (self.regs.a & (YF | XF))
                        | if new_carry != 0 { CF } else { 0 },
                );
            }

            // JR e
            0x18 => {
                let offset = self.read_byte_pc(bus) as i8;
                self.internal(5);
                let target = self.regs.pc.wrapping_add(offset as u16);
                self.regs.pc = target;
                self.regs.wz = target;
            }

            // LD A, (DE)
            0x1A => {
                let addr = self.regs.de();
                self.regs.a = self.read_mem(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
            }

            // RRA
            0x1F => {
                let old_carry = (self.regs.f & CF) << 7;
                let new_carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | old_carry;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | (self.regs.a & (YF | XF))
                        | if new_carry != 0 { CF } else { 0 },
                );
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.read_byte_pc(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.internal(5);
                    let target = self.regs.pc.wrapping_add(offset as u16);
                    self.regs.pc = target;
                    self.regs.wz = target;
                }
            }

            // LD (nn), HL
            0x22 => {
                let addr = self.read_word_pc(bus);
                self.write_word(bus, addr, self.regs.hl());
                self.regs.wz = addr.wrapping_add(1);
            }

            // DAA
            0x27 => {
                let a = self.regs.a;
                let nf = self.regs.f & NF != 0;
                let cf = self.regs.f & CF != 0;
                let hf = self.regs.f & HF != 0;

                let mut correction: u8 = 0;
                let mut new_cf = cf;

                if hf || (a & 0x0F) > 9 {
                    correction |= 0x06;
                }
                if cf || a > 0x99 {
                    correction |= 0x60;
                    new_cf = true;
                }

                let result = if nf {
                    a.wrapping_sub(correction)
                } else {
                    a.wrapping_add(correction)
                };

                let new_hf = if nf {
                    hf && (a & 0x0F) < 6
                } else {
                    (a & 0x0F) > 9
                };

                self.regs.a = result;
                self.set_f(
                    sz53p(result)
                        | if nf { NF } else { 0 }
                        | if new_cf { CF } else { 0 }
                        | if new_hf { HF } else { 0 },
                );
            }

            // LD HL, (nn)
            0x2A => {
                let addr = self.read_word_pc(bus);
                let value = self.read_word(bus, addr);
                self.regs.set_hl(value);
                self.regs.wz = addr.wrapping_add(1);
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF | CF)) | HF | NF | (self.regs.a & (YF | XF)),
                );
            }

            // LD (nn), A
            0x32 => {
                let addr = self.read_word_pc(bus);
                self.write_mem(bus, addr, self.regs.a);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | (addr.wrapping_add(1) & 0xFF);
            }

            // INC (HL)
            0x34 => {
                let addr = self.regs.hl();
                let result = alu::inc8(self.read_mem(bus, addr));
                self.internal(1);
                self.write_mem(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // DEC (HL)
            0x35 => {
                let addr = self.regs.hl();
                let result = alu::dec8(self.read_mem(bus, addr));
                self.internal(1);
                self.write_mem(bus, addr, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // LD (HL), n
            0x36 => {
                let value = self.read_byte_pc(bus);
                self.write_mem(bus, self.regs.hl(), value);
            }

            // SCF
            0x37 => {
                // Undocumented: X/Y from (Q XOR F) OR A
                let q_xor_f = self.regs.q ^ self.regs.f;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | ((q_xor_f | self.regs.a) & (YF | XF))
                        | CF,
                );
            }

            // LD A, (nn)
            0x3A => {
                let addr = self.read_word_pc(bus);
                self.regs.a = self.read_mem(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
            }

            // CCF
            0x3F => {
                let old_cf = self.regs.f & CF;
                // Undocumented: X/Y from (Q XOR F) OR A
                let q_xor_f = self.regs.q ^ self.regs.f;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF))
                        | ((q_xor_f | self.regs.a) & (YF | XF))
                        | if old_cf != 0 { HF } else { CF },
                );
            }

            // HALT
            0x76 => {
                self.regs.halted = true;
            }

            // LD r, r' (40-7F except 76)
            0x40..=0x7F => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    // LD r, (HL)
                    let value = self.read_mem(bus, self.regs.hl());
                    self.set_reg8(dst, value);
                } else if dst == 6 {
                    // LD (HL), r
                    let value = self.get_reg8(src);
                    self.write_mem(bus, self.regs.hl(), value);
                } else {
                    let value = self.get_reg8(src);
                    self.set_reg8(dst, value);
                }
            }

            // ALU A, r (80-BF)
            0x80..=0xBF => {
                let r = op & 7;
                let value = if r == 6 {
                    self.read_mem(bus, self.regs.hl())
                } else {
                    self.get_reg8(r)
                };
                self.alu_a((op >> 3) & 7, value);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.internal(1);
                if self.condition((op >> 3) & 7) {
                    let addr = self.pop_word(bus);
                    self.regs.pc = addr;
                    self.regs.wz = addr;
                }
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_word(bus);
                let rp = (op >> 4) & 3;
                if rp == 3 {
                    self.set_af(value);
                } else {
                    self.set_reg16(rp, value);
                }
            }

            // JP cc, nn — WZ gets nn whether or not the jump is taken
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.read_word_pc(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = addr;
                }
            }

            // JP nn
            0xC3 => {
                let addr = self.read_word_pc(bus);
                self.regs.pc = addr;
                self.regs.wz = addr;
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.read_word_pc(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    self.internal(1);
                    let ret = self.regs.pc;
                    self.push_word(bus, ret);
                    self.regs.pc = addr;
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.internal(1);
                let rp = (op >> 4) & 3;
                let value = if rp == 3 {
                    self.regs.af()
                } else {
                    self.get_reg16(rp)
                };
                self.push_word(bus, value);
            }

            // ALU A, n (C6=ADD, CE=ADC, D6=SUB, DE=SBC, E6=AND, EE=XOR, F6=OR, FE=CP)
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.read_byte_pc(bus);
                self.alu_a((op >> 3) & 7, value);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.internal(1);
                let target = u16::from(op & 0x38);
                let ret = self.regs.pc;
                self.push_word(bus, ret);
                self.regs.pc = target;
                self.regs.wz = target;
            }

            // RET
            0xC9 => {
                let addr = self.pop_word(bus);
                self.regs.pc = addr;
                self.regs.wz = addr;
            }

            // CB prefix
            0xCB => {
                let sub = self.fetch_opcode(bus);
                self.execute_cb(bus, sub);
            }

            // CALL nn
            0xCD => {
                let addr = self.read_word_pc(bus);
                self.regs.wz = addr;
                self.internal(1);
                let ret = self.regs.pc;
                self.push_word(bus, ret);
                self.regs.pc = addr;
            }

            // OUT (n), A
            0xD3 => {
                let n = self.read_byte_pc(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.io_write(bus, port, self.regs.a);
                self.regs.wz =
                    (u16::from(self.regs.a) << 8) | u16::from(n.wrapping_add(1));
            }

            // EXX
            0xD9 => {
                core::mem::swap(&mut self.regs.b, &mut self.regs.b_alt);
                core::mem::swap(&mut self.regs.c, &mut self.regs.c_alt);
                core::mem::swap(&mut self.regs.d, &mut self.regs.d_alt);
                core::mem::swap(&mut self.regs.e, &mut self.regs.e_alt);
                core::mem::swap(&mut self.regs.h, &mut self.regs.h_alt);
                core::mem::swap(&mut self.regs.l, &mut self.regs.l_alt);
            }

            // IN A, (n)
            0xDB => {
                let n = self.read_byte_pc(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.a = self.io_read(bus, port);
                self.regs.wz = port.wrapping_add(1);
            }

            // DD prefix — rebind HL to IX for the next opcode
            0xDD => {
                let sub = self.fetch_opcode(bus);
                self.execute_index(bus, sub, Index::Ix);
            }

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read_word(bus, sp);
                self.internal(1);
                let hl = self.regs.hl();
                self.write_word(bus, sp, hl);
                self.internal(2);
                self.regs.set_hl(value);
                self.regs.wz = value;
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.regs.hl();
            }

            // EX DE, HL
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
            }

            // ED prefix
            0xED => {
                let sub = self.fetch_opcode(bus);
                self.execute_ed(bus, sub);
            }

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }

            // LD SP, HL
            0xF9 => {
                self.internal(2);
                self.regs.sp = self.regs.hl();
            }

            // EI
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
            }

            // FD prefix — rebind HL to IY for the next opcode
            0xFD => {
                let sub = self.fetch_opcode(bus);
                self.execute_index(bus, sub, Index::Iy);
            }
        }
    }

    /// Perform an ALU operation on A (0=ADD 1=ADC 2=SUB 3=SBC 4=AND
    /// 5=XOR 6=OR 7=CP).
    pub(crate) fn alu_a(&mut self, alu_op: u8, value: u8) {
        let carry = self.regs.f & CF != 0;
        let result = match alu_op {
            0 => alu::add8(self.regs.a, value, false),
            1 => alu::add8(self.regs.a, value, carry),
            2 => alu::sub8(self.regs.a, value, false),
            3 => alu::sub8(self.regs.a, value, carry),
            4 => alu::and8(self.regs.a, value),
            5 => alu::xor8(self.regs.a, value),
            6 => alu::or8(self.regs.a, value),
            7 => alu::cp8(self.regs.a, value),
            _ => unreachable!("three-bit field"),
        };
        self.regs.a = result.value;
        self.set_f(result.flags);
    }
}
