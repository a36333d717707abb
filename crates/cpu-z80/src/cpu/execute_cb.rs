//! CB-prefixed instructions: rotates, shifts and bit operations.

use emu_core::Bus;

use crate::alu::{self, AluResult};
use crate::flags::{CF, HF, PF, SF, XF, YF, ZF};

use super::Z80;

impl Z80 {
    /// Execute a CB-prefixed instruction. Both fetches are done.
    ///
    /// Decode: x = op[7:6] (0=shift/rotate, 1=BIT, 2=RES, 3=SET),
    /// y = op[5:3] (shift selector or bit number), z = op[2:0] operand.
    pub(crate) fn execute_cb<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let x = op >> 6;
        let y = (op >> 3) & 7;
        let z = op & 7;

        let value = if z == 6 {
            self.read_mem(bus, self.regs.hl())
        } else {
            self.get_reg8(z)
        };

        if x == 1 {
            // BIT y, r / BIT y, (HL). For (HL) the X/Y flags leak the
            // high byte of MEMPTR instead of the operand.
            let xy_source = if z == 6 {
                (self.regs.wz >> 8) as u8
            } else {
                value
            };
            if z == 6 {
                self.internal(1);
            }
            self.bit_test(y, value, xy_source);
            return;
        }

        let result = match x {
            0 => self.shift_rotate(y, value),
            2 => value & !(1 << y), // RES
            _ => value | (1 << y), // SET
        };

        if z == 6 {
            self.internal(1);
            self.write_mem(bus, self.regs.hl(), result);
        } else {
            self.set_reg8(z, result);
        }
    }

    /// One of the eight CB shift/rotate operations
    /// (0=RLC 1=RRC 2=RL 3=RR 4=SLA 5=SRA 6=SLL 7=SRL).
    pub(crate) fn shift_rotate(&mut self, selector: u8, value: u8) -> u8 {
        let carry = self.regs.f & CF != 0;
        let result: AluResult = match selector {
            0 => alu::rlc8(value),
            1 => alu::rrc8(value),
            2 => alu::rl8(value, carry),
            3 => alu::rr8(value, carry),
            4 => alu::sla8(value),
            5 => alu::sra8(value),
            6 => alu::sll8(value),
            7 => alu::srl8(value),
            _ => unreachable!("three-bit field"),
        };
        self.set_f(result.flags);
        result.value
    }

    /// BIT test flags: Z/PV set when the bit is clear, H set, S only
    /// for a set bit 7, X/Y from `xy_source`, C preserved.
    pub(crate) fn bit_test(&mut self, bit: u8, value: u8, xy_source: u8) {
        let is_zero = value & (1 << bit) == 0;

        let mut f = (self.regs.f & CF) | HF | (xy_source & (YF | XF));
        if is_zero {
            f |= ZF | PF;
        }
        if bit == 7 && !is_zero {
            f |= SF;
        }
        self.set_f(f);
    }
}
