//! 128K-specific hardware: the AY-3-8910 behind its port decode.
//!
//! The 128K decodes ports by address-line patterns, not full equality:
//!
//! - $FFFD (A15=1, A14=1, A1=0): read AY data / select AY register
//! - $BFFD (A15=1, A14=0, A1=0): write AY data
//! - $7FFD (A15=0, A1=0): memory paging latch — decoded by the bus,
//!   which owns the memory

use ay38910::{Ay38910, StereoMode};
use emu_core::IoDevice;

/// The AY and its 128K port decode.
pub struct Hardware128 {
    pub ay: Ay38910,
}

impl Hardware128 {
    #[must_use]
    pub fn new(clock_hz: u32, stereo_mode: StereoMode) -> Self {
        Self {
            ay: Ay38910::new(clock_hz, stereo_mode),
        }
    }
}

impl IoDevice for Hardware128 {
    fn read_port(&mut self, port: u16, _cycle: u64) -> Option<u8> {
        // $FFFD reads the selected AY register
        (port & 0xC002 == 0xC000).then(|| self.ay.read_data())
    }

    fn write_port(&mut self, port: u16, value: u8, _cycle: u64) {
        if port & 0xC002 == 0xC000 {
            // $FFFD selects an AY register
            self.ay.write_address(value);
        } else if port & 0xC002 == 0x8000 {
            // $BFFD writes the selected register
            self.ay.write_data(value);
        }
    }
}
