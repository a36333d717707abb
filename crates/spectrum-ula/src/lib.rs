//! Sinclair ULA (Uncommitted Logic Array).
//!
//! The ULA handles the keyboard matrix, port $FE (border, MIC, beeper),
//! memory and I/O contention, the floating bus, video rasterisation and
//! beeper audio. It never ticks on its own: every query carries the
//! CPU's T-state counter, and port writes append to event logs that the
//! per-frame renderers replay.
//!
//! # Standalone IC
//!
//! This crate has no dependencies — the ULA reads VRAM through closures
//! passed by the caller, keeping it decoupled from any particular memory
//! model. VRAM offsets are relative to the start of the screen bank
//! ($0000-$1AFF within the bank), so 128K machines can point the closure
//! at bank 5 or bank 7.
//!
//! # Timing
//!
//! 48K: 69,888 T-states per frame, 224 per line, 64 lines above the
//! screen. 128K: 70,908 / 228 / 63. Contention applies to the first 128
//! T-states of each of the 192 visible lines with the pattern
//! `[6, 5, 4, 3, 2, 1, 0, 0]`.
//!
//! # Framebuffer
//!
//! 256 rows x 320 columns x 3 bytes RGB, row-major: the 256x192 screen
//! area with a 32-pixel border on every side.

mod palette;

pub use palette::PALETTE;

/// Framebuffer dimensions.
pub const FB_WIDTH: usize = 320;
pub const FB_HEIGHT: usize = 256;

/// Border thickness in pixels on each side of the screen area.
const BORDER: usize = 32;

/// Contention delay pattern (repeats every 8 T-states).
const CONTENTION_PATTERN: [u32; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// Contended window within a visible line, in T-states.
const CONTENTION_END_CYCLE: u64 = 128;

/// Visible scanlines.
const SCREEN_LINES: u64 = 192;

/// Beeper output levels for the four (EAR, MIC) combinations, index
/// `(ear << 1) | mic`. The amplitudes keep MIC tape tones audible under
/// the louder EAR output.
const BEEPER_AMPLITUDE: [f32; 4] = [
    40.0 / 255.0,
    80.0 / 255.0,
    160.0 / 255.0,
    200.0 / 255.0,
];

/// Keyboard row address masks in scan order: an address line pulled low
/// in the port high byte selects the matching row.
const KEY_ROWS: [u8; 8] = [0xFE, 0xFD, 0xFB, 0xF7, 0xEF, 0xDF, 0xBF, 0x7F];

/// Per-model frame timing.
#[derive(Debug, Clone, Copy)]
struct FrameTiming {
    cycles_per_frame: u64,
    cycles_per_line: u64,
    lines_before_screen: u64,
}

impl FrameTiming {
    const fn screen_start_cycle(&self) -> u64 {
        self.lines_before_screen * self.cycles_per_line
    }
}

const TIMING_48K: FrameTiming = FrameTiming {
    cycles_per_frame: 69_888,
    cycles_per_line: 224,
    lines_before_screen: 64,
};

const TIMING_128K: FrameTiming = FrameTiming {
    cycles_per_frame: 70_908,
    cycles_per_line: 228,
    lines_before_screen: 63,
};

/// Standard Sinclair ULA.
pub struct Ula {
    timing: FrameTiming,
    /// Current border colour (0-7).
    border_color: u8,
    /// Border colour carried into the next rendered frame.
    last_frame_border_color: u8,
    /// MIC output bit (port $FE bit 3).
    mic: u8,
    /// EAR/beeper output bit (port $FE bit 4).
    beeper: u8,
    /// Keyboard matrix: 5 low-active bits per row.
    keyboard_rows: [u8; 8],
    /// Beeper transitions: (absolute cycle, level 0-3).
    audio_events: Vec<(u64, u8)>,
    /// Border transitions: (frame-relative cycle, colour).
    border_events: Vec<(u64, u8)>,
    /// First cycle of the next audio render window.
    last_audio_cycle: u64,
    /// Beeper level held at the start of the next window.
    render_beeper_level: u8,
    /// Frame counter driving FLASH (toggles every 16 frames).
    flash_counter: u8,
    /// Bank-relative bitmap address of each scanline (the interleaved
    /// Spectrum layout).
    line_addresses: [u16; 192],
    /// RGB framebuffer, reused across frames.
    framebuffer: Vec<u8>,
}

impl Ula {
    #[must_use]
    pub fn new(is_128k: bool) -> Self {
        let mut line_addresses = [0u16; 192];
        for (y, slot) in line_addresses.iter_mut().enumerate() {
            let section = (y >> 6) & 0x03;
            let char_row = (y >> 3) & 0x07;
            let pixel_row = y & 0x07;
            let hi = (section << 3) | pixel_row;
            *slot = ((hi as u16) << 8) | ((char_row as u16) << 5);
        }

        Self {
            timing: if is_128k { TIMING_128K } else { TIMING_48K },
            border_color: 0,
            last_frame_border_color: 0,
            mic: 0,
            beeper: 0,
            keyboard_rows: [0x1F; 8],
            audio_events: Vec::new(),
            border_events: Vec::new(),
            last_audio_cycle: 0,
            render_beeper_level: 0,
            flash_counter: 0,
            line_addresses,
            framebuffer: vec![0; FB_WIDTH * FB_HEIGHT * 3],
        }
    }

    /// T-states per frame for this model.
    #[must_use]
    pub const fn cycles_per_frame(&self) -> u64 {
        self.timing.cycles_per_frame
    }

    /// T-states per scanline for this model.
    #[must_use]
    pub const fn cycles_per_line(&self) -> u64 {
        self.timing.cycles_per_line
    }

    /// Current border colour index (0-7).
    #[must_use]
    pub const fn border_color(&self) -> u8 {
        self.border_color
    }

    /// Current beeper/MIC level (0-3).
    #[must_use]
    pub const fn beeper_level(&self) -> u8 {
        (self.beeper << 1) | self.mic
    }

    // === Keyboard ===

    /// Press or release a key. `row_addr` is the row's address mask
    /// ($FE, $FD, $FB, $F7, $EF, $DF, $BF or $7F), `bit` the key column
    /// (0-4). Unknown rows are ignored.
    pub fn set_key(&mut self, row_addr: u8, bit: u8, pressed: bool) {
        let Some(row) = KEY_ROWS.iter().position(|&mask| mask == row_addr) else {
            return;
        };
        let mask = 1 << bit;
        if pressed {
            self.keyboard_rows[row] &= !mask;
        } else {
            self.keyboard_rows[row] |= mask;
        }
    }

    /// Release every key.
    pub fn release_all_keys(&mut self) {
        self.keyboard_rows = [0x1F; 8];
    }

    // === Port $FE ===

    /// Read the ULA port. Responds to even ports only: bits 0-4 AND all
    /// keyboard rows whose address line is low, bits 5 and 7 pulled
    /// high, bit 6 the EAR input (0 with no tape signal attached).
    #[must_use]
    pub fn read_port(&mut self, port: u16) -> Option<u8> {
        if port & 1 != 0 {
            return None;
        }

        let high_byte = (port >> 8) as u8;
        let mut result = 0x1F;
        for (row, &state) in self.keyboard_rows.iter().enumerate() {
            if high_byte & (1 << row) == 0 {
                result &= state;
            }
        }
        Some(result | 0xA0)
    }

    /// Write the ULA port. Responds to even ports only: bits 0-2 set
    /// the border, bit 3 MIC, bit 4 the beeper. Level and border
    /// transitions append to the event logs at the given cycle.
    pub fn write_port(&mut self, port: u16, value: u8, cycle: u64) {
        if port & 1 != 0 {
            return;
        }

        let new_beeper = (value >> 4) & 1;
        let new_mic = (value >> 3) & 1;
        if new_beeper != self.beeper || new_mic != self.mic {
            let level = (new_beeper << 1) | new_mic;
            self.audio_events.push((cycle, level));
        }

        let new_border = value & 0x07;
        if new_border != self.border_color {
            let rel_cycle = cycle % self.timing.cycles_per_frame;
            self.border_events.push((rel_cycle, new_border));
        }

        self.border_color = new_border;
        self.mic = new_mic;
        self.beeper = new_beeper;
    }

    // === Contention ===

    /// Memory contention delay for an access starting at `cycle`.
    /// `contended` is true when the address decodes to contended RAM.
    #[must_use]
    pub fn contention(&self, cycle: u64, contended: bool) -> u32 {
        if !contended {
            return 0;
        }
        self.contention_delay(cycle)
    }

    /// I/O contention for the four T-state I/O cycle starting at
    /// `cycle`. A port contends when bit 0 is clear (ULA port) or its
    /// address lies in contended RAM; each of the four phases then takes
    /// its own contention lookup, later phases shifted by the delays
    /// already accumulated.
    #[must_use]
    pub fn io_contention(&self, cycle: u64, ula_port: bool, contended_high: bool) -> u32 {
        if !ula_port && !contended_high {
            return 0;
        }

        let mut delay = 0u32;
        let mut current = cycle;
        for _ in 0..4 {
            let d = self.contention_delay(current);
            delay += d;
            current += u64::from(d) + 1;
        }
        delay
    }

    /// Contention delay at a single cycle: pattern position within the
    /// first 128 T-states of a visible line, zero elsewhere.
    fn contention_delay(&self, cycle: u64) -> u32 {
        let rel_cycle = cycle % self.timing.cycles_per_frame;
        if rel_cycle < self.timing.screen_start_cycle() {
            return 0;
        }

        let screen_cycle = rel_cycle - self.timing.screen_start_cycle();
        let line = screen_cycle / self.timing.cycles_per_line;
        if line >= SCREEN_LINES {
            return 0;
        }

        let line_cycle = screen_cycle % self.timing.cycles_per_line;
        if line_cycle < CONTENTION_END_CYCLE {
            CONTENTION_PATTERN[(line_cycle % 8) as usize]
        } else {
            0
        }
    }

    // === Floating bus ===

    /// The byte on the data bus at `cycle`. During the fetch phases of
    /// visible lines the ULA is reading the screen: phase 0 the bitmap,
    /// phase 1 the attribute, phases 4/5 the next character pair. All
    /// idle phases and the border/retrace read back $FF.
    ///
    /// `read_vram` takes a bank-relative offset into the screen bank.
    #[must_use]
    pub fn floating_bus(&self, cycle: u64, read_vram: impl Fn(u16) -> u8) -> u8 {
        let rel_cycle = cycle % self.timing.cycles_per_frame;
        if rel_cycle < self.timing.screen_start_cycle() {
            return 0xFF;
        }

        let screen_cycle = rel_cycle - self.timing.screen_start_cycle();
        let line = screen_cycle / self.timing.cycles_per_line;
        if line >= SCREEN_LINES {
            return 0xFF;
        }

        let line_cycle = screen_cycle % self.timing.cycles_per_line;
        if line_cycle >= CONTENTION_END_CYCLE {
            return 0xFF;
        }

        let char_x = (line_cycle / 4) as u16;
        match line_cycle % 8 {
            0 | 4 => read_vram(self.line_addresses[line as usize] + char_x),
            1 | 5 => {
                let char_y = (line >> 3) as u16;
                read_vram(0x1800 + char_y * 32 + char_x)
            }
            _ => 0xFF,
        }
    }

    // === Audio ===

    /// Render `samples` mono beeper samples covering `cycles_in_frame`
    /// T-states from the end of the previous window. Event cycles map
    /// linearly to sample indices; the level holds between events and
    /// the final level carries into the next window. Consumed events are
    /// dropped.
    pub fn render_beeper(&mut self, samples: usize, cycles_in_frame: u64) -> Vec<f32> {
        let mut buffer = vec![0.0f32; samples];
        if cycles_in_frame == 0 {
            return buffer;
        }

        let start_cycle = self.last_audio_cycle;
        let end_cycle = start_cycle + cycles_in_frame;

        let mut events: Vec<(u64, u8)> = self
            .audio_events
            .iter()
            .copied()
            .filter(|&(cycle, _)| cycle < end_cycle)
            .collect();
        events.sort_by_key(|&(cycle, _)| cycle);
        // Sentinel fills the tail of the window with the final level.
        events.push((end_cycle, self.render_beeper_level));

        let mut level = self.render_beeper_level;
        let mut sample_idx = 0usize;
        for (cycle, next_level) in events {
            let event_cycle = cycle.max(start_cycle);
            let mut next_idx =
                ((event_cycle - start_cycle) * samples as u64 / cycles_in_frame) as usize;
            next_idx = next_idx.clamp(sample_idx, samples);

            let amplitude = BEEPER_AMPLITUDE[level as usize];
            for slot in &mut buffer[sample_idx..next_idx] {
                *slot = amplitude;
            }

            sample_idx = next_idx;
            level = next_level;
        }

        self.render_beeper_level = level;
        self.last_audio_cycle = end_cycle;
        self.audio_events.retain(|&(cycle, _)| cycle >= end_cycle);

        buffer
    }

    // === Video ===

    /// Rasterise one frame into the internal RGB buffer and return it.
    ///
    /// Border colour is replayed per scanline from the border event log
    /// (events up to `line * cycles_per_line` take effect); the log is
    /// then flushed and the final colour carried forward. FLASH swaps
    /// ink and paper on flagged cells every 16 frames.
    ///
    /// `read_vram` takes a bank-relative offset into the screen bank.
    pub fn render_screen(&mut self, read_vram: impl Fn(u16) -> u8) -> &[u8] {
        self.border_events.sort_by_key(|&(cycle, _)| cycle);

        // Border first: one colour per scanline.
        let mut event_idx = 0;
        let mut color = self.last_frame_border_color;
        for y in 0..FB_HEIGHT {
            let line_cycle = y as u64 * self.timing.cycles_per_line;
            while event_idx < self.border_events.len()
                && self.border_events[event_idx].0 <= line_cycle
            {
                color = self.border_events[event_idx].1;
                event_idx += 1;
            }

            let rgb = PALETTE[color as usize];
            let row = &mut self.framebuffer[y * FB_WIDTH * 3..(y + 1) * FB_WIDTH * 3];
            for pixel in row.chunks_exact_mut(3) {
                pixel.copy_from_slice(&rgb);
            }
        }
        self.last_frame_border_color = color;
        self.border_events.clear();

        let flash_active = (self.flash_counter >> 4) & 1 != 0;
        self.flash_counter = (self.flash_counter + 1) % 32;

        // Screen area: 192 lines of 32 character cells.
        for y in 0..192 {
            let line_addr = self.line_addresses[y];
            let char_y = y >> 3;
            let row_base = (y + BORDER) * FB_WIDTH * 3;

            for char_x in 0..32u16 {
                let bits = read_vram(line_addr + char_x);
                let attr = read_vram(0x1800 + (char_y as u16) * 32 + char_x);

                let mut ink = attr & 0x07;
                let mut paper = (attr >> 3) & 0x07;
                let bright = (attr >> 6) & 0x01;
                if flash_active && attr & 0x80 != 0 {
                    core::mem::swap(&mut ink, &mut paper);
                }
                let ink_rgb = PALETTE[(ink + (bright << 3)) as usize];
                let paper_rgb = PALETTE[(paper + (bright << 3)) as usize];

                for bit in 0..8 {
                    let rgb = if bits & (0x80 >> bit) != 0 {
                        ink_rgb
                    } else {
                        paper_rgb
                    };
                    let offset = row_base + (BORDER + char_x as usize * 8 + bit) * 3;
                    self.framebuffer[offset..offset + 3].copy_from_slice(&rgb);
                }
            }
        }

        &self.framebuffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bank-sized VRAM for closure-based reads.
    struct TestVram {
        data: [u8; 0x4000],
    }

    impl TestVram {
        fn new() -> Self {
            Self { data: [0; 0x4000] }
        }

        fn write(&mut self, offset: u16, value: u8) {
            self.data[offset as usize] = value;
        }

        fn peek(&self, offset: u16) -> u8 {
            self.data[offset as usize]
        }
    }

    #[test]
    fn contention_pattern_at_screen_start() {
        let ula = Ula::new(false);
        // 48K screen starts at 64 * 224 = 14336
        let expected: [u32; 8] = [6, 5, 4, 3, 2, 1, 0, 0];
        for (i, &want) in expected.iter().enumerate() {
            assert_eq!(
                ula.contention(14_336 + i as u64, true),
                want,
                "offset {i}"
            );
        }
        // Second group repeats the pattern
        assert_eq!(ula.contention(14_344, true), 6);
    }

    #[test]
    fn contention_needs_contended_address() {
        let ula = Ula::new(false);
        assert_eq!(ula.contention(14_336, false), 0);
    }

    #[test]
    fn contention_outside_screen() {
        let ula = Ula::new(false);
        // Before the screen area
        assert_eq!(ula.contention(0, true), 0);
        assert_eq!(ula.contention(14_335, true), 0);
        // Past the 128-cycle window of a line
        assert_eq!(ula.contention(14_336 + 128, true), 0);
        // Below the last visible line
        assert_eq!(ula.contention(14_336 + 192 * 224, true), 0);
    }

    #[test]
    fn contention_128k_timing() {
        let ula = Ula::new(true);
        // 128K screen starts at 63 * 228 = 14364
        assert_eq!(ula.contention(14_364, true), 6);
        assert_eq!(ula.contention(14_363, true), 0);
    }

    #[test]
    fn io_contention_four_phases() {
        let ula = Ula::new(false);
        // Phase walk from 14336: 6 at offset 0, then offsets 7, 8, 9
        // give 0, 6 is consumed... delays 6 + 0 + 6 + 0 = 12
        assert_eq!(ula.io_contention(14_336, true, false), 12);
        assert_eq!(ula.io_contention(14_336, false, true), 12);
    }

    #[test]
    fn io_contention_uncontended_port() {
        let ula = Ula::new(false);
        assert_eq!(ula.io_contention(14_336, false, false), 0);
    }

    #[test]
    fn floating_bus_fetch_schedule() {
        let mut vram = TestVram::new();
        let ula = Ula::new(false);

        // Line 0, char 0: bitmap at offset 0, attribute at 0x1800
        vram.write(0x0000, 0xA5);
        vram.write(0x1800, 0x42);

        assert_eq!(ula.floating_bus(14_336, |a| vram.peek(a)), 0xA5);
        assert_eq!(ula.floating_bus(14_337, |a| vram.peek(a)), 0x42);
        // Phases 2 and 3 idle
        assert_eq!(ula.floating_bus(14_338, |a| vram.peek(a)), 0xFF);
        assert_eq!(ula.floating_bus(14_339, |a| vram.peek(a)), 0xFF);

        // Phases 4/5 fetch the next character pair
        vram.write(0x0001, 0x99);
        vram.write(0x1801, 0x17);
        assert_eq!(ula.floating_bus(14_340, |a| vram.peek(a)), 0x99);
        assert_eq!(ula.floating_bus(14_341, |a| vram.peek(a)), 0x17);
    }

    #[test]
    fn floating_bus_idle_outside_screen() {
        let vram = TestVram::new();
        let ula = Ula::new(false);

        assert_eq!(ula.floating_bus(0, |a| vram.peek(a)), 0xFF);
        // Past the 128-cycle fetch window
        assert_eq!(ula.floating_bus(14_336 + 130, |a| vram.peek(a)), 0xFF);
    }

    #[test]
    fn keyboard_no_keys() {
        let mut ula = Ula::new(false);
        let value = ula.read_port(0xFEFE).expect("even port answers");
        assert_eq!(value, 0x1F | 0xA0);
    }

    #[test]
    fn keyboard_single_row() {
        let mut ula = Ula::new(false);
        ula.set_key(0xFE, 0, true); // SHIFT

        let value = ula.read_port(0xFEFE).expect("row 0 selected");
        assert_eq!(value & 0x1F, 0x1E);

        // Other rows unaffected
        let value = ula.read_port(0xFDFE).expect("row 1 selected");
        assert_eq!(value & 0x1F, 0x1F);

        ula.set_key(0xFE, 0, false);
        let value = ula.read_port(0xFEFE).expect("row 0 selected");
        assert_eq!(value & 0x1F, 0x1F);
    }

    #[test]
    fn keyboard_multiple_rows_and_together() {
        let mut ula = Ula::new(false);
        ula.set_key(0xFE, 0, true);
        ula.set_key(0x7F, 4, true);

        // High byte 0x7E selects rows 0 and 7 at once
        let value = ula.read_port(0x7EFE).expect("even port answers");
        assert_eq!(value & 0x1F, 0x1F & !0x01 & !0x10);
    }

    #[test]
    fn odd_port_not_claimed() {
        let mut ula = Ula::new(false);
        assert!(ula.read_port(0xFEFF).is_none());
    }

    #[test]
    fn port_write_decodes_bits() {
        let mut ula = Ula::new(false);
        ula.write_port(0x00FE, 0b0001_1010, 0);
        assert_eq!(ula.border_color(), 2);
        assert_eq!(ula.beeper_level(), 0b11);

        // Odd ports ignored
        ula.write_port(0x00FF, 0x05, 0);
        assert_eq!(ula.border_color(), 2);
    }

    #[test]
    fn beeper_events_only_on_change() {
        let mut ula = Ula::new(false);
        ula.write_port(0x00FE, 0x10, 100); // EAR on
        ula.write_port(0x00FE, 0x10, 200); // unchanged -> no event
        ula.write_port(0x00FE, 0x00, 300); // EAR off

        let buffer = ula.render_beeper(8, 400);
        // Levels: 0 until cycle 100 (samples 0-1), EAR-only until 300
        // (samples 2-5), then 0 again
        assert_eq!(buffer[0], BEEPER_AMPLITUDE[0]);
        assert_eq!(buffer[1], BEEPER_AMPLITUDE[0]);
        assert_eq!(buffer[2], BEEPER_AMPLITUDE[2]);
        assert_eq!(buffer[5], BEEPER_AMPLITUDE[2]);
        assert_eq!(buffer[6], BEEPER_AMPLITUDE[0]);
        assert_eq!(buffer[7], BEEPER_AMPLITUDE[0]);
    }

    #[test]
    fn beeper_level_carries_across_windows() {
        let mut ula = Ula::new(false);
        ula.write_port(0x00FE, 0x10, 50);

        let _ = ula.render_beeper(4, 100);
        // No further events: the held level fills the whole next window
        let buffer = ula.render_beeper(4, 100);
        assert!(buffer.iter().all(|&s| s == BEEPER_AMPLITUDE[2]));
    }

    #[test]
    fn render_screen_paper_and_ink() {
        let mut vram = TestVram::new();
        let mut ula = Ula::new(false);

        // Cell (0,0): ink white, paper blue, leftmost pixel set
        vram.write(0x0000, 0x80);
        vram.write(0x1800, (1 << 3) | 7);

        let frame = ula.render_screen(|a| vram.peek(a));

        let pixel = |x: usize, y: usize| {
            let off = (y * FB_WIDTH + x) * 3;
            [frame[off], frame[off + 1], frame[off + 2]]
        };
        // First screen pixel is ink (white)
        assert_eq!(pixel(BORDER, BORDER), PALETTE[7]);
        // Second pixel is paper (blue)
        assert_eq!(pixel(BORDER + 1, BORDER), PALETTE[1]);
    }

    #[test]
    fn render_screen_bright_attribute() {
        let mut vram = TestVram::new();
        let mut ula = Ula::new(false);

        vram.write(0x0000, 0xFF);
        vram.write(0x1800, 0x40 | 0x02); // bright, ink red

        let frame = ula.render_screen(|a| vram.peek(a));
        let off = (BORDER * FB_WIDTH + BORDER) * 3;
        assert_eq!(&frame[off..off + 3], &PALETTE[8 + 2]);
    }

    #[test]
    fn flash_swaps_after_16_frames() {
        let mut vram = TestVram::new();
        let mut ula = Ula::new(false);

        // FLASH cell: ink white, paper black, pixel set
        vram.write(0x0000, 0x80);
        vram.write(0x1800, 0x80 | 0x07);

        let off = (BORDER * FB_WIDTH + BORDER) * 3;
        for _ in 0..16 {
            let frame = ula.render_screen(|a| vram.peek(a));
            assert_eq!(&frame[off..off + 3], &PALETTE[7], "normal phase: ink");
        }
        for _ in 0..16 {
            let frame = ula.render_screen(|a| vram.peek(a));
            assert_eq!(&frame[off..off + 3], &PALETTE[0], "flash phase: paper");
        }
        let frame = ula.render_screen(|a| vram.peek(a));
        assert_eq!(&frame[off..off + 3], &PALETTE[7], "back to normal");
    }

    #[test]
    fn border_events_split_scanlines() {
        let vram = TestVram::new();
        let mut ula = Ula::new(false);

        // Blue from the start of the frame, red from line 100
        ula.write_port(0x00FE, 1, 0);
        ula.write_port(0x00FE, 2, 224 * 100);

        let frame = ula.render_screen(|a| vram.peek(a));

        let line = |y: usize| {
            let off = y * FB_WIDTH * 3;
            [frame[off], frame[off + 1], frame[off + 2]]
        };
        assert_eq!(line(50), PALETTE[1]);
        assert_eq!(line(150), PALETTE[2]);
    }

    #[test]
    fn border_color_carries_to_next_frame() {
        let vram = TestVram::new();
        let mut ula = Ula::new(false);

        ula.write_port(0x00FE, 5, 0);
        let _ = ula.render_screen(|a| vram.peek(a));

        // No new events: the whole next frame keeps cyan
        let frame = ula.render_screen(|a| vram.peek(a));
        assert_eq!(&frame[0..3], &PALETTE[5]);
        let last = (FB_HEIGHT - 1) * FB_WIDTH * 3;
        assert_eq!(&frame[last..last + 3], &PALETTE[5]);
    }

    #[test]
    fn scanline_addresses_interleave() {
        let ula = Ula::new(false);
        // Line 0 -> 0x0000, line 1 -> 0x0100, line 8 -> 0x0020,
        // line 64 -> 0x0800 (second third)
        assert_eq!(ula.line_addresses[0], 0x0000);
        assert_eq!(ula.line_addresses[1], 0x0100);
        assert_eq!(ula.line_addresses[8], 0x0020);
        assert_eq!(ula.line_addresses[64], 0x0800);
        assert_eq!(ula.line_addresses[191], 0x17E0);
    }
}
