//! Board wiring of the keyboard connector.
//!
//! Pin map (Arduino Leonardo numbering):
//!   D10 = PB6 -> device select
//!   D9  = PB5 -> column select
//!   D8  = PB4 -> row reset
//!   A3-A0 = PF4-PF7 <- keyboard data D1-D4
//!
//! The data lines land in the high nibble of PINF, bit 4 = D1, exactly
//! how the scan core expects them.

use avr_device::atmega32u4::Peripherals;
use famikey_core::{ControlLine, MatrixBus};

const DEVICE_SELECT: u8 = 1 << 6; // PB6
const COLUMN_SELECT: u8 = 1 << 5; // PB5
const ROW_RESET: u8 = 1 << 4; // PB4
const CONTROL_PINS: u8 = DEVICE_SELECT | COLUMN_SELECT | ROW_RESET;

pub struct KeyboardBus<'a> {
    dp: &'a Peripherals,
}

impl<'a> KeyboardBus<'a> {
    /// Claim the connector pins: PB4-PB6 as low outputs, PF4-PF7 as plain
    /// inputs (the keyboard drives them, no pull-ups wanted).
    pub fn new(dp: &'a Peripherals) -> Self {
        let portb = &dp.PORTB;
        let portf = &dp.PORTF;

        portb.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | CONTROL_PINS) });
        portb
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() & !CONTROL_PINS) });

        portf.ddrf.modify(|r, w| unsafe { w.bits(r.bits() & !0xF0) });
        portf.portf.modify(|r, w| unsafe { w.bits(r.bits() & !0xF0) });

        Self { dp }
    }

    fn mask(line: ControlLine) -> u8 {
        match line {
            ControlLine::DeviceSelect => DEVICE_SELECT,
            ControlLine::ColumnSelect => COLUMN_SELECT,
            ControlLine::RowReset => ROW_RESET,
        }
    }
}

impl MatrixBus for KeyboardBus<'_> {
    fn write_line(&mut self, line: ControlLine, level: bool) {
        let mask = Self::mask(line);
        let portb = &self.dp.PORTB;
        if level {
            portb.portb.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
        } else {
            portb.portb.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        }
    }

    fn read_lines(&mut self) -> u8 {
        self.dp.PORTF.pinf.read().bits() & 0xF0
    }

    fn delay_us(&mut self, us: u16) {
        // ~4 cycles per iteration at 16 MHz.
        for _ in 0..(us as u32) * 4 {
            unsafe { core::arch::asm!("nop") };
        }
    }
}
