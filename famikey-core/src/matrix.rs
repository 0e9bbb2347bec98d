//! Matrix acquisition for the HVC-007.
//!
//! The keyboard hangs off the console expansion port and multiplexes its
//! 9x8 switch matrix onto four data lines. Three control lines drive it:
//! device select (1 = keyboard, 0 = data recorder), column select
//! (low/high half of the current row) and row reset. The keyboard holds
//! an internal row counter that rewinds while row reset is high and
//! advances on every falling edge of column select, so a scan is a strict
//! reset-then-sweep sequence. The line patterns mirror the console's
//! $4016 writes (0x05, 0x04, 0x06, 0x04).

use crate::debounce::KeySet;
use crate::keymap::ROWS;

/// Width of the row-reset pulse.
pub const RESET_PULSE_US: u16 = 10;
/// Settle time after toggling column select, sized for the keyboard's
/// multiplexer at its native 1.79 MHz timing.
pub const SETTLE_US: u16 = 30;

/// Control lines on the expansion connector.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ControlLine {
    /// 1 selects the keyboard, 0 routes the data recorder.
    DeviceSelect,
    /// Switches the column multiplexer between half-rows.
    ColumnSelect,
    /// Rewinds the keyboard's internal row counter while high.
    RowReset,
}

/// Digital I/O the scanner needs from the board.
///
/// `read_lines` returns the four data lines packed into bits 4-7, bit 4
/// being D1 (the first key of the selected half-row). A set bit means the
/// key is closed; the keyboard's output stage already yields active-high
/// data, so no inversion happens anywhere downstream.
pub trait MatrixBus {
    fn write_line(&mut self, line: ControlLine, level: bool);
    fn read_lines(&mut self) -> u8;
    fn delay_us(&mut self, us: u16);
}

/// Sweeps the matrix through a [`MatrixBus`] into a [`KeySet`].
pub struct Matrix<B: MatrixBus> {
    bus: B,
}

impl<B: MatrixBus> Matrix<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Select the keyboard and rewind its row counter to row 0.
    pub fn reset(&mut self) {
        self.bus.write_line(ControlLine::DeviceSelect, true);
        self.bus.write_line(ControlLine::ColumnSelect, false);
        self.bus.write_line(ControlLine::RowReset, true);
        self.bus.delay_us(RESET_PULSE_US);
        self.bus.write_line(ControlLine::RowReset, false);
        self.bus.delay_us(SETTLE_US);
    }

    /// Acquire one full sweep of the matrix into `keys`.
    ///
    /// Each row is read as two nibbles: columns 0-3 with column select
    /// low, columns 4-7 with it high. Dropping column select back low
    /// advances the keyboard to the next row.
    pub fn scan(&mut self, keys: &mut KeySet) {
        self.reset();

        for row in 0..ROWS {
            // Low half: D4321 sit in bits 4-7, shift down to columns 0-3.
            let mut bits = self.bus.read_lines() >> 4;

            self.bus.write_line(ControlLine::ColumnSelect, true);
            self.bus.delay_us(SETTLE_US);

            // High half lands on columns 4-7 unshifted.
            bits |= self.bus.read_lines();

            keys.set_levels(row, bits);

            self.bus.write_line(ControlLine::ColumnSelect, false);
            self.bus.delay_us(SETTLE_US);
        }
    }
}
