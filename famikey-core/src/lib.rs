//! Scan and debounce core for the famikey adapter.
//!
//! famikey puts a Family BASIC keyboard (HVC-007) on USB: an ATmega32U4
//! board speaks the keyboard's expansion-port protocol on one side and
//! enumerates as a HID keyboard on the other. Everything that does not
//! touch a hardware register lives in this crate, so the AVR firmware
//! and the native CLI share one implementation and the whole pipeline is
//! testable on the host.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod debounce;
pub mod keycode;
pub mod keymap;
pub mod matrix;

pub use debounce::{KeySet, DEBOUNCE_MASK};
pub use keycode::KeyCode;
pub use matrix::{ControlLine, Matrix, MatrixBus};

/// USB vendor ID the adapter enumerates with (Van Ooijen Technische
/// Informatica, shared ID space).
pub const USB_VID: u16 = 0x16C0;
/// USB product ID (shared space slot for keyboards).
pub const USB_PID: u16 = 0x27DB;

/// Where accepted key transitions go.
///
/// The debounce layer reports through this trait so the same scan loop
/// can drive a real HID endpoint or a serial logger, picked at boot.
pub trait EventSink {
    fn press(&mut self, code: KeyCode);
    fn release(&mut self, code: KeyCode);
}
