//! USART1 serial output.
//!
//! Bench bring-up channel: grounding the strap pin at power-up makes the
//! firmware print key events here as text instead of sending HID reports.
//! TX is PD3 (Leonardo D1).

use avr_device::atmega32u4::Peripherals;
use famikey_core::{EventSink, KeyCode};

/// Configure USART1 for 115200 8N1. Double-speed mode with UBRR = 16 is
/// the datasheet setting for 16 MHz (+2.1% rate error).
pub fn init(dp: &Peripherals) {
    let usart = &dp.USART1;
    usart.ubrr1.write(|w| unsafe { w.bits(16) });
    usart.ucsr1a.write(|w| unsafe { w.bits(0x02) }); // U2X1
    usart.ucsr1c.write(|w| unsafe { w.bits(0x06) }); // 8 data bits, 1 stop
    usart.ucsr1b.write(|w| unsafe { w.bits(0x08) }); // TXEN1
}

fn write_byte(dp: &Peripherals, byte: u8) {
    // Wait for UDRE1 (data register empty).
    while dp.USART1.ucsr1a.read().bits() & 0x20 == 0 {}
    dp.USART1.udr1.write(|w| unsafe { w.bits(byte) });
}

pub fn write_str(dp: &Peripherals, s: &str) {
    for &b in s.as_bytes() {
        write_byte(dp, b);
    }
}

/// Logs accepted key transitions as one line per event.
pub struct SerialLogger<'a> {
    pub dp: &'a Peripherals,
}

impl EventSink for SerialLogger<'_> {
    fn press(&mut self, code: KeyCode) {
        write_str(self.dp, "press ");
        write_str(self.dp, code.name());
        write_str(self.dp, "\r\n");
    }

    fn release(&mut self, code: KeyCode) {
        write_str(self.dp, "release ");
        write_str(self.dp, code.name());
        write_str(self.dp, "\r\n");
    }
}
