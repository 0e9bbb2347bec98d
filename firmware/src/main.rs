//! famikey firmware for ATmega32U4 (Arduino Leonardo / Pro Micro).
//!
//! Puts a Family BASIC keyboard (HVC-007) on USB:
//! - Drives the expansion-port scan protocol and reads the four data
//!   lines through the connector wiring in [`bus`]
//! - Runs the shared matrix sweep and per-key debounce every ~5 ms
//! - Reports accepted edges as 6KRO USB HID updates, or as text lines on
//!   USART1 when the strap pin is grounded at power-up

#![no_std]
#![no_main]
#![feature(asm_experimental_arch)]

mod bus;
mod hid;
mod serial;

use avr_device::atmega32u4::Peripherals;

use bus::KeyboardBus;
use famikey_core::{KeySet, Matrix};
use hid::UsbKeyboard;

/// Panic handler — on AVR we just loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Main entry point.
#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Configure system clock (16MHz from the board crystal)
    // Disable clock prescaler (CLKPR)
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) }); // Prescaler = 1

    // Initialize LED on PC7 (Leonardo on-board LED) for diagnostics
    dp.PORTC.ddrc.modify(|r, w| unsafe { w.bits(r.bits() | 0x80) });

    // Strap pin PE6: input with pull-up, jumper to ground selects serial
    // logging instead of USB HID. Sampled once at power-up.
    dp.PORTE.ddre.modify(|r, w| unsafe { w.bits(r.bits() & !0x40) });
    dp.PORTE.porte.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });
    for _ in 0..100u8 {
        unsafe { core::arch::asm!("nop") };
    }
    let log_serial = dp.PORTE.pine.read().bits() & 0x40 == 0;

    // Claim the keyboard connector pins
    let mut matrix = Matrix::new(KeyboardBus::new(&dp));

    // Key state, one entry per matrix position
    let mut keys = KeySet::new();

    let mut usb = UsbKeyboard::new();
    if log_serial {
        serial::init(&dp);
        serial::write_str(&dp, "famikey: serial log mode\r\n");
    } else {
        usb.init(&dp);
    }

    // TC0 paces the scan: CTC at 16MHz/1024/78 ticks = 4.99ms per cycle
    dp.TC0.tccr0a.write(|w| unsafe { w.bits(0x02) }); // WGM01 (CTC)
    dp.TC0.tccr0b.write(|w| unsafe { w.bits(0x05) }); // CS02|CS00 (/1024)
    dp.TC0.ocr0a.write(|w| unsafe { w.bits(77) });

    // LED on to indicate firmware is running
    dp.PORTC
        .portc
        .modify(|r, w| unsafe { w.bits(r.bits() | 0x80) });

    loop {
        // Service USB while waiting out the rest of the scan period
        while dp.TC0.tifr0.read().bits() & 0x02 == 0 {
            if !log_serial {
                usb.poll(&dp);
            }
        }
        // Writing OCF0A back clears it
        dp.TC0.tifr0.write(|w| unsafe { w.bits(0x02) });

        // One full sweep: reset, 9 rows of two nibbles each
        matrix.scan(&mut keys);

        // Debounce and report edges
        if log_serial {
            let mut sink = serial::SerialLogger { dp: &dp };
            keys.update(&mut sink);
        } else {
            let mut sink = hid::HidSink {
                dp: &dp,
                usb: &mut usb,
            };
            keys.update(&mut sink);
        }
    }
}
