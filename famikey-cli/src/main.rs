mod cassette;
mod trace;
mod wav;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use famikey_core::keymap::{COLS, KEY_CODES, ROWS};
use famikey_core::{USB_PID, USB_VID};
use std::fs;
use std::io::Read;

#[derive(Parser)]
#[command(name = "famikey")]
#[command(about = "Host-side tools for the famikey keyboard adapter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a cassette recording (.wav) or a 6502 trace log into tape blocks
    Decode {
        /// Path to the capture, or - for stdin (trace logs only)
        input: String,
    },
    /// Detect whether a famikey adapter is connected
    Detect,
    /// Print the key matrix the way the firmware maps it
    Layout,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Decode { input } => {
            let bits = if input.ends_with(".wav") {
                let data = fs::read(&input).with_context(|| format!("reading {}", input))?;
                let audio = wav::parse(&data).context("parsing WAV file")?;

                println!("sample rate: {} Hz", audio.sample_rate);
                println!("bits/sample: {}", audio.bits_per_sample);
                println!("channels:    {}", audio.channels);
                println!(
                    "duration:    {:.1}s",
                    audio.samples.len() as f64 / audio.sample_rate as f64
                );

                cassette::demodulate(&audio)
            } else {
                let text = if input == "-" {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                } else {
                    fs::read_to_string(&input).with_context(|| format!("reading {}", input))?
                };
                trace::decode(&text).context("decoding trace log")?
            };

            print_blocks(&bits)?;
        }
        Command::Detect => {
            let devices = rusb::devices().context("failed to enumerate USB devices")?;
            let mut found = false;
            for device in devices.iter() {
                let desc = device
                    .device_descriptor()
                    .context("failed to read device descriptor")?;
                if desc.vendor_id() == USB_VID && desc.product_id() == USB_PID {
                    println!(
                        "famikey adapter on bus {} device {}.",
                        device.bus_number(),
                        device.address()
                    );
                    found = true;
                }
            }
            if !found {
                println!("famikey adapter not detected.");
                println!("Check the USB cable, or the strap pin if it boots in serial mode.");
            }
        }
        Command::Layout => {
            for row in 0..ROWS {
                let mut line = format!("row {}:", row);
                for col in 0..COLS {
                    line.push_str(&format!(" {:>5}", KEY_CODES[row * COLS + col].name()));
                }
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Walk the bit stream and print every tape block.
fn print_blocks(bits: &[u8]) -> Result<()> {
    let mut reader = cassette::BlockReader::new(bits);
    let mut blocks = 0usize;

    while let Some(block) = reader.next_block()? {
        blocks += 1;
        println!("---- block start ----");
        println!("start zeros: {}", block.gap_zeros);
        match block.kind {
            cassette::BlockKind::Info(info) => {
                println!("attrib:   {:02x}", info.attrib);
                println!("name:     {}", String::from_utf8_lossy(&info.name));
                println!("reserved: {:02x}", info.reserved);
                println!("dataLen:  {:04x}", info.data_len);
                println!("loadAddr: {:04x}", info.load_addr);
                println!("callAddr: {:04x}", info.call_addr);
                println!("checksum: {:04x}", info.checksum);
            }
            cassette::BlockKind::Data(data) => {
                println!("data block: {} bytes", data.payload.len());
                print!("{}", cassette::render_payload(data.attrib, &data.payload)?);
                println!("checksum: {:04x}", data.checksum);
            }
        }
    }

    println!("---- end of tape: {} blocks ----", blocks);
    Ok(())
}
