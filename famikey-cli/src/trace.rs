//! Bit recovery from 6502 trace logs.
//!
//! The BASIC save routine drives the tape line through $4016: it loads
//! #$FF to raise it, #$04 to drop it, and burns a DEC countdown between
//! the writes. In a trace of that routine the pulse widths survive as
//! loop counts, 52 iterations for a short (0) pulse and 106 for a long
//! (1) pulse, so a log is enough to reconstruct the bit stream without
//! any audio.

use anyhow::{bail, Context, Result};

/// Decode a trace log into tape bits.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut bits = Vec::new();
    let mut in_high = false;
    let mut count = 0u32;

    for (i, line) in text.lines().enumerate() {
        if line.contains("LDA") {
            if in_high {
                let bit = classify(count).with_context(|| format!("line {}", i + 1))?;
                bits.push(bit);
            }
            if line.contains("#$04") {
                in_high = false;
                count = 0;
            }
            if line.contains("#$FF") {
                in_high = true;
                count = 0;
            }
        }
        if line.contains("DEC") {
            count += 1;
        }
    }

    // The last pulse has no LDA after it to close it out.
    if in_high {
        bits.push(classify(count).context("end of trace")?);
    }

    Ok(bits)
}

fn classify(count: u32) -> Result<u8> {
    match count {
        52 => Ok(0),
        106 => Ok(1),
        other => bail!("unexpected loop count {}", other),
    }
}
