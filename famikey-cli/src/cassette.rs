//! Family BASIC cassette (CMT) decoding.
//!
//! Programs are saved to tape as audio pulses: a short pulse (about
//! 1917 Hz) carries a 0 bit and a long pulse (about 958 Hz) carries a
//! 1 bit. Bytes travel in 9-bit frames, a start bit followed by eight
//! data bits MSB-first, and multi-byte fields put the low byte first.
//!
//! A recording alternates gaps and blocks. Every block starts with a
//! run of zero bits and a 20-bit tape mark of ones. An info block
//! extends the mark with 20 more ones and 40 zeros, then carries the
//! file name and the byte length of the data blocks that follow it.
//! A data block follows the mark with 20 zeros and carries the
//! payload. Block bodies are framed by single 1 bits and end with a
//! 16-bit checksum.

use anyhow::{bail, ensure, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::wav::WavAudio;

/// Carrier frequency of a 0 bit, in Hz.
const ZERO_HZ: u32 = 1917;
/// Carrier frequency of a 1 bit, in Hz.
const ONE_HZ: u32 = 958;

/// Turn PCM samples into a bit stream by measuring pulse widths.
///
/// A pulse is a run of samples above the high threshold. Runs at least
/// as long as half a 958 Hz period read as 1, runs at least as long as
/// half a 1917 Hz period read as 0, and anything shorter is noise. A
/// run still open when the capture ends is dropped.
pub fn demodulate(audio: &WavAudio) -> Vec<u8> {
    // Half-period sample counts, less a two-sample margin.
    let count_for_zero = (audio.sample_rate / ZERO_HZ / 2).saturating_sub(2);
    let count_for_one = (audio.sample_rate / ONE_HZ / 2).saturating_sub(2);

    let th = 1i32 << (audio.bits_per_sample - 1);
    let th_hi = if audio.bits_per_sample == 8 {
        // unsigned samples
        th * 7 / 5
    } else {
        th * 7 / 5 - th
    };

    let pb = ProgressBar::new(audio.samples.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} samples")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message("Demodulating");

    let mut bits = Vec::new();
    let mut run = 0u32;
    for (i, &sample) in audio.samples.iter().enumerate() {
        if i & 0x3fff == 0 {
            pb.set_position(i as u64);
        }
        if sample > th_hi {
            run += 1;
        } else if run != 0 {
            if run >= count_for_one {
                bits.push(1);
            } else if run >= count_for_zero {
                bits.push(0);
            }
            run = 0;
        }
    }

    pb.finish_with_message("Demodulated");
    bits
}

/// Decode one 9-bit frame: a start bit, then the data bits MSB-first.
pub fn decode_frame(frame: &[u8]) -> Result<u8> {
    ensure!(frame.len() == 9, "frame is {} bits, want 9", frame.len());
    ensure!(frame[0] == 1, "missing start bit");
    let mut byte = 0u8;
    for (i, &bit) in frame[1..].iter().enumerate() {
        byte |= bit << (7 - i);
    }
    Ok(byte)
}

#[derive(Debug)]
pub struct Block {
    /// Zero bits skipped before the tape mark.
    pub gap_zeros: usize,
    pub kind: BlockKind,
}

#[derive(Debug)]
pub enum BlockKind {
    Info(InfoBlock),
    Data(DataBlock),
}

/// Header naming a file and sizing the data blocks after it.
#[derive(Debug)]
pub struct InfoBlock {
    pub attrib: u8,
    pub name: Vec<u8>,
    pub reserved: u8,
    pub data_len: u16,
    pub load_addr: u16,
    pub call_addr: u16,
    pub checksum: u16,
}

#[derive(Debug)]
pub struct DataBlock {
    /// Attrib of the info block that sized this one.
    pub attrib: u8,
    pub payload: Vec<u8>,
    pub checksum: u16,
}

/// Walks a demodulated bit stream block by block.
///
/// The dataLen and attrib fields of an info block apply to every data
/// block until the next info block, so the reader carries them across
/// calls.
pub struct BlockReader<'a> {
    bits: &'a [u8],
    pos: usize,
    data_len: u16,
    attrib: u8,
}

impl<'a> BlockReader<'a> {
    pub fn new(bits: &'a [u8]) -> Self {
        BlockReader {
            bits,
            pos: 0,
            data_len: 0,
            attrib: 0,
        }
    }

    /// Read the next block, or `None` once the tape runs out of pulses.
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        let mut gap_zeros = 0usize;
        loop {
            match self.bits.get(self.pos) {
                None => return Ok(None),
                Some(0) => {
                    gap_zeros += 1;
                    self.pos += 1;
                }
                Some(_) => break,
            }
        }

        self.expect_run(1, 20).context("tape mark")?;

        // A second run of ones announces an info block.
        let kind = if self.peek()? == 1 {
            self.expect_run(1, 20).context("info block mark")?;
            self.expect_run(0, 40).context("info block mark")?;
            BlockKind::Info(self.read_info()?)
        } else {
            self.expect_run(0, 20).context("data block mark")?;
            BlockKind::Data(self.read_data()?)
        };

        Ok(Some(Block { gap_zeros, kind }))
    }

    fn peek(&self) -> Result<u8> {
        match self.bits.get(self.pos) {
            Some(&bit) => Ok(bit),
            None => bail!("tape ends at bit {}", self.pos),
        }
    }

    fn expect_bit(&mut self, want: u8) -> Result<()> {
        let got = self.peek()?;
        ensure!(got == want, "bit {}: found {}, want {}", self.pos, got, want);
        self.pos += 1;
        Ok(())
    }

    fn expect_run(&mut self, want: u8, count: usize) -> Result<()> {
        for _ in 0..count {
            self.expect_bit(want)?;
        }
        Ok(())
    }

    fn frame_byte(&mut self) -> Result<u8> {
        ensure!(
            self.pos + 9 <= self.bits.len(),
            "tape ends inside a frame at bit {}",
            self.pos
        );
        let byte = decode_frame(&self.bits[self.pos..self.pos + 9])
            .with_context(|| format!("frame at bit {}", self.pos))?;
        self.pos += 9;
        Ok(byte)
    }

    /// Two frames, low byte first.
    fn frame_u16(&mut self) -> Result<u16> {
        let lo = self.frame_byte()?;
        let hi = self.frame_byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// The 16-frame name field, null-terminated. Frames past the
    /// terminator are skipped without validation.
    fn frame_name(&mut self) -> Result<Vec<u8>> {
        let end = self.pos + 16 * 9;
        ensure!(end <= self.bits.len(), "tape ends inside the name field");
        let mut name = Vec::new();
        while self.pos < end {
            let byte = self.frame_byte().context("name")?;
            if byte == 0x00 {
                break;
            }
            name.push(byte);
        }
        self.pos = end;
        Ok(name)
    }

    fn read_info(&mut self) -> Result<InfoBlock> {
        self.expect_bit(1).context("info block start bit")?;
        let attrib = self.frame_byte().context("attrib")?;
        let name = self.frame_name()?;
        let reserved = self.frame_byte().context("reserved")?;
        let data_len = self.frame_u16().context("dataLen")?;
        let load_addr = self.frame_u16().context("loadAddr")?;
        let call_addr = self.frame_u16().context("callAddr")?;

        // 104 spare frames, unused and unvalidated.
        let spare = 104 * 9;
        ensure!(
            self.pos + spare <= self.bits.len(),
            "tape ends inside the spare field"
        );
        self.pos += spare;

        let checksum = self.frame_u16().context("checksum")?;
        self.expect_bit(1).context("info block end bit")?;

        self.data_len = data_len;
        self.attrib = attrib;

        Ok(InfoBlock {
            attrib,
            name,
            reserved,
            data_len,
            load_addr,
            call_addr,
            checksum,
        })
    }

    fn read_data(&mut self) -> Result<DataBlock> {
        self.expect_bit(1).context("data block start bit")?;
        let mut payload = Vec::with_capacity(self.data_len as usize);
        for _ in 0..self.data_len {
            payload.push(self.frame_byte()?);
        }
        let checksum = self.frame_u16().context("checksum")?;
        self.expect_bit(1).context("data block end bit")?;
        Ok(DataBlock {
            attrib: self.attrib,
            payload,
            checksum,
        })
    }
}

/// Format a data block payload. Attrib 0x02 marks tokenized BASIC;
/// anything else is dumped as hex.
pub fn render_payload(attrib: u8, payload: &[u8]) -> Result<String> {
    if attrib == 0x02 {
        render_basic(payload)
    } else {
        Ok(render_hex(payload))
    }
}

/// Tokenized BASIC. Each line is a length byte (counting itself and
/// the line number), a little-endian line number, then the tokens. A
/// zero length byte ends the listing; bytes after it are an error.
fn render_basic(payload: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut pos = 0usize;
    while pos < payload.len() {
        let line_len = payload[pos] as usize;
        pos += 1;
        if line_len == 0 {
            out.push_str(&format!("end of data: {}\n", pos));
            break;
        }
        ensure!(
            line_len >= 3,
            "line length {} at byte {} is too short",
            line_len,
            pos - 1
        );
        ensure!(
            pos + line_len - 1 <= payload.len(),
            "line at byte {} runs past the payload",
            pos - 1
        );
        let line_num = u16::from_le_bytes([payload[pos], payload[pos + 1]]);
        pos += 2;
        let tokens = line_len - 3;
        out.push_str(&format!("{:4} {:3},", line_num, tokens));
        for _ in 0..tokens {
            out.push_str(&format!(" {:02x}", payload[pos]));
            pos += 1;
        }
        out.push('\n');
    }
    ensure!(
        pos == payload.len(),
        "{} trailing bytes after the end mark",
        payload.len() - pos
    );
    Ok(out)
}

fn render_hex(payload: &[u8]) -> String {
    let mut out = String::new();
    for (i, byte) in payload.iter().enumerate() {
        out.push_str(&format!(" {:02x}", byte));
        if i % 16 == 15 {
            out.push('\n');
        }
    }
    if payload.len() % 16 != 0 {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_frame(bits: &mut Vec<u8>, byte: u8) {
        bits.push(1);
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }

    fn push_run(bits: &mut Vec<u8>, bit: u8, count: usize) {
        for _ in 0..count {
            bits.push(bit);
        }
    }

    fn push_info_block(
        bits: &mut Vec<u8>,
        attrib: u8,
        name: &[u8],
        data_len: u16,
        load_addr: u16,
        call_addr: u16,
        checksum: u16,
    ) {
        push_run(bits, 1, 40);
        push_run(bits, 0, 40);
        bits.push(1);
        push_frame(bits, attrib);
        for i in 0..16 {
            push_frame(bits, name.get(i).copied().unwrap_or(0));
        }
        push_frame(bits, 0x00); // reserved
        push_frame(bits, (data_len & 0xff) as u8);
        push_frame(bits, (data_len >> 8) as u8);
        push_frame(bits, (load_addr & 0xff) as u8);
        push_frame(bits, (load_addr >> 8) as u8);
        push_frame(bits, (call_addr & 0xff) as u8);
        push_frame(bits, (call_addr >> 8) as u8);
        for _ in 0..104 {
            push_frame(bits, 0x00);
        }
        push_frame(bits, (checksum & 0xff) as u8);
        push_frame(bits, (checksum >> 8) as u8);
        bits.push(1);
    }

    fn push_data_block(bits: &mut Vec<u8>, payload: &[u8], checksum: u16) {
        push_run(bits, 1, 20);
        push_run(bits, 0, 20);
        bits.push(1);
        for &byte in payload {
            push_frame(bits, byte);
        }
        push_frame(bits, (checksum & 0xff) as u8);
        push_frame(bits, (checksum >> 8) as u8);
        bits.push(1);
    }

    #[test]
    fn test_frame_decodes_msb_first() {
        let mut bits = Vec::new();
        push_frame(&mut bits, 0xa5);
        assert_eq!(decode_frame(&bits).unwrap(), 0xa5);

        let frame = [1, 1, 0, 0, 0, 0, 0, 0, 1];
        assert_eq!(decode_frame(&frame).unwrap(), 0x81);
    }

    #[test]
    fn test_frame_requires_start_bit() {
        let frame = [0, 1, 1, 1, 1, 1, 1, 1, 1];
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_end_of_tape_is_clean() {
        let mut reader = BlockReader::new(&[]);
        assert!(reader.next_block().unwrap().is_none());

        let bits = vec![0; 50];
        let mut reader = BlockReader::new(&bits);
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_info_block_fields() {
        let mut bits = Vec::new();
        push_run(&mut bits, 0, 100);
        push_info_block(&mut bits, 0x02, b"HELLO", 0x0123, 0x6000, 0x0000, 0x1234);

        let mut reader = BlockReader::new(&bits);
        let block = reader.next_block().unwrap().unwrap();
        assert_eq!(block.gap_zeros, 100);
        match block.kind {
            BlockKind::Info(info) => {
                assert_eq!(info.attrib, 0x02);
                assert_eq!(info.name, b"HELLO");
                assert_eq!(info.reserved, 0x00);
                assert_eq!(info.data_len, 0x0123);
                assert_eq!(info.load_addr, 0x6000);
                assert_eq!(info.call_addr, 0x0000);
                assert_eq!(info.checksum, 0x1234);
            }
            BlockKind::Data(_) => panic!("expected an info block"),
        }
    }

    #[test]
    fn test_data_block_uses_info_length() {
        let mut bits = Vec::new();
        push_run(&mut bits, 0, 30);
        push_info_block(&mut bits, 0x01, b"BG", 4, 0x2000, 0x0000, 0x0042);
        push_run(&mut bits, 0, 30);
        push_data_block(&mut bits, &[0xde, 0xad, 0xbe, 0xef], 0x0333);
        push_run(&mut bits, 0, 30);

        let mut reader = BlockReader::new(&bits);
        reader.next_block().unwrap().unwrap();
        let block = reader.next_block().unwrap().unwrap();
        match block.kind {
            BlockKind::Data(data) => {
                assert_eq!(data.attrib, 0x01);
                assert_eq!(data.payload, vec![0xde, 0xad, 0xbe, 0xef]);
                assert_eq!(data.checksum, 0x0333);
            }
            BlockKind::Info(_) => panic!("expected a data block"),
        }
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_name_skips_frames_after_terminator() {
        let mut bits = Vec::new();
        push_frame(&mut bits, b'A');
        push_frame(&mut bits, b'B');
        push_frame(&mut bits, 0x00);
        // No start bits here, which a full name would reject.
        push_run(&mut bits, 0, 13 * 9);

        let mut reader = BlockReader::new(&bits);
        assert_eq!(reader.frame_name().unwrap(), b"AB");
        assert_eq!(reader.pos, 16 * 9);
    }

    #[test]
    fn test_broken_tape_mark_is_an_error() {
        let mut bits = Vec::new();
        push_run(&mut bits, 0, 40);
        push_run(&mut bits, 1, 10);
        push_run(&mut bits, 0, 10);

        let mut reader = BlockReader::new(&bits);
        assert!(reader.next_block().is_err());
    }

    fn audio_8bit(samples: Vec<i32>) -> WavAudio {
        WavAudio {
            sample_rate: 44100,
            bits_per_sample: 8,
            channels: 1,
            samples,
        }
    }

    #[test]
    fn test_demodulate_pulse_widths() {
        // At 44.1 kHz a 0 needs a run of 9 samples, a 1 a run of 21.
        let mut samples = Vec::new();
        samples.extend_from_slice(&[128; 5]);
        samples.extend_from_slice(&[200; 12]); // 0
        samples.extend_from_slice(&[128; 3]);
        samples.extend_from_slice(&[200; 22]); // 1
        samples.extend_from_slice(&[128; 2]);
        samples.extend_from_slice(&[200; 3]); // noise
        samples.extend_from_slice(&[128; 4]);

        let bits = demodulate(&audio_8bit(samples));
        assert_eq!(bits, vec![0, 1]);
    }

    #[test]
    fn test_demodulate_drops_open_run() {
        let mut samples = vec![128; 4];
        samples.extend_from_slice(&[200; 30]);

        let bits = demodulate(&audio_8bit(samples));
        assert!(bits.is_empty());
    }

    #[test]
    fn test_demodulate_16bit_threshold() {
        // th_hi for 16-bit audio is 13107.
        let mut samples = vec![0; 4];
        samples.extend_from_slice(&[13107; 10]); // not above threshold
        samples.extend_from_slice(&[0; 4]);
        samples.extend_from_slice(&[20000; 10]);
        samples.extend_from_slice(&[0; 4]);

        let audio = WavAudio {
            sample_rate: 44100,
            bits_per_sample: 16,
            channels: 1,
            samples,
        };
        assert_eq!(demodulate(&audio), vec![0]);
    }

    #[test]
    fn test_render_basic_listing() {
        // One line: 10 PRINT-ish tokens, then the end mark.
        let payload = [5, 0x0a, 0x00, 0x99, 0x3a, 0x00];
        let out = render_payload(0x02, &payload).unwrap();
        assert_eq!(out, "  10   2, 99 3a\nend of data: 6\n");
    }

    #[test]
    fn test_render_basic_rejects_trailing_bytes() {
        let payload = [0x00, 0xff];
        assert!(render_payload(0x02, &payload).is_err());
    }

    #[test]
    fn test_render_hex_rows() {
        let payload: Vec<u8> = (0..17).collect();
        let out = render_payload(0x01, &payload).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            " 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f"
        );
        assert_eq!(lines[1], " 10");
        assert!(out.ends_with('\n'));

        assert_eq!(render_payload(0x01, &[]).unwrap(), "");
    }
}
