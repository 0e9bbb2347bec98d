//! Minimal WAV (RIFF/PCM) reader.
//!
//! Cassette captures are plain PCM recordings, so only uncompressed 8- or
//! 16-bit audio is supported. Just the first channel is kept; the tape
//! signal is mono on any sensible capture.

use anyhow::{bail, Context, Result};

/// Decoded audio: raw sample values of the first channel.
/// 8-bit samples are unsigned (0..=255), 16-bit samples signed.
#[derive(Debug)]
pub struct WavAudio {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub samples: Vec<i32>,
}

/// Parse a WAV file image into samples.
pub fn parse(data: &[u8]) -> Result<WavAudio> {
    if data.len() < 12 {
        bail!("file too short for a RIFF header");
    }
    if &data[0..4] != b"RIFF" {
        bail!("missing RIFF magic");
    }
    if &data[8..12] != b"WAVE" {
        bail!("not a WAVE file");
    }

    let mut format: Option<(u16, u16, u32, u16)> = None; // format, channels, rate, bits
    let mut audio: Option<WavAudio> = None;

    let mut offset = 12usize;
    while offset + 8 <= data.len() {
        let id = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        if body_start + size > data.len() {
            bail!("chunk {:?} runs past end of file", String::from_utf8_lossy(id));
        }
        let body = &data[body_start..body_start + size];

        match id {
            b"fmt " => {
                format = Some(parse_format(body).context("parsing fmt chunk")?);
            }
            b"data" => {
                let (audio_format, channels, sample_rate, bits_per_sample) = match format {
                    Some(f) => f,
                    None => bail!("data chunk before fmt chunk"),
                };
                if audio_format != 1 {
                    bail!("unsupported audio format {} (PCM only)", audio_format);
                }
                samples_supported(bits_per_sample)?;
                let samples = parse_samples(body, channels, bits_per_sample)?;
                audio = Some(WavAudio {
                    sample_rate,
                    bits_per_sample,
                    channels,
                    samples,
                });
            }
            _ => {} // LIST, fact, cue and friends: skip
        }

        // Chunks are word-aligned.
        offset = body_start + size + (size & 1);
    }

    match audio {
        Some(audio) => Ok(audio),
        None => bail!("no data chunk found"),
    }
}

fn parse_format(body: &[u8]) -> Result<(u16, u16, u32, u16)> {
    if body.len() < 16 {
        bail!("fmt chunk too short: {} bytes", body.len());
    }
    let audio_format = u16::from_le_bytes([body[0], body[1]]);
    let channels = u16::from_le_bytes([body[2], body[3]]);
    let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
    let bits_per_sample = u16::from_le_bytes([body[14], body[15]]);

    if channels == 0 {
        bail!("zero channels");
    }
    if sample_rate == 0 {
        bail!("zero sample rate");
    }

    Ok((audio_format, channels, sample_rate, bits_per_sample))
}

fn samples_supported(bits_per_sample: u16) -> Result<()> {
    if bits_per_sample != 8 && bits_per_sample != 16 {
        bail!("unsupported sample width {} (8 or 16 bits)", bits_per_sample);
    }
    Ok(())
}

/// Pull the first channel out of interleaved frames.
fn parse_samples(body: &[u8], channels: u16, bits_per_sample: u16) -> Result<Vec<i32>> {
    let bytes_per_sample = (bits_per_sample / 8) as usize;
    let frame_size = bytes_per_sample * channels as usize;
    if body.len() % frame_size != 0 {
        bail!(
            "data chunk of {} bytes is not a whole number of {}-byte frames",
            body.len(),
            frame_size
        );
    }

    let mut samples = Vec::with_capacity(body.len() / frame_size);
    for frame in body.chunks_exact(frame_size) {
        let value = match bits_per_sample {
            8 => frame[0] as i32,
            _ => i16::from_le_bytes([frame[0], frame[1]]) as i32,
        };
        samples.push(value);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a WAV image from parts.
    fn build_wav(
        audio_format: u16,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        data: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&((36 + data.len()) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&audio_format.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * channels as u32 * bits_per_sample as u32 / 8;
        out.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = channels * bits_per_sample / 8;
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits_per_sample.to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_parse_8bit_mono() {
        let wav = build_wav(1, 1, 44100, 8, &[0, 128, 255, 76]);
        let audio = parse(&wav).unwrap();
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.bits_per_sample, 8);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples, vec![0, 128, 255, 76]);
    }

    #[test]
    fn test_parse_16bit_signed() {
        let mut data = Vec::new();
        for v in [-32768i16, -1, 0, 1, 32767] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let wav = build_wav(1, 1, 22050, 16, &data);
        let audio = parse(&wav).unwrap();
        assert_eq!(audio.samples, vec![-32768, -1, 0, 1, 32767]);
    }

    #[test]
    fn test_stereo_takes_first_channel() {
        let mut data = Vec::new();
        for (l, r) in [(100i16, -100i16), (200, -200)] {
            data.extend_from_slice(&l.to_le_bytes());
            data.extend_from_slice(&r.to_le_bytes());
        }
        let wav = build_wav(1, 2, 44100, 16, &data);
        let audio = parse(&wav).unwrap();
        assert_eq!(audio.samples, vec![100, 200]);
    }

    #[test]
    fn test_skips_unknown_chunks() {
        let mut wav = build_wav(1, 1, 44100, 8, &[1, 2, 3, 4]);
        // Splice a LIST chunk between the header and fmt.
        let mut spliced = wav[..12].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&3u32.to_le_bytes());
        spliced.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0x00]); // padded to even
        spliced.extend_from_slice(&wav.split_off(12));
        let audio = parse(&spliced).unwrap();
        assert_eq!(audio.samples, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut wav = build_wav(1, 1, 44100, 8, &[0]);
        wav[0] = b'X';
        assert!(parse(&wav).is_err());
    }

    #[test]
    fn test_rejects_non_pcm() {
        let wav = build_wav(3, 1, 44100, 8, &[0]); // 3 = IEEE float
        assert!(parse(&wav).is_err());
    }

    #[test]
    fn test_rejects_24bit() {
        let wav = build_wav(1, 1, 44100, 24, &[0, 0, 0]);
        assert!(parse(&wav).is_err());
    }

    #[test]
    fn test_rejects_truncated_chunk() {
        let mut wav = build_wav(1, 1, 44100, 8, &[1, 2, 3, 4]);
        wav.truncate(wav.len() - 2);
        assert!(parse(&wav).is_err());
    }
}
