//! Shot record formats.
//!
//! Two formats are supported:
//!
//! - `b8`: each record is `ceil(bits / 8)` raw bytes, bit-packed little
//!   endian (bit `k` of the record is byte `k / 8`, bit `k % 8`).
//! - `01`: each record is one ASCII line of `0` and `1` characters, one per
//!   bit, terminated by a newline.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

/// Supported record encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShotFormat {
    /// ASCII lines of '0'/'1'.
    #[value(name = "01")]
    Dense01,
    /// Bit-packed bytes, little endian.
    B8,
}

/// Reads one record of `bits` bits into `buf` (sized `ceil(bits / 8)`).
///
/// Returns false on a clean end of input.
pub fn read_record(
    reader: &mut dyn BufRead,
    format: ShotFormat,
    bits: usize,
    buf: &mut [u8],
) -> Result<bool> {
    debug_assert!(buf.len() >= bits.div_ceil(8));
    buf.fill(0);
    match format {
        ShotFormat::B8 => {
            let need = bits.div_ceil(8);
            let mut filled = 0usize;
            while filled < need {
                let n = reader
                    .read(&mut buf[filled..need])
                    .context("reading b8 record")?;
                if n == 0 {
                    if filled == 0 {
                        return Ok(false);
                    }
                    bail!("truncated b8 record: got {} of {} bytes", filled, need);
                }
                filled += n;
            }
            Ok(true)
        }
        ShotFormat::Dense01 => {
            let mut line = String::new();
            loop {
                line.clear();
                let n = reader.read_line(&mut line).context("reading 01 record")?;
                if n == 0 {
                    return Ok(false);
                }
                let trimmed = line.trim_end_matches(['\r', '\n']);
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.len() != bits {
                    bail!(
                        "01 record has {} characters but {} bits were expected",
                        trimmed.len(),
                        bits
                    );
                }
                for (k, c) in trimmed.bytes().enumerate() {
                    match c {
                        b'0' => {}
                        b'1' => buf[k / 8] |= 1 << (k % 8),
                        other => bail!("unexpected character {:?} in 01 record", other as char),
                    }
                }
                return Ok(true);
            }
        }
    }
}

/// Writes one record of `bits` bits from `buf`.
pub fn write_record(
    writer: &mut dyn Write,
    format: ShotFormat,
    bits: usize,
    buf: &[u8],
) -> io::Result<()> {
    match format {
        ShotFormat::B8 => writer.write_all(&buf[..bits.div_ceil(8)]),
        ShotFormat::Dense01 => {
            let mut line = Vec::with_capacity(bits + 1);
            for k in 0..bits {
                let bit = buf[k / 8] >> (k % 8) & 1;
                line.push(b'0' + bit);
            }
            line.push(b'\n');
            writer.write_all(&line)
        }
    }
}

/// Packs an observable mask into record bytes.
pub fn obsmask_to_bytes(mask: u64, num_obs: usize) -> Vec<u8> {
    let mut buf = vec![0u8; num_obs.div_ceil(8).max(1)];
    for k in 0..num_obs {
        if mask >> k & 1 != 0 {
            buf[k / 8] |= 1 << (k % 8);
        }
    }
    buf
}

/// Extracts an observable mask from record bytes.
pub fn bytes_to_obsmask(buf: &[u8], num_obs: usize) -> u64 {
    let mut mask = 0u64;
    for k in 0..num_obs.min(64) {
        if buf[k / 8] >> (k % 8) & 1 != 0 {
            mask |= 1 << k;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn b8_round_trip() {
        let mut out = Vec::new();
        write_record(&mut out, ShotFormat::B8, 10, &[0b1010_1010, 0b10]).unwrap();
        assert_eq!(out, vec![0b1010_1010, 0b10]);

        let mut reader = Cursor::new(out);
        let mut buf = [0u8; 2];
        assert!(read_record(&mut reader, ShotFormat::B8, 10, &mut buf).unwrap());
        assert_eq!(buf, [0b1010_1010, 0b10]);
        assert!(!read_record(&mut reader, ShotFormat::B8, 10, &mut buf).unwrap());
    }

    #[test]
    fn dense01_round_trip() {
        let mut out = Vec::new();
        write_record(&mut out, ShotFormat::Dense01, 3, &[0b101]).unwrap();
        assert_eq!(out, b"101\n");

        let mut reader = Cursor::new(out);
        let mut buf = [0u8; 1];
        assert!(read_record(&mut reader, ShotFormat::Dense01, 3, &mut buf).unwrap());
        assert_eq!(buf, [0b101]);
        assert!(!read_record(&mut reader, ShotFormat::Dense01, 3, &mut buf).unwrap());
    }

    #[test]
    fn truncated_b8_record_is_an_error() {
        let mut reader = Cursor::new(vec![0u8; 1]);
        let mut buf = [0u8; 2];
        assert!(read_record(&mut reader, ShotFormat::B8, 16, &mut buf).is_err());
    }

    #[test]
    fn obsmask_packing_round_trips() {
        let bytes = obsmask_to_bytes(0b1011, 4);
        assert_eq!(bytes, vec![0b1011]);
        assert_eq!(bytes_to_obsmask(&bytes, 4), 0b1011);
    }
}
