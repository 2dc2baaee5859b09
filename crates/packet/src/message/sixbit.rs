//! Sixbit — bit access over an armored AIS payload.

use super::model::DecodeError;
use crate::sentence::MAX_FILL_BITS;

/// Payload characters de-armored to 6-bit values.
#[derive(Debug, Clone)]
pub struct Sixbit {
    values: Vec<u8>,
    bit_len: usize,
}

impl Sixbit {
    pub fn decode(payload: &str, fill_bits: u8) -> Result<Self, DecodeError> {
        if fill_bits > MAX_FILL_BITS {
            return Err(DecodeError::MalformedPayload(format!(
                "fill bits out of range: {}",
                fill_bits
            )));
        }

        let values = payload
            .bytes()
            .enumerate()
            .map(|(idx, c)| match c {
                48..=87 => Ok(c - 48),
                96..=119 => Ok(c - 56),
                _ => Err(DecodeError::MalformedPayload(format!(
                    "invalid sixbit character {:?} at {}",
                    c as char, idx
                ))),
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let bit_len = (values.len() * 6)
            .checked_sub(fill_bits as usize)
            .ok_or_else(|| DecodeError::MalformedPayload("fill bits exceed payload".to_string()))?;

        Ok(Self { values, bit_len })
    }

    pub fn len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn unsigned(&self, start: usize, width: usize) -> Result<u64, DecodeError> {
        if width > 64 || start + width > self.bit_len {
            return Err(DecodeError::MalformedPayload(format!(
                "read of {} bits at {} past payload end ({} bits)",
                width, start, self.bit_len
            )));
        }

        let mut value = 0u64;
        for bit in start..start + width {
            let six = self.values[bit / 6];
            value = (value << 1) | u64::from((six >> (5 - bit % 6)) & 1);
        }
        Ok(value)
    }

    /// Two's complement read.
    pub fn signed(&self, start: usize, width: usize) -> Result<i64, DecodeError> {
        let raw = self.unsigned(start, width)?;
        if width > 0 && width < 64 && (raw >> (width - 1)) & 1 == 1 {
            Ok(raw as i64 - (1i64 << width))
        } else {
            Ok(raw as i64)
        }
    }
}
