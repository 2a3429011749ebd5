// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Base64 VLQ, as used by the `mappings` field.
//!
//! Each base64 digit carries 5 data bits plus a continuation bit (`0x20`). Digits are
//! little-endian, and the lowest bit of the assembled value is the sign.

use thiserror::Error;

const CONTINUATION: u8 = 0x20;
const DATA_MASK: u8 = 0x1f;
const SHIFT: u32 = 5;

// An `i64` holds at most 12 full 5-bit groups after the sign bit is folded in.
const MAX_SHIFT: u32 = 60;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum VlqError {
    #[error("invalid base64 digit `{0}`")]
    InvalidDigit(char),

    #[error("value ends with a continuation digit")]
    Unterminated,

    #[error("value overflows 64 bits")]
    Overflow,
}

fn digit_value(c: char) -> Result<u8, VlqError> {
    let v = match c {
        'A'..='Z' => c as u8 - b'A',
        'a'..='z' => c as u8 - b'a' + 26,
        '0'..='9' => c as u8 - b'0' + 52,
        '+' => 62,
        '/' => 63,
        _ => return Err(VlqError::InvalidDigit(c)),
    };

    Ok(v)
}

/// Decode every value of one segment, e.g. `"AAgBC"` to `[0, 0, 16, 1]`.
pub fn decode(segment: &str) -> Result<Vec<i64>, VlqError> {
    let mut values = Vec::with_capacity(5);

    let mut accum: u64 = 0;
    let mut shift = 0;
    let mut pending = false;

    for c in segment.chars() {
        let digit = digit_value(c)?;

        if shift > MAX_SHIFT {
            return Err(VlqError::Overflow);
        }

        accum |= u64::from(digit & DATA_MASK) << shift;
        pending = true;

        if digit & CONTINUATION != 0 {
            shift += SHIFT;
            continue;
        }

        let magnitude = (accum >> 1) as i64;
        let value = if accum & 1 == 1 { -magnitude } else { magnitude };
        values.push(value);

        accum = 0;
        shift = 0;
        pending = false;
    }

    if pending {
        return Err(VlqError::Unterminated);
    }

    Ok(values)
}
