//! Register payload → calibrated values
//!
//! The sensors report each quantity as an integer scaled ×10. Decoding inverts
//! the scale and truncates at the second decimal place using exactly the
//! `floor(x / 10.0 * 100) / 100` arithmetic the collector's historical data was
//! produced with, floating point artifacts included (a raw 23 decodes to 2.29).

use thiserror_no_std::Error;

/// Minimum number of elements a register payload must hold.
pub const MIN_REGISTER_LEN: usize = 4;

const TEMPERATURE_INDEX: usize = 1;
const HUMIDITY_INDEX: usize = 3;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("register payload holds {len} elements, expected at least 4")]
    OutOfRange { len: usize },
}

/// Decode a register payload into `(temperature, humidity)`.
///
/// Accepts wire bytes (`u8`) as well as whole register words (`u16`).
pub fn decode<T>(registers: &[T]) -> Result<(f32, f32), DecodeError>
where
    T: Copy + Into<f64>,
{
    if registers.len() < MIN_REGISTER_LEN {
        return Err(DecodeError::OutOfRange {
            len: registers.len(),
        });
    }

    let temperature = truncate_scaled(registers[TEMPERATURE_INDEX].into());
    let humidity = truncate_scaled(registers[HUMIDITY_INDEX].into());

    Ok((temperature, humidity))
}

fn truncate_scaled(raw: f64) -> f32 {
    (((raw / 10.0) * 100.0).floor() / 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pair(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-4 && (actual.1 - expected.1).abs() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_decode_inverts_scale() {
        assert_pair(decode(&[0u16, 250, 0, 500]).unwrap(), (25.0, 50.0));
    }

    #[test]
    fn test_decode_truncates_instead_of_rounding() {
        assert_pair(decode(&[0u16, 257, 0, 0]).unwrap(), (25.7, 0.0));
        // 23 / 10.0 * 100 lands just below 230 in binary floating point
        assert_pair(decode(&[0u8, 23, 0, 41]).unwrap(), (2.29, 4.09));
    }

    #[test]
    fn test_decode_reads_low_bytes_of_wire_payload() {
        // Two big-endian registers, 0x00FA and 0x01D7. Only the low byte of each counts.
        let wire = [0x00u8, 0xFA, 0x01, 0xD7];
        assert_pair(decode(&wire).unwrap(), (25.0, 21.5));
    }

    #[test]
    fn test_decode_short_payload_is_out_of_range() {
        assert_eq!(
            decode(&[1u8, 2, 3]),
            Err(DecodeError::OutOfRange { len: 3 })
        );
        assert_eq!(
            decode::<u8>(&[]),
            Err(DecodeError::OutOfRange { len: 0 })
        );
    }

    #[test]
    fn test_decode_is_deterministic_and_leaves_input_untouched() {
        let registers = [9u16, 199, 3, 611, 42];
        let first = decode(&registers).unwrap();
        let second = decode(&registers).unwrap();

        assert_eq!(first.0.to_bits(), second.0.to_bits());
        assert_eq!(first.1.to_bits(), second.1.to_bits());
        assert_eq!(registers, [9, 199, 3, 611, 42]);
    }
}
