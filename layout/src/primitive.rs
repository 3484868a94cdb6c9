//! Fixed-width integers.
//!
//! A primitive of width `N` bits accepts any integer in `-2^(N-1) ..= 2^N - 1`: the union of the
//! signed and unsigned ranges. Values are written big-endian in two's complement, so `-1` and
//! `2^N - 1` produce the same bytes.

use crate::{
    error::{Error, Result},
    kind::Width,
    value::Value,
};
use bytes::BufMut;
use tracing::warn;

/// Coerces `value` to an integer and checks it against the range of `width`.
///
/// Accepts integers, booleans, floats with no fractional part, and decimal strings.
pub fn parse(width: Width, value: &Value) -> Result<i128> {
    let int = match value {
        Value::Int(v) => *v,
        Value::Bool(v) => i128::from(*v),
        Value::Float(v) if v.is_finite() && v.fract() == 0.0 => {
            warn!(value = v, "coercing integral float to integer");
            *v as i128
        }
        Value::Str(s) => s.trim().parse::<i128>().map_err(|_| {
            Error::invalid(format!("Expected int type, received non-numeric str '{s}'"))
        })?,
        other => {
            return Err(Error::invalid(format!(
                "Expected int type, received {}",
                other.type_name()
            )))
        }
    };
    check(width, int)?;
    Ok(int)
}

/// Fails if `value` does not fit in `width`.
pub fn check(width: Width, value: i128) -> Result<()> {
    if value < width.min() || value > width.max() {
        return Err(Error::invalid(format!(
            "Value {value} outside of range, must be {} to {}",
            width.min(),
            width.max()
        )));
    }
    Ok(())
}

/// Writes `value` big-endian in `width.bytes()` bytes.
pub(crate) fn write(width: Width, value: i128, buf: &mut impl BufMut) {
    match width {
        Width::W8 => buf.put_u8(value as u8),
        Width::W16 => buf.put_u16(value as u16),
        Width::W32 => buf.put_u32(value as u32),
        Width::W64 => buf.put_u64(value as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Width::W8, 0, &[0x00]; "zero")]
    #[test_case(Width::W8, 255, &[0xff]; "u8 max")]
    #[test_case(Width::W8, -1, &[0xff]; "u8 minus one")]
    #[test_case(Width::W8, -128, &[0x80]; "u8 min")]
    #[test_case(Width::W16, 256, &[0x01, 0x00]; "u16 big endian")]
    #[test_case(Width::W16, -2, &[0xff, 0xfe]; "u16 negative")]
    #[test_case(Width::W32, 0x1234_5678, &[0x12, 0x34, 0x56, 0x78]; "u32")]
    #[test_case(Width::W64, 1, &[0, 0, 0, 0, 0, 0, 0, 1]; "u64")]
    fn test_write(width: Width, value: i128, expected: &[u8]) {
        let mut buf = Vec::new();
        write(width, value, &mut buf);
        assert_eq!(buf, expected);
    }

    #[test_case(Width::W8, 256; "u8 overflow")]
    #[test_case(Width::W8, -129; "u8 underflow")]
    #[test_case(Width::W16, 65536; "u16 overflow")]
    #[test_case(Width::W32, -2_147_483_649; "u32 underflow")]
    #[test_case(Width::W64, u64::MAX as i128 + 1; "u64 overflow")]
    fn test_out_of_range(width: Width, value: i128) {
        let err = parse(width, &Value::Int(value)).unwrap_err();
        assert!(err.to_string().contains("outside of range"));
    }

    #[test]
    fn test_range_message() {
        let err = parse(Width::W8, &Value::Int(300)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: Value 300 outside of range, must be -128 to 255"
        );
    }

    #[test]
    fn test_lenient_inputs() {
        assert_eq!(parse(Width::W8, &Value::Bool(true)).unwrap(), 1);
        assert_eq!(parse(Width::W16, &Value::Float(512.0)).unwrap(), 512);
        assert_eq!(parse(Width::W16, &Value::Str(" 42 ".into())).unwrap(), 42);
        assert_eq!(parse(Width::W8, &Value::Str("-3".into())).unwrap(), -3);
    }

    #[test]
    fn test_rejected_inputs() {
        for value in [
            Value::Float(1.5),
            Value::Float(f64::NAN),
            Value::Str("0x10".into()),
            Value::Null,
            Value::List(vec![]),
            Value::Bytes(vec![1]),
        ] {
            let err = parse(Width::W32, &value).unwrap_err();
            assert!(err.to_string().contains("Expected int type"), "{err}");
        }
    }
}
