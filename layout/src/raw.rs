//! Raw byte buffers.

use crate::{
    config::RangeCfg,
    error::{Error, ErrorKind, Result},
    value::Value,
};
use bytes::Bytes;

/// Converts `value` into a byte buffer whose length lies within `max_len`.
///
/// Strings are taken as their UTF-8 encoding.
pub fn parse(value: &Value, max_len: &RangeCfg<usize>) -> Result<Bytes> {
    let bytes = match value {
        Value::Bytes(b) => Bytes::copy_from_slice(b),
        Value::Str(s) => Bytes::copy_from_slice(s.as_bytes()),
        other => {
            return Err(Error::invalid(format!(
                "Expected bytes type, received {}",
                other.type_name()
            )))
        }
    };
    check_len(bytes.len(), max_len)?;
    Ok(bytes)
}

/// Fails with [ErrorKind::LengthExceeded] if `len` is outside `max_len`.
pub(crate) fn check_len(len: usize, max_len: &RangeCfg<usize>) -> Result<()> {
    if !max_len.contains(&len) {
        return Err(ErrorKind::LengthExceeded(len).into());
    }
    Ok(())
}
