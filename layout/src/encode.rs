//! Serialization traits for built layouts.

use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Trait for types that can be written to a buffer.
pub trait Write {
    /// Encodes this value by writing to a buffer.
    ///
    /// Fails if any part of the value has not been built.
    fn write(&self, buf: &mut impl BufMut) -> Result<()>;
}

/// Trait for types that can be encoded to a standalone buffer.
pub trait Encode: Write {
    /// Returns the encoded length of this value.
    ///
    /// This method MUST return the exact number of bytes that will be written by `write()`.
    fn encode_size(&self) -> Result<usize>;

    /// Encodes a value to a `BytesMut` buffer.
    ///
    /// (Provided method).
    fn encode(&self) -> Result<BytesMut> {
        let len = self.encode_size()?;
        let mut buffer = BytesMut::with_capacity(len);
        self.write(&mut buffer)?;
        if buffer.len() != len {
            return Err(Error::build(format!(
                "write() produced {} bytes but size() reported {len}",
                buffer.len()
            )));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lying(usize);

    impl Write for Lying {
        fn write(&self, buf: &mut impl BufMut) -> Result<()> {
            buf.put_bytes(0xab, self.0);
            Ok(())
        }
    }

    impl Encode for Lying {
        fn encode_size(&self) -> Result<usize> {
            Ok(2)
        }
    }

    #[test]
    fn test_encode_checks_length() {
        assert_eq!(Lying(2).encode().unwrap().as_ref(), &[0xab, 0xab]);
        assert!(Lying(3).encode().is_err());
    }
}
