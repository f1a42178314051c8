//! LEB128 variable-length integer encoding/decoding.
//!
//! Varints hold seven bits per byte, least significant group first, with the
//! high bit of every byte but the last set as a continuation flag.

use bytes::{Buf, BufMut};

use crate::error::DecodeError;

/// Types that can be written to and read from a LEB128 encoded integer.
pub trait LebCodec: Sized + Copy {
    /// Maximum number of bytes a value of this width can occupy.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 variable length integer from the front of `buf`,
    /// advancing it past the integer.
    ///
    /// Returns the decoded value and the number of bytes consumed. Fails when
    /// the buffer ends mid-integer, when the integer is longer than
    /// [`LebCodec::MAX_LEB_BYTES`], or when the final group overflows `Self`.
    fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<(Self, usize), DecodeError>;

    /// Decode a LEB128 integer from the start of a slice without consuming it.
    fn decode_leb128_slice(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut cursor = data;
        Self::decode_leb128_buf(&mut cursor)
    }

    /// Encode `self` as a LEB128 variable length integer into the provided
    /// buffer, returning the number of bytes written.
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

macro_rules! impl_leb_codec {
    ($ty:ty, $bits:expr, $max_bytes:expr) => {
        impl LebCodec for $ty {
            const MAX_LEB_BYTES: usize = $max_bytes;

            #[inline]
            fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<(Self, usize), DecodeError> {
                // Bits that may still be set in the final group without
                // overflowing the integer.
                const LAST_GROUP_LIMIT: u8 = 1 << ($bits - 7 * ($max_bytes - 1));

                let mut value: $ty = 0;
                for i in 0..Self::MAX_LEB_BYTES {
                    if !buf.has_remaining() {
                        return Err(DecodeError::unexpected_end_of_buffer());
                    }
                    let byte = buf.get_u8();
                    if i == Self::MAX_LEB_BYTES - 1 && byte >= LAST_GROUP_LIMIT {
                        return Err(DecodeError::invalid_varint());
                    }
                    value |= <$ty>::from(byte & 0x7f) << (7 * i);
                    if byte < 0x80 {
                        return Ok((value, i + 1));
                    }
                }

                // Every byte had its continuation bit set.
                Err(DecodeError::invalid_varint())
            }

            #[inline]
            fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
                let mut value = self;
                let mut written = 1;
                while value >= 0x80 {
                    buf.put_u8((value & 0x7f) as u8 | 0x80);
                    value >>= 7;
                    written += 1;
                }
                buf.put_u8(value as u8);
                written
            }

            /// LEB128 encodes 7 bits per byte, so the length is
            /// `ceil(significant_bits / 7)` with a minimum of one byte.
            #[inline]
            fn encoded_leb128_len(self) -> usize {
                let significant_bits = $bits - self.leading_zeros() as usize;
                significant_bits.max(1).div_ceil(7)
            }
        }
    };
}

impl_leb_codec!(u64, 64, 10);
impl_leb_codec!(u32, 32, 5);
