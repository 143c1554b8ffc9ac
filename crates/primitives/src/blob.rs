//! The EIP-4844 blob type and the payload codec for it.

use alloc::{format, string::String, vec};
use alloy_primitives::{hex, Bytes, FixedBytes};
use thiserror::Error;

/// The blob encoding version written to every blob header.
pub const BLOB_ENCODING_VERSION: u8 = 0;

/// The offset of the version byte in the blob header.
pub const BLOB_VERSION_OFFSET: usize = 1;

/// How many bytes are in a blob.
pub const BLOB_BYTES_SIZE: usize = 4096 * 32; // 131072

/// How many bytes are in each field element.
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;

/// Maximum payload that fits in a blob: each encoding round carries 4 field
/// element tails of 31 bytes plus 3 spill bytes, and round 0 gives up 4
/// bytes to the version and length header.
pub const BLOB_MAX_DATA_SIZE: usize = (4 * 31 + 3) * 1024 - 4; // 130044

/// Blob encoding/decoding rounds. Each round covers one group of 4 field
/// elements (128 bytes).
pub const BLOB_ENCODING_ROUNDS: usize = 1024;

/// An error that can occur when encoding a payload into a [Blob].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobEncodingError {
    /// The input payload does not fit in a single blob.
    #[error("Data is too large for a blob: {0} bytes")]
    DataTooLarge(usize),
    /// Payload bytes remained after the final encoding round.
    #[error("Data overflowed the encoding rounds")]
    Overflow,
}

/// An error that can occur when decoding a [Blob] back into its payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobDecodingError {
    /// The field element at the given index has its high order bit set.
    #[error("Invalid field element: {0}")]
    InvalidFieldElement(usize),
    /// Invalid encoding version.
    #[error("Invalid encoding version: {0}")]
    InvalidEncodingVersion(u8),
    /// The length prefix exceeds the blob payload capacity.
    #[error("Invalid length prefix: {0}")]
    InvalidLength(usize),
    /// The blob body has not been fetched.
    #[error("Missing data")]
    MissingData,
}

/// A parent chain blob: 4096 field elements of 32 bytes each, where every
/// element must remain below the BLS12-381 scalar field modulus.
///
/// The payload codec keeps the two high order bits of each element's leading
/// byte clear, so any encoded blob is trivially a valid sequence of field
/// elements. The raw bytes are exposed through [Blob::as_bytes] for the
/// external KZG library to commit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blob(FixedBytes<BLOB_BYTES_SIZE>);

impl Blob {
    /// Instantiates a blob from raw bytes.
    pub const fn new(bytes: [u8; BLOB_BYTES_SIZE]) -> Self {
        Self(FixedBytes(bytes))
    }

    /// Zeroes the blob in place.
    pub fn clear(&mut self) {
        self.0 = FixedBytes::ZERO;
    }

    /// Returns the raw blob bytes, as handed to the KZG library for
    /// commitment, proof, and verification routines.
    pub const fn as_bytes(&self) -> &[u8; BLOB_BYTES_SIZE] {
        &self.0 .0
    }

    /// Renders the first and last three bytes for console output.
    pub fn terminal_string(&self) -> String {
        format!("{}..{}", hex::encode(&self.0[..3]), hex::encode(&self.0[BLOB_BYTES_SIZE - 3..]))
    }

    /// Encodes a payload into a fresh blob.
    ///
    /// The blob is filled in rounds of 4 field elements. Each round copies
    /// 31 payload bytes into the tail of each element, then spreads 3 more
    /// payload bytes across the 4 leading bytes, 6 bits apiece, so that no
    /// leading byte ever has its two high order bits set. Round 0 reserves
    /// the first 5 bytes for the header: a spill carrier byte, the encoding
    /// version, and the 24 bit big endian payload length.
    pub fn from_data(data: &[u8]) -> Result<Self, BlobEncodingError> {
        if data.len() > BLOB_MAX_DATA_SIZE {
            return Err(BlobEncodingError::DataTooLarge(data.len()));
        }

        let mut blob = Self::default();
        blob.0[BLOB_VERSION_OFFSET] = BLOB_ENCODING_VERSION;
        let len = (data.len() as u32).to_be_bytes();
        blob.0[2..5].copy_from_slice(&len[1..]);

        let mut read_pos = 0;
        for round in 0..BLOB_ENCODING_ROUNDS {
            if read_pos >= data.len() {
                break;
            }
            let base = round * 4 * BYTES_PER_FIELD_ELEMENT;

            // Fill the tail of each field element. The first tail of round 0
            // is shortened to 27 bytes by the header.
            read_pos = if round == 0 {
                blob.fill_tail(5, 27, data, read_pos)
            } else {
                blob.fill_tail(base + 1, 31, data, read_pos)
            };
            read_pos = blob.fill_tail(base + 33, 31, data, read_pos);
            read_pos = blob.fill_tail(base + 65, 31, data, read_pos);
            read_pos = blob.fill_tail(base + 97, 31, data, read_pos);

            // Spread 3 more payload bytes across the 4 leading bytes of the
            // group: the low 6 bits of each byte go to the first three
            // elements, the high bit pairs stack into the fourth.
            let s0 = next_spill_byte(data, &mut read_pos);
            let s1 = next_spill_byte(data, &mut read_pos);
            let s2 = next_spill_byte(data, &mut read_pos);
            blob.0[base] = s0 & 0b0011_1111;
            blob.0[base + 32] = s1 & 0b0011_1111;
            blob.0[base + 64] = s2 & 0b0011_1111;
            blob.0[base + 96] =
                ((s0 & 0b1100_0000) >> 2) | ((s1 & 0b1100_0000) >> 4) | ((s2 & 0b1100_0000) >> 6);
        }

        if read_pos < data.len() {
            return Err(BlobEncodingError::Overflow);
        }
        Ok(blob)
    }

    /// Decodes the blob back into its payload.
    /// Returns a [BlobDecodingError] if the blob is invalid.
    pub fn decode(&self) -> Result<Bytes, BlobDecodingError> {
        // Validate the blob encoding version.
        if self.0[BLOB_VERSION_OFFSET] != BLOB_ENCODING_VERSION {
            return Err(BlobDecodingError::InvalidEncodingVersion(self.0[BLOB_VERSION_OFFSET]));
        }

        // Decode the 3 byte big endian length value into a 4 byte integer.
        let length = u32::from_be_bytes([0, self.0[2], self.0[3], self.0[4]]) as usize;
        if length > BLOB_MAX_DATA_SIZE {
            return Err(BlobDecodingError::InvalidLength(length));
        }

        // The first field element carries the header and the round 0 spill
        // bits in its low bits, but its high order bit must still be unset.
        if self.0[0] & 0b1000_0000 != 0 {
            return Err(BlobDecodingError::InvalidFieldElement(0));
        }

        // Round 0 copies the remaining 27 bytes of the first field element.
        let mut output = vec![0u8; BLOB_MAX_DATA_SIZE];
        output[..27].copy_from_slice(&self.0[5..32]);

        // Process the remaining 3 field elements to complete round 0.
        let mut output_pos = 27;
        let mut input_pos = 32;
        let mut encoded_byte = [0u8; 4];
        encoded_byte[0] = self.0[0];
        for b in encoded_byte.iter_mut().skip(1) {
            let (enc, opos, ipos) = self.decode_field_element(output_pos, input_pos, &mut output)?;
            *b = enc;
            output_pos = opos;
            input_pos = ipos;
        }
        output_pos = reassemble_bytes(output_pos, &encoded_byte, &mut output);

        // In each remaining round, decode a group of 4 field elements (128
        // bytes) of the input into 127 bytes of output.
        for _ in 1..BLOB_ENCODING_ROUNDS {
            for b in &mut encoded_byte {
                let (enc, opos, ipos) =
                    self.decode_field_element(output_pos, input_pos, &mut output)?;
                *b = enc;
                output_pos = opos;
                input_pos = ipos;
            }
            output_pos = reassemble_bytes(output_pos, &encoded_byte, &mut output);
        }

        output.truncate(length);
        Ok(Bytes::from(output))
    }

    /// Decodes the field element at `input_pos` by copying its 31 byte tail
    /// into the output and returning its leading byte for spill bit
    /// reassembly.
    fn decode_field_element(
        &self,
        output_pos: usize,
        input_pos: usize,
        output: &mut [u8],
    ) -> Result<(u8, usize, usize), BlobDecodingError> {
        // The high order bit of each field element must always be unset.
        if self.0[input_pos] & 0b1000_0000 != 0 {
            return Err(BlobDecodingError::InvalidFieldElement(
                input_pos / BYTES_PER_FIELD_ELEMENT,
            ));
        }
        output[output_pos..output_pos + 31]
            .copy_from_slice(&self.0[input_pos + 1..input_pos + 32]);
        Ok((self.0[input_pos], output_pos + 31, input_pos + 32))
    }

    /// Copies up to `max` payload bytes into the field element tail starting
    /// at `offset`, returning the advanced read position.
    fn fill_tail(&mut self, offset: usize, max: usize, data: &[u8], read_pos: usize) -> usize {
        let take = max.min(data.len() - read_pos);
        self.0[offset..offset + take].copy_from_slice(&data[read_pos..read_pos + take]);
        read_pos + take
    }
}

/// Reassembles the 4 by 6 bit spill chunks carried by a group's leading
/// bytes into the 3 payload bytes that follow the group's tails.
fn reassemble_bytes(output_pos: usize, encoded_byte: &[u8; 4], output: &mut [u8]) -> usize {
    output[output_pos] = (encoded_byte[0] & 0b0011_1111) | ((encoded_byte[3] & 0b0011_0000) << 2);
    output[output_pos + 1] =
        (encoded_byte[1] & 0b0011_1111) | ((encoded_byte[3] & 0b0000_1100) << 4);
    output[output_pos + 2] =
        (encoded_byte[2] & 0b0011_1111) | ((encoded_byte[3] & 0b0000_0011) << 6);
    output_pos + 3
}

/// Reads the next payload byte for spill bit distribution, or zero once the
/// input is exhausted.
fn next_spill_byte(data: &[u8], read_pos: &mut usize) -> u8 {
    match data.get(*read_pos) {
        Some(byte) => {
            *read_pos += 1;
            *byte
        }
        None => 0,
    }
}

impl From<[u8; BLOB_BYTES_SIZE]> for Blob {
    fn from(bytes: [u8; BLOB_BYTES_SIZE]) -> Self {
        Self::new(bytes)
    }
}

impl From<FixedBytes<BLOB_BYTES_SIZE>> for Blob {
    fn from(bytes: FixedBytes<BLOB_BYTES_SIZE>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl core::ops::Deref for Blob {
    type Target = [u8; BLOB_BYTES_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0 .0
    }
}

impl core::ops::DerefMut for Blob {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0 .0
    }
}

impl core::fmt::Display for Blob {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Fills a payload of the given length with a byte pattern that makes
    /// positional mistakes visible.
    fn patterned_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn roundtrip_ascii_payload() {
        let data = b"this is a test of blob encoding/decoding";
        let blob = Blob::from_data(data).unwrap();
        assert_eq!(blob.decode().unwrap(), Bytes::from_static(data));
    }

    #[test]
    fn roundtrip_empty_payload() {
        let blob = Blob::from_data(&[]).unwrap();
        assert_eq!(blob.0[2..5], [0, 0, 0]);
        assert_eq!(blob.decode().unwrap(), Bytes::new());
    }

    #[test]
    fn roundtrip_just_below_first_group_capacity() {
        // A few bytes short of round 0's 123 byte payload capacity, with a
        // sentinel in the last position.
        let mut data = vec![0u8; 118];
        data[117] = 0xFF;
        let blob = Blob::from_data(&data).unwrap();
        assert_eq!(blob.decode().unwrap(), Bytes::from(data));
    }

    #[test]
    fn roundtrip_near_max_payload() {
        let mut data = vec![0u8; BLOB_MAX_DATA_SIZE - 3];
        data[BLOB_MAX_DATA_SIZE - 4] = 0xFF;
        let blob = Blob::from_data(&data).unwrap();
        assert_eq!(blob.decode().unwrap(), Bytes::from(data.clone()));

        for i in 1..=10 {
            let blob = Blob::from_data(&data[i..]).unwrap();
            assert_eq!(blob.decode().unwrap(), Bytes::from(data[i..].to_vec()));
        }
    }

    #[test]
    fn roundtrip_max_payload() {
        let data = patterned_data(BLOB_MAX_DATA_SIZE);
        let blob = Blob::from_data(&data).unwrap();
        assert_eq!(blob.decode().unwrap(), Bytes::from(data));
    }

    #[test]
    fn roundtrip_group_boundary_sizes() {
        // Payload lengths that land on and around the tail and spill
        // boundaries of the first two groups and the last group.
        for len in [
            1, 26, 27, 28, 57, 58, 89, 119, 120, 121, 122, 123, 124, 150, 249, 250, 251, 254,
            BLOB_MAX_DATA_SIZE - 1,
        ] {
            let data = patterned_data(len);
            let blob = Blob::from_data(&data).unwrap();
            assert_eq!(blob.decode().unwrap(), Bytes::from(data), "length {len}");
        }
    }

    #[test]
    fn encode_rejects_oversized_payloads() {
        let data = vec![0u8; BLOB_MAX_DATA_SIZE + 1];
        assert_eq!(
            Blob::from_data(&data),
            Err(BlobEncodingError::DataTooLarge(BLOB_MAX_DATA_SIZE + 1))
        );

        let data = vec![0u8; BLOB_BYTES_SIZE];
        assert_eq!(Blob::from_data(&data), Err(BlobEncodingError::DataTooLarge(BLOB_BYTES_SIZE)));
    }

    #[test]
    fn decode_rejects_corrupted_blobs() {
        let data = b"this is a test of invalid blob decoding";
        let mut blob = Blob::from_data(data).unwrap();

        blob.0[32] = 0x80;
        assert_eq!(blob.decode(), Err(BlobDecodingError::InvalidFieldElement(1)));
        blob.0[32] = 0x00;

        blob.0[BLOB_VERSION_OFFSET] = 0x01;
        assert_eq!(blob.decode(), Err(BlobDecodingError::InvalidEncodingVersion(0x01)));
        blob.0[BLOB_VERSION_OFFSET] = BLOB_ENCODING_VERSION;

        blob.0[2] = 0xFF;
        let length = u32::from_be_bytes([0, 0xFF, blob.0[3], blob.0[4]]) as usize;
        assert!(length > BLOB_MAX_DATA_SIZE);
        assert_eq!(blob.decode(), Err(BlobDecodingError::InvalidLength(length)));
        blob.0[2] = 0x00;

        assert_eq!(blob.decode().unwrap(), Bytes::from_static(data));
    }

    #[test]
    fn decode_rejects_high_bit_in_first_field_element() {
        let mut blob = Blob::from_data(b"data").unwrap();
        blob.0[0] |= 0x80;
        assert_eq!(blob.decode(), Err(BlobDecodingError::InvalidFieldElement(0)));
    }

    #[test]
    fn decode_rejects_high_bit_in_last_field_element() {
        let mut blob = Blob::from_data(&[]).unwrap();
        blob.0[BLOB_BYTES_SIZE - BYTES_PER_FIELD_ELEMENT] = 0x80;
        assert_eq!(blob.decode(), Err(BlobDecodingError::InvalidFieldElement(4095)));
    }

    #[test]
    fn encoded_field_elements_have_clear_high_bits() {
        let data = patterned_data(BLOB_MAX_DATA_SIZE);
        let blob = Blob::from_data(&data).unwrap();
        for k in 0..(BLOB_BYTES_SIZE / BYTES_PER_FIELD_ELEMENT) {
            assert_eq!(blob.0[k * BYTES_PER_FIELD_ELEMENT] & 0b1100_0000, 0, "element {k}");
        }
    }

    #[test]
    fn encoded_header_shape() {
        // A length that exercises all three bytes of the big endian prefix.
        let data = patterned_data(0x1ABCD);
        let blob = Blob::from_data(&data).unwrap();
        assert_eq!(blob.0[BLOB_VERSION_OFFSET], BLOB_ENCODING_VERSION);
        assert_eq!([blob.0[2], blob.0[3], blob.0[4]], [0x01, 0xAB, 0xCD]);
        let length = u32::from_be_bytes([0, blob.0[2], blob.0[3], blob.0[4]]) as usize;
        assert_eq!(length, data.len());
    }

    #[test]
    fn clear_zeroes_the_blob() {
        let mut blob = Blob::from_data(b"some data").unwrap();
        blob.clear();
        assert!(blob.as_bytes().iter().all(|b| *b == 0));

        // A cleared blob is indistinguishable from a fresh one.
        let blob = Blob::from_data(b"some data").unwrap();
        assert_eq!(blob.decode().unwrap(), Bytes::from_static(b"some data"));
    }

    #[test]
    fn terminal_string_renders_first_and_last_bytes() {
        let mut blob = Blob::default();
        blob.0[0] = 0x01;
        blob.0[1] = 0x02;
        blob.0[2] = 0x03;
        blob.0[BLOB_BYTES_SIZE - 1] = 0xFF;
        assert_eq!(blob.terminal_string(), "010203..0000ff");
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_payloads(data in proptest::collection::vec(any::<u8>(), 0..=4096)) {
            let blob = Blob::from_data(&data).unwrap();
            prop_assert_eq!(blob.decode().unwrap(), Bytes::from(data));
        }

        #[test]
        fn encoding_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..=1024)) {
            prop_assert_eq!(Blob::from_data(&data).unwrap(), Blob::from_data(&data).unwrap());
        }

        #[test]
        fn encoded_leading_bytes_stay_valid(data in proptest::collection::vec(any::<u8>(), 0..=1024)) {
            let blob = Blob::from_data(&data).unwrap();
            for k in 0..(BLOB_BYTES_SIZE / BYTES_PER_FIELD_ELEMENT) {
                prop_assert_eq!(blob.0[k * BYTES_PER_FIELD_ELEMENT] & 0b1100_0000, 0);
            }
        }
    }
}
