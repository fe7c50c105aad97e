//! Reversible sample obfuscation schemes.
//!
//! M30 containers XOR their payload with a repeating four byte mask. OMC
//! and OJM containers scramble each WAV chunk twice: a keyed block
//! permutation followed by a self-keying inversion pass.

/// Repeating XOR mask of M30 containers (ASCII "nami").
pub const NAMI_MASK: [u8; 4] = *b"nami";

/// Number of blocks a WAV chunk is cut into before permutation.
pub const BLOCK_COUNT: usize = 17;

/// Destination block table, 17 rows of 17 entries.
///
/// Row `len % 17` holds, for each encoded block, the index of the block it
/// belongs to in the plain chunk.
pub const PERMUTATION_TABLE: [u8; 289] = [
    0x10, 0x0E, 0x02, 0x09, 0x04, 0x00, 0x07, 0x01, 0x06, 0x08, 0x0F, 0x0A, 0x05, 0x0C, 0x03, 0x0D,
    0x0B, 0x07, 0x02, 0x0A, 0x0B, 0x03, 0x05, 0x0D, 0x08, 0x04, 0x00, 0x0C, 0x06, 0x0F, 0x0E, 0x10,
    0x01, 0x09, 0x0C, 0x0D, 0x03, 0x00, 0x06, 0x09, 0x0A, 0x01, 0x07, 0x08, 0x10, 0x02, 0x0B, 0x0E,
    0x04, 0x0F, 0x05, 0x08, 0x03, 0x04, 0x0D, 0x06, 0x05, 0x0B, 0x10, 0x02, 0x0C, 0x07, 0x09, 0x0A,
    0x0F, 0x0E, 0x00, 0x01, 0x0F, 0x02, 0x0C, 0x0D, 0x00, 0x04, 0x01, 0x05, 0x07, 0x03, 0x09, 0x10,
    0x06, 0x0B, 0x0A, 0x08, 0x0E, 0x00, 0x04, 0x0B, 0x10, 0x0F, 0x0D, 0x0C, 0x06, 0x05, 0x07, 0x01,
    0x02, 0x03, 0x08, 0x09, 0x0A, 0x0E, 0x03, 0x10, 0x08, 0x07, 0x06, 0x09, 0x0E, 0x0D, 0x00, 0x0A,
    0x0B, 0x04, 0x05, 0x0C, 0x02, 0x01, 0x0F, 0x04, 0x0E, 0x10, 0x0F, 0x05, 0x08, 0x07, 0x0B, 0x00,
    0x01, 0x06, 0x02, 0x0C, 0x09, 0x03, 0x0A, 0x0D, 0x06, 0x0D, 0x0E, 0x07, 0x10, 0x0A, 0x0B, 0x00,
    0x01, 0x0C, 0x0F, 0x02, 0x03, 0x08, 0x09, 0x04, 0x05, 0x0A, 0x0C, 0x00, 0x08, 0x09, 0x0D, 0x03,
    0x04, 0x05, 0x10, 0x0E, 0x0F, 0x01, 0x02, 0x0B, 0x06, 0x07, 0x05, 0x06, 0x0C, 0x04, 0x0D, 0x0F,
    0x07, 0x0E, 0x08, 0x01, 0x09, 0x02, 0x10, 0x0A, 0x0B, 0x00, 0x03, 0x0B, 0x0F, 0x04, 0x0E, 0x03,
    0x01, 0x00, 0x02, 0x0D, 0x0C, 0x06, 0x07, 0x05, 0x10, 0x09, 0x08, 0x0A, 0x03, 0x02, 0x01, 0x00,
    0x04, 0x0C, 0x0D, 0x0B, 0x10, 0x05, 0x06, 0x0F, 0x0E, 0x07, 0x09, 0x0A, 0x08, 0x09, 0x0A, 0x00,
    0x07, 0x08, 0x06, 0x10, 0x03, 0x04, 0x01, 0x02, 0x05, 0x0B, 0x0E, 0x0F, 0x0D, 0x0C, 0x0A, 0x06,
    0x09, 0x0C, 0x0B, 0x10, 0x07, 0x08, 0x00, 0x0F, 0x03, 0x01, 0x02, 0x05, 0x0D, 0x0E, 0x04, 0x0D,
    0x00, 0x01, 0x0E, 0x02, 0x03, 0x08, 0x0B, 0x07, 0x0C, 0x09, 0x05, 0x0A, 0x0F, 0x04, 0x06, 0x10,
    0x01, 0x0E, 0x02, 0x03, 0x0D, 0x0B, 0x07, 0x00, 0x08, 0x0C, 0x09, 0x06, 0x0F, 0x10, 0x05, 0x0A,
    0x04,
];

/// XORs every complete 4-byte group with [`NAMI_MASK`] in place.
///
/// A trailing partial group is left untouched. Applying it twice restores
/// the input.
pub fn nami_xor(buf: &mut [u8]) {
    for group in buf.chunks_exact_mut(NAMI_MASK.len()) {
        for (byte, mask) in group.iter_mut().zip(NAMI_MASK) {
            *byte ^= mask;
        }
    }
}

/// Undoes the block permutation of an OMC/OJM WAV chunk.
///
/// Bytes past the last whole block are copied unchanged.
pub fn rearrange(encoded: &[u8]) -> Vec<u8> {
    let len = encoded.len();
    let block_size = len / BLOCK_COUNT;
    let key = BLOCK_COUNT * (len % BLOCK_COUNT);

    let mut plain = encoded.to_vec();
    if block_size == 0 {
        return plain;
    }

    for (block, src) in encoded
        .chunks_exact(block_size)
        .take(BLOCK_COUNT)
        .enumerate()
    {
        let dest = PERMUTATION_TABLE[key + block] as usize * block_size;
        plain[dest..dest + block_size].copy_from_slice(src);
    }
    plain
}

/// Undoes the accumulator inversion of an OMC/OJM WAV chunk in place.
///
/// A byte is inverted when the bit of the key selected by the counter is
/// set. Every eight bytes the key is replaced by the last byte read, before
/// inversion.
pub fn acc_xor(buf: &mut [u8]) {
    let mut key_byte: u8 = 0xFF;
    let mut counter: u32 = 0;

    for byte in buf.iter_mut() {
        let original = *byte;
        if (key_byte << counter) & 0x80 != 0 {
            *byte = 255 - original;
        }
        counter += 1;
        if counter > 7 {
            counter = 0;
            key_byte = original;
        }
    }
}
