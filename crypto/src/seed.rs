//! Turning randomness-service words into jury draws.

use crate::hash::blake2b_256_multi;

/// The random word for juror slot `slot`.
///
/// Slots covered by the delivered words use them directly; later slots are
/// derived from the first word so a single-word response still seats a
/// full jury. Returns `None` when no words were delivered.
pub fn juror_word(words: &[[u8; 32]], slot: usize) -> Option<[u8; 32]> {
    let first = words.first()?;
    Some(match words.get(slot) {
        Some(word) => *word,
        None => blake2b_256_multi(&[first, &(slot as u64).to_be_bytes()]),
    })
}

/// Map a random word onto `[0, pool_size)`.
///
/// Uses the leading 16 bytes as a big-endian `u128`; the modulo bias is
/// negligible for any realistic pool. Returns `None` for an empty pool.
pub fn draw_index(word: &[u8; 32], pool_size: usize) -> Option<usize> {
    if pool_size == 0 {
        return None;
    }
    let mut head = [0u8; 16];
    head.copy_from_slice(&word[..16]);
    Some((u128::from_be_bytes(head) % pool_size as u128) as usize)
}
