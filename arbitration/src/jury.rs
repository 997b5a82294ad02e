//! Jury selection from random words.

use crate::error::ArbitrationError;
use verity_crypto::{draw_index, juror_word};
use verity_types::Identity;

/// Draw `size` distinct jurors from `pool`.
///
/// Seat `i` draws with word `i` (derived from the first word past the end
/// of `words`). A draw landing on an already seated juror moves to the
/// next index, wrapping around, so the result never repeats a juror.
/// `pool` must be in a canonical order for the draw to be reproducible.
pub fn select_jury(
    pool: &[Identity],
    words: &[[u8; 32]],
    size: usize,
) -> Result<Vec<Identity>, ArbitrationError> {
    if words.is_empty() {
        return Err(ArbitrationError::EmptyRandomness);
    }
    if pool.len() < size {
        return Err(ArbitrationError::InsufficientJurors {
            needed: size,
            available: pool.len(),
        });
    }

    let mut seated = vec![false; pool.len()];
    let mut jury = Vec::with_capacity(size);
    for slot in 0..size {
        let word = juror_word(words, slot).ok_or(ArbitrationError::EmptyRandomness)?;
        let mut index = draw_index(&word, pool.len()).ok_or(ArbitrationError::InsufficientJurors {
            needed: size,
            available: 0,
        })?;
        while seated[index] {
            index = (index + 1) % pool.len();
        }
        seated[index] = true;
        jury.push(pool[index].clone());
    }
    Ok(jury)
}
