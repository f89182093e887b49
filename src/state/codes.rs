//! Random identifiers and shuffling used when building rooms.

use rand::{Rng, rng, seq::SliceRandom};
use uuid::Uuid;

use crate::state::room::PlayerId;

/// Alphabet used for room codes: uppercase letters and digits, easy to read out loud.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random room code of `length` uppercase alphanumeric characters.
pub fn generate_room_code(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Allocate an opaque player identifier.
pub fn generate_player_id() -> PlayerId {
    Uuid::new_v4()
}

/// Return a uniformly shuffled copy of `items` (Fisher-Yates).
pub fn shuffled<T: Clone>(items: &[T]) -> Vec<T> {
    let mut copy = items.to_vec();
    if copy.len() > 1 {
        copy.shuffle(&mut rng());
    }
    copy
}

/// Trim and upper-case a user-typed room code.
pub fn normalize_room_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn room_codes_are_uppercase_alphanumeric() {
        for _ in 0..200 {
            let code = generate_room_code(4);
            assert_eq!(code.len(), 4);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn player_ids_are_unique() {
        let ids = (0..1000).map(|_| generate_player_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn shuffle_keeps_every_item() {
        let items = (0..50).collect::<Vec<u32>>();
        let mut result = shuffled(&items);
        assert_eq!(result.len(), items.len());
        result.sort_unstable();
        assert_eq!(result, items);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_room_code("  ab1c "), "AB1C");
    }
}
