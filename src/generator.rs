//! Random identifier generation with collision avoidance
//!
//! Short codes, user ids, and visitor ids are all drawn from the same
//! six-character alphanumeric namespace. A candidate is only handed out once
//! the caller's occupancy check clears it, and the caller is expected to hold
//! the table write lock across generate-and-insert so no concurrent request
//! can claim the same id in between.

use rand::{distr::Alphanumeric, Rng};

/// Length of every generated identifier
pub const CODE_LEN: usize = 6;

/// Draws random candidates until `is_taken` reports one free
///
/// The retry loop is unbounded; with 62^6 possible ids the expected number
/// of draws stays at one for any realistic table size.
pub fn generate_code<F>(is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let candidate: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LEN)
            .map(char::from)
            .collect();

        if !is_taken(&candidate) {
            return candidate;
        }
    }
}
