//! Paste id generation.
//!
//! Ids are [`ID_LENGTH`] symbols drawn independently from a 64-symbol
//! URL-safe alphabet with the operating-system CSPRNG, giving 48 bits of
//! entropy per id. Every symbol is used as drawn, so there is no truncation
//! step that could produce a short or degenerate id.

use crate::constants::ID_LENGTH;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Pluggable id source used by the paste store.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Generate a random paste id.
///
/// # Returns
/// A fresh URL-safe id of [`ID_LENGTH`] characters.
pub fn generate_id() -> String {
    let mut rng = OsRng;
    (0..ID_LENGTH)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Default generator handed to the store.
pub fn default_generator() -> IdGenerator {
    Arc::new(generate_id)
}
