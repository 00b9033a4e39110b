//! Storage scenario tests.

use super::*;
use crate::constants::{ID_MAX_ATTEMPTS, META_LIMIT};
use crate::models::paste::{ClientMeta, NewPaste, PasteRecord};
use crate::test_support::*;
use chrono::Duration;

fn create(db: &Database, content: &str) -> PasteRecord {
    db.pastes
        .create(NewPaste::new(content), ClientMeta::default())
        .expect("create")
}

fn create_expiring(db: &Database, content: &str, minutes: u32) -> PasteRecord {
    db.pastes
        .create(NewPaste::new(content).expiring_in(minutes), ClientMeta::default())
        .expect("create")
}

fn stored_paste_keys(db: &Database) -> Vec<String> {
    db.backend
        .list_keys(Namespace::Pastes)
        .expect("list paste keys")
}
