//! redb table definitions, one per storage namespace.

use super::backend::Namespace;
use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Paste rows keyed `<id>.json` (`PasteRecord`, JSON-encoded).
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");
/// Recency index row keyed `index.json` (`Vec<PasteSummary>`, JSON-encoded).
pub const PASTES_META: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes_meta");
/// Rate-limit rows keyed `pastes:<identity>` (`RateLimitRecord`, JSON-encoded).
pub const RATE_LIMITS: TableDefinition<&str, &[u8]> = TableDefinition::new("ratelimits");

/// Table backing a namespace.
pub(crate) fn table_for(namespace: Namespace) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match namespace {
        Namespace::Pastes => PASTES,
        Namespace::Meta => PASTES_META,
        Namespace::RateLimits => RATE_LIMITS,
    }
}
