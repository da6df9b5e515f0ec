//! Hub id generation.
//!
//! Ids are the first 24 hex chars of a BLAKE3 digest over wall-clock
//! microseconds, the process id and a process-wide counter, so two ids minted
//! in the same microsecond still differ.

use std::sync::atomic::{AtomicU64, Ordering};

const HUB_ID_LEN: usize = 24;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh hub id.
#[must_use]
pub fn generate_id() -> String {
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let now_us = chrono::Utc::now().timestamp_micros();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&now_us.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&seq.to_le_bytes());

    let hex = hasher.finalize().to_hex();
    hex[..HUB_ID_LEN].to_string()
}
