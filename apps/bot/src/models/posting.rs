use serde::{Deserialize, Serialize};

/// A single job listing, normalized from a source connector's raw result.
/// Ephemeral: fetched per run, never persisted beyond the delivered-id set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
}

impl Posting {
    /// Stable, source-qualified identity: re-fetching the same posting
    /// yields the same id. Collisions across sources are acceptable since
    /// the source name prefixes the id.
    pub fn id(&self) -> String {
        format!("{}_{:016x}", self.source.to_lowercase(), fnv1a64(&self.link))
    }
}

/// Outcome of scoring one (posting, resume) pair. Derived per run,
/// never cached.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Always in [0,100].
    pub score: u8,
    pub analysis: String,
}

// FNV-1a, 64 bit. `DefaultHasher` is not stable across releases and the
// id must survive restarts via the persisted delivered set.
fn fnv1a64(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
