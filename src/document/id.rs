//! Surrogate identifier generator
//!
//! 12-byte identifiers rendered as 24 lowercase hex characters:
//!
//! ```text
//! ┌──────────────────┬──────────────────────┬──────────────────┐
//! │ Unix seconds (4) │ Process random (5)   │ Counter (3)      │
//! └──────────────────┴──────────────────────┴──────────────────┘
//! ```
//!
//! The big-endian timestamp prefix makes identifiers sort roughly by
//! creation time; the counter keeps ids from one process distinct within a
//! second and the random discriminator separates processes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Generates collision-resistant identifiers without any external service
pub struct IdGenerator {
    discriminator: [u8; 5],
    counter: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            discriminator: rng.gen(),
            counter: AtomicU32::new(rng.gen::<u32>() & COUNTER_MASK),
        }
    }

    /// Produce the next identifier
    pub fn generate(&self) -> String {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.discriminator);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Next identifier from the process-wide generator
pub fn next_id() -> String {
    static GENERATOR: OnceLock<IdGenerator> = OnceLock::new();
    GENERATOR.get_or_init(IdGenerator::new).generate()
}
