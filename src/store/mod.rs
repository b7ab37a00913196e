//! Store Module
//!
//! Orchestrates the filter engine, index manager and constraint validator
//! over a collection snapshot.
//!
//! ## Data Flow
//! ```text
//!   caller ──► guard (read | write)
//!                │
//!                ▼
//!          load snapshot + indexes
//!                │
//!      ┌─────────┴──────────┐
//!      ▼                    ▼
//!   read path            write path
//!   prune → filter       unique check → mutate
//!   sort → page          index entries → persist
//!                           │
//!                           ▼
//!                     catalog stats
//! ```

mod collection;
mod guard;

pub use collection::CollectionStore;
pub use guard::ConcurrencyGuard;
