//! # register-db: SQLite Backing Store for the Cash Register
//!
//! Persistence layer: connection pooling, embedded migrations, and the
//! shift/transaction repositories. All SQL in the system lives in this
//! crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            register-service (operation surface)         │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//! ┌───────────────────────────▼─────────────────────────────┐
//! │              ★ register-db (THIS CRATE) ★               │
//! │                                                         │
//! │   ┌────────┐  ┌────────────┐  ┌─────────────────────┐   │
//! │   │  pool  │  │ migrations │  │     repository      │   │
//! │   │Database│  │  embedded  │  │  shifts ─ ledger    │   │
//! │   └────────┘  └────────────┘  └─────────────────────┘   │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//!                          SQLite
//! ```
//!
//! ## Two Constraints the Store Owns
//!
//! - The `one_open_shift` partial unique index is the authoritative
//!   enforcement of "at most one open shift"; application pre-checks are
//!   advisory.
//! - Reads funnel through the normalizer in `register-core`, so rows from
//!   any schema generation come back canonical.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::shift::ShiftRepository;
pub use repository::transaction::TransactionRepository;
