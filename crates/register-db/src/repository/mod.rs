//! # Repository Module
//!
//! Repository implementations for the register store.
//!
//! ## Repository Pattern
//! ```text
//! register-service operation
//!      │
//!      │  db.shifts().get_active()
//!      │  db.transactions().list_for_shift(id)
//!      ▼
//! ShiftRepository / TransactionRepository
//!      │
//!      │  SQL (isolated here, nowhere else)
//!      ▼
//! SQLite
//! ```
//!
//! ## Available Repositories
//!
//! - [`shift::ShiftRepository`] - shift rows and the active-shift guard
//! - [`transaction::TransactionRepository`] - the append-only ledger

pub mod shift;
pub mod transaction;
