//! # Manhwa Catalogue Store
//!
//! The `Store` port (C1) and its two implementations: `PgStore` for
//! production, `FakeStore` for tests.

pub mod error;
pub mod fake;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use fake::FakeStore;
pub use postgres::PgStore;
pub use traits::{ManhwaPatch, NewManhwa, OutdatedRow, SearchRow, Store};
