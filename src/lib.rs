//! # LVDB - A Local Vector Database
//!
//! LVDB stores numeric vectors under ids it assigns itself and answers
//! k-nearest-neighbour queries by exact cosine similarity. Every query is a
//! linear scan over all stored vectors; there is no approximate index.
//!
//! The store can live purely in memory or be backed by an append-only log
//! file (see [`persist`]). It is safe to share between threads: writers are
//! exclusive, readers and searches run side by side.
//!
//! ## Example
//!
//! ```
//! use lvdb::VecDB;
//!
//! let db = VecDB::new();
//!
//! // Insert vectors; ids are handed out by the store
//! let x = db.insert(vec![1.0, 0.0]).unwrap();
//! let y = db.insert(vec![0.0, 1.0]).unwrap();
//! let xy = db.insert(vec![1.0, 1.0]).unwrap();
//!
//! // Search for similar vectors
//! let results = db.search(&[1.0, 0.0], 2).unwrap();
//! assert_eq!(results[0].record.id, x); // Most similar vector
//! assert_eq!(results[1].record.id, xy);
//! # let _ = y;
//! ```

pub mod config;
pub mod persist;
pub mod search;
pub mod server;
pub mod vector;
mod db;
mod error;
mod record;

// Re-export the core types as the primary public API
pub use db::VecDB;
pub use error::{DbError, Result};
pub use record::{SearchResult, VectorRecord};
