//! Server operations.
//!
//! Operations are methods of [`FileMakerClient`](crate::FileMakerClient),
//! grouped by file: names and metadata, finds, writes and container
//! downloads. Lower-level building blocks live in [`query`] and in the
//! [`PaginatedFetcher`].

mod container;
mod find;
mod names;
mod paginate;
pub mod query;
mod write;

pub use container::*;
pub use paginate::*;
