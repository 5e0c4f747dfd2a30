//! The cache bank subsystem (spec.md §4.2).

pub mod bank;
pub mod mshr;
pub mod tag_array;

pub use bank::{CacheBank, Downstream};
pub use mshr::InFlightMissTable;
pub use tag_array::{CacheLine, TagArray};
