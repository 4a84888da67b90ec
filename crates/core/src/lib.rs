//! `ddmrp-core`: planning foundation building blocks.
//!
//! This crate contains **pure** primitives shared by the demand, buffer and
//! decoupling crates (no IO, no clocks, no threads).

pub mod date_range;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use date_range::DateRange;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorKind, ensure_finite, ensure_non_negative};
pub use id::{DecouplingPointId, LocationId, ProductId, ProductLocationPair, RunId};
pub use value_object::ValueObject;
