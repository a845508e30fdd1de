//! reel-radar domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `lexicon`: Word lists driving the request heuristic
//! - `schedule`: Daily report timing
//! - `zone`: Timezones for local calendar days
//! - `usecases`: Application use cases / business logic

pub mod lexicon;
pub mod model;
pub mod ports;
pub mod schedule;
pub mod usecases;
pub mod zone;

pub use model::*;
pub use ports::*;
