//! # Actor Rules
//!
//! The actor-state side of Parley: characters with their abilities, skills,
//! items, languages and flags, plus the user and scene a conversation happens in.
//! Dialogue logic reads this state and dialogue effects write to it; this crate
//! knows nothing about dialogue graphs.

pub mod entities;
pub mod mechanics;
pub mod world_state;

pub use entities::*;
pub use mechanics::*;
pub use world_state::*;
