//! # Dialogue Core
//!
//! Branching NPC conversations: game masters author a graph of dialogue nodes,
//! attach requirements and effects to the options, and players walk the graph
//! at runtime. This crate reads and writes actor state from `actor_rules` and
//! talks to the host application only through the traits in [`host`].
//!
//! ## Core Components
//!
//! - **graph**: Nodes, options and the integrity rules that keep references valid
//! - **requirements**: Boolean requirement trees evaluated against an actor
//! - **results**: Ordered, roll-gated effects run when an option is chosen
//! - **traversal**: The runtime walker that presents options and advances
//! - **storage** / **authoring**: Persisting graphs and the editing session that owns one
//!
//! ## Design Philosophy
//!
//! - **Self-healing structure**: Broken starts and dangling targets are repaired, never surfaced
//! - **Fail soft at runtime**: Bad data or missing host features degrade to locks and warnings
//! - **Explicit ownership**: A graph is a plain value owned by one session at a time

pub mod authoring;
pub mod config;
pub mod graph;
pub mod host;
pub mod requirements;
pub mod results;
pub mod storage;
pub mod traversal;

pub use authoring::*;
pub use config::*;
pub use graph::*;
pub use host::*;
pub use requirements::*;
pub use results::*;
pub use storage::*;
pub use traversal::*;
