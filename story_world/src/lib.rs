//! # Story World
//!
//! The data model crate for the narrative service. It holds everything an
//! author writes down and everything a condition can look at, but performs no
//! simulation of its own.
//!
//! ## Contents
//!
//! - **value**: Typed story variables and the variable store
//! - **ordered**: A declaration-ordered map used wherever order is meaningful
//! - **condition**: The shared condition type and its pure matcher
//! - **graph**: Story graphs, nodes, edges, and the graph store
//! - **scene**: Authored scenes and their cast
//! - **config**: Needs, jobs, actors, and the top-level story configuration

pub mod condition;
pub mod config;
pub mod graph;
pub mod ordered;
pub mod scene;
pub mod value;

pub use condition::*;
pub use config::*;
pub use graph::*;
pub use ordered::*;
pub use scene::*;
pub use value::*;
