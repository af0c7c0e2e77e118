//! # Narrative Core
//!
//! The runtime half of the story engine. This crate owns the live story state
//! built from a `story_world::StoryConfig` and advances it on request of the
//! host game: explicit and automatic graph transitions, variable updates, and
//! the per-actor life simulation.
//!
//! ## Core Components
//!
//! - **narrative**: The `Narrative` service object and its engine settings
//! - **events**: Snapshots, named events, the event log, and the sink seam
//! - **diagnostics**: Warnings raised instead of errors
//! - **content**: First-match selection over condition-gated entries
//! - **scenes**: Active scene resolution and cast lookups
//! - **simulation**: Needs, jobs, mood, and relationships for each actor
//!
//! ## Design Philosophy
//!
//! - **Host-Driven**: No clocks or threads. Time moves only when the host calls `tick`
//! - **Forgiving**: Bad references degrade to warnings and no-ops, never errors
//! - **Deterministic**: Every scan follows declaration order

pub mod content;
pub mod diagnostics;
pub mod events;
pub mod narrative;
pub mod scenes;
pub mod simulation;

pub use content::*;
pub use diagnostics::*;
pub use events::*;
pub use narrative::*;
pub use scenes::*;
pub use simulation::*;

pub use story_world;
