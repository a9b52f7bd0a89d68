//! Wander Sim -- the discrete-time simulator that turns coarse avatar
//! activity into a second-by-second storage I/O trace.
//!
//! A scene CSV places avatars in zones or cities once per vtime (ten
//! simulated minutes). [`Scene`](scene::Scene) expands that timeline: each
//! tick it advances every avatar one second, at vtime boundaries each avatar
//! adopts its next guild and plans a fresh per-second path, and every tick
//! emits the I/O records the active avatars generate, grouped into
//! ten-minute output segments.
//!
//! Within one scene everything is single-threaded and deterministic: all
//! randomized decisions draw from one seeded PRNG in a fixed order, so a
//! scene re-run with the same inputs and seed reproduces its output byte for
//! byte. Parallelism belongs across scenes, which share nothing mutable.
//!
//! # Quick Start
//!
//! ```no_run
//! use wander_sim::prelude::*;
//! use wander_world::prelude::*;
//!
//! let world = World::load("Maps".as_ref(), SimConfig::default()).unwrap();
//! let mut scene = Scene::load("Scenes".as_ref(), 7, world).unwrap();
//! scene
//!     .run(&RunOptions {
//!         output_dir: "IOs".into(),
//!         keep_output: false,
//!     })
//!     .unwrap();
//! ```

#![deny(unsafe_code)]

pub mod avatar;
pub mod changes;
pub mod guild;
pub mod multiply;
pub mod path;
pub mod scene;
pub mod trace;

use std::path::PathBuf;

/// Re-export the world crate for convenience.
pub use wander_world;

use wander_world::WorldError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading, running, or post-processing a scene.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A scene input or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scene CSV row could not be parsed (the csv error carries the
    /// position).
    #[error("malformed scene CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The scene CSV parsed but violates the schema contract.
    #[error("scene CSV {}: {message}", .path.display())]
    Schema { path: PathBuf, message: String },

    /// The scene CSV has a header but no rows.
    #[error("scene CSV {} has no rows", .path.display())]
    EmptyScene { path: PathBuf },

    /// World loading or place resolution failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A trace segment could not be created or written.
    #[error("failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No trace segments were found for a scene to multiply.
    #[error("no trace segments for scene {scene} under {}", .path.display())]
    NoSegments { scene: u32, path: PathBuf },

    /// A trace line did not have the `device, time, object, op` shape.
    #[error("{}:{line}: malformed trace record", .path.display())]
    MalformedTrace { path: PathBuf, line: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::avatar::Avatar;
    pub use crate::changes::ChangeLog;
    pub use crate::guild::{Guild, GuildId, GuildRoster};
    pub use crate::multiply::{multiply_scene, MultiplyOptions};
    pub use crate::path::VtimePath;
    pub use crate::scene::{RunOptions, Scene};
    pub use crate::SimError;
}
