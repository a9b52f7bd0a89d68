//! Wander World -- the static world model for the avatar-movement simulator.
//!
//! This crate owns everything that exists *before* a scene starts running:
//! continents tiled with [`Location`](location::Location)s, zones with their
//! typed city lists and adjacency graph, cities with fixed footprints, and the
//! immutable [`SimConfig`](config::SimConfig) that parameterises movement.
//!
//! The world is loaded once per scene from three map files (one CSV per
//! continent, a cities CSV, and a zone-adjacency text file) and then only
//! mutated through the per-location avatar membership sets while a scene
//! runs.
//!
//! # Ownership model
//!
//! All cross-references are arena indices, never owning pointers:
//!
//! - [`Continent`](continent::Continent) owns its dense grid of `Location`s.
//! - [`World`](world::World) owns the zone and city arenas; locations carry
//!   [`ZoneId`](zone::ZoneId) / [`CityId`](city::CityId) back-references.
//! - Avatars live in the simulator's arena; locations hold
//!   [`AvatarId`](location::AvatarId) membership sets only.
//!
//! # Quick Start
//!
//! ```no_run
//! use wander_world::prelude::*;
//!
//! let world = World::load("Maps".as_ref(), SimConfig::default()).unwrap();
//! let place = world.resolve_place("the old quarter").unwrap();
//! let mut rng = scene_rng(7);
//! let loc = place.random_location(&world, None, &mut rng);
//! assert_eq!(place.continent(&world), loc.continent);
//! ```

#![deny(unsafe_code)]

pub mod city;
pub mod config;
pub mod continent;
pub mod location;
pub mod place;
pub mod time;
pub mod world;
pub mod zone;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Scene PRNG
// ---------------------------------------------------------------------------

/// The PRNG driving every randomized decision of a scene.
///
/// One instance per scene, seeded exactly once per reset. All sampling draws
/// from this single stream in a fixed order, which is what makes scene output
/// reproducible under a fixed seed.
pub type SceneRng = rand_pcg::Pcg64;

/// Build a scene PRNG from a seed.
pub fn scene_rng(seed: u64) -> SceneRng {
    use rand::SeedableRng;
    SceneRng::seed_from_u64(seed)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or querying the world model.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A map file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A map CSV row could not be parsed (the csv error carries the position).
    #[error("malformed CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A config file was not valid JSON for [`config::SimConfig`].
    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A city row references a zone that no continent defines.
    #[error("city '{city}' references unknown zone '{zone}'")]
    UnknownZone { city: String, zone: String },

    /// A city row carries a type outside the known four.
    #[error("city '{city}' has unknown type '{value}'")]
    UnknownCityType { city: String, value: String },

    /// A line of the adjacency file could not be split into `zone: neighbors`.
    #[error("{}:{line}: malformed adjacency line", .path.display())]
    MalformedAdjacency { path: PathBuf, line: usize },

    /// The adjacency file names a zone that no continent defines.
    #[error("adjacency list references unknown zone '{name}'")]
    UnknownAdjacencyZone { name: String },

    /// The loaded adjacency graph is not symmetric.
    #[error("zone adjacency is not symmetric: '{from}' lists '{to}' but not the reverse")]
    AsymmetricAdjacency { from: String, to: String },

    /// A place name from a scene resolves to neither a named city nor a zone.
    #[error("unknown place '{name}' (neither a named city nor a zone)")]
    UnknownPlace { name: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::city::{City, CityId, CityKind};
    pub use crate::config::{Footprint, SimConfig};
    pub use crate::continent::{Continent, ContinentName};
    pub use crate::location::{AvatarId, LocRef, Location};
    pub use crate::place::PlaceRef;
    pub use crate::time::{MINUTE, MINUTES_IN_VTIME, SECONDS_IN_VTIME};
    pub use crate::world::World;
    pub use crate::zone::{Zone, ZoneId};
    pub use crate::{scene_rng, SceneRng, WorldError};
}
