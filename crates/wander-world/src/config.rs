//! The immutable per-run simulation configuration.
//!
//! A single [`SimConfig`] value is passed into [`World`](crate::world::World)
//! construction and read everywhere a tunable is needed: the movement
//! probabilities of the place-sampling policy, the city footprints, whether
//! WRITE records are emitted, and the run knobs (seed, minute limit, gzip
//! level). Nothing in this crate reads globals.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::city::CityKind;
use crate::WorldError;

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// City footprint in grid cells (one cell is a 60 m x 60 m block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// All tunables of a simulation run.
///
/// The probabilities steer where an avatar's next ten-minute destination is
/// sampled, evaluated in the fixed branch order of
/// [`PlaceRef::random_location`](crate::place::PlaceRef::random_location).
/// Missing fields of a JSON config file fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Stay inside the current city for the next vtime.
    pub p_same_city: f64,
    /// Move to one of the zone's capitals.
    pub p_capital: f64,
    /// Move to one of the zone's major cities.
    pub p_major_city: f64,
    /// Move to one of the zone's minor cities.
    pub p_minor_city: f64,
    /// Move to one of the zone's instances.
    pub p_instance: f64,

    pub capital_footprint: Footprint,
    pub major_city_footprint: Footprint,
    pub minor_city_footprint: Footprint,
    pub instance_footprint: Footprint,

    /// Emit WRITE records (the avatar's own object and system writes).
    pub include_writes: bool,

    /// Scene PRNG seed; `None` seeds each scene with its scene number.
    pub seed: Option<u64>,

    /// Stop a scene after this many simulated minutes; `None` runs it out.
    pub minutes_limit: Option<i64>,

    /// Gzip level (0-9) for output segments; `None` writes plain text.
    pub compression: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            p_same_city: 0.5,
            p_capital: 0.2,
            p_major_city: 0.15,
            p_minor_city: 0.03,
            p_instance: 0.3,
            capital_footprint: Footprint::new(3, 3),
            major_city_footprint: Footprint::new(2, 2),
            minor_city_footprint: Footprint::new(1, 1),
            instance_footprint: Footprint::new(2, 2),
            include_writes: true,
            seed: None,
            minutes_limit: None,
            compression: None,
        }
    }
}

impl SimConfig {
    /// Load a config from a JSON file, defaulting every missing field.
    pub fn from_json_file(path: &Path) -> Result<Self, WorldError> {
        let file = File::open(path).map_err(|source| WorldError::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| WorldError::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// The footprint configured for a city kind.
    pub fn footprint(&self, kind: CityKind) -> Footprint {
        match kind {
            CityKind::Capital => self.capital_footprint,
            CityKind::Major => self.major_city_footprint,
            CityKind::Minor => self.minor_city_footprint,
            CityKind::Instance => self.instance_footprint,
        }
    }
}
