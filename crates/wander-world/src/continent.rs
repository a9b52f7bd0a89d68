//! Continents: dense grids of locations, loaded from per-continent zone CSVs.
//!
//! Each continent has its own CSV under the maps directory (named after the
//! continent, e.g. `kalimdor.csv`) listing that continent's zones as
//! half-open rectangles. The continent's bounds are the maximum
//! bottom-right corner over its zones, and every cell inside the bounds gets
//! a [`Location`] up front -- walks may cross cells that no zone rectangle
//! covers.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::location::{LocRef, Location};
use crate::WorldError;

// ---------------------------------------------------------------------------
// ContinentName
// ---------------------------------------------------------------------------

/// The fixed continent set of the map dataset.
///
/// The `as_str` form doubles as the stem of the continent's zone CSV, and the
/// first letter is the continent tag inside location object ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContinentName {
    Kalimdor,
    EasternKingdoms,
    Outland,
}

impl ContinentName {
    /// All continents, in arena order.
    pub const ALL: [ContinentName; 3] = [
        ContinentName::Kalimdor,
        ContinentName::EasternKingdoms,
        ContinentName::Outland,
    ];

    /// The dataset name (also the zone CSV file stem).
    pub fn as_str(self) -> &'static str {
        match self {
            ContinentName::Kalimdor => "kalimdor",
            ContinentName::EasternKingdoms => "eastern kingdoms",
            ContinentName::Outland => "outland",
        }
    }

    /// The single-letter tag used in location object ids.
    pub fn initial(self) -> char {
        match self {
            ContinentName::Kalimdor => 'k',
            ContinentName::EasternKingdoms => 'e',
            ContinentName::Outland => 'o',
        }
    }

    /// Index into the world's continent arena.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ContinentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Zone CSV rows
// ---------------------------------------------------------------------------

/// Raw zone CSV row. Every field is optional so that rows with blanks can be
/// dropped like the upstream dataset expects, instead of failing the load.
#[derive(Debug, Deserialize)]
struct ZoneRow {
    name: Option<String>,
    tl_x: Option<u32>,
    tl_y: Option<u32>,
    br_x: Option<u32>,
    br_y: Option<u32>,
    capitals: Option<u32>,
    #[serde(rename = "major cities")]
    major_cities: Option<u32>,
    #[serde(rename = "minor cities")]
    minor_cities: Option<u32>,
}

/// A validated zone rectangle, handed to the world for zone-arena assembly.
#[derive(Debug, Clone)]
pub(crate) struct ZoneSpec {
    pub name: String,
    pub tl: (u32, u32),
    pub br: (u32, u32),
}

// ---------------------------------------------------------------------------
// Continent
// ---------------------------------------------------------------------------

/// A dense grid of [`Location`]s plus the continent's zone rectangles.
pub struct Continent {
    name: ContinentName,
    br: (u32, u32),
    grid: Vec<Location>,
}

impl Continent {
    /// Load a continent's zones from its CSV and build the location grid.
    ///
    /// Rows with any empty field are dropped with a warning. Returns the
    /// continent and the zone rectangles for the world to register.
    pub(crate) fn from_csv(
        name: ContinentName,
        path: &Path,
    ) -> Result<(Continent, Vec<ZoneSpec>), WorldError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| WorldError::Csv {
            path: path.to_owned(),
            source,
        })?;

        let mut specs = Vec::new();
        for row in reader.deserialize::<ZoneRow>() {
            let row = row.map_err(|source| WorldError::Csv {
                path: path.to_owned(),
                source,
            })?;
            match row {
                ZoneRow {
                    name: Some(zone),
                    tl_x: Some(tl_x),
                    tl_y: Some(tl_y),
                    br_x: Some(br_x),
                    br_y: Some(br_y),
                    capitals: Some(_),
                    major_cities: Some(_),
                    minor_cities: Some(_),
                } => specs.push(ZoneSpec {
                    name: zone,
                    tl: (tl_x, tl_y),
                    br: (br_x, br_y),
                }),
                incomplete => {
                    tracing::warn!(
                        continent = %name,
                        zone = incomplete.name.as_deref().unwrap_or("<unnamed>"),
                        "dropping zone row with empty fields"
                    );
                }
            }
        }

        let br = (
            specs.iter().map(|s| s.br.0).max().unwrap_or(0),
            specs.iter().map(|s| s.br.1).max().unwrap_or(0),
        );
        let mut grid = Vec::with_capacity((br.0 * br.1) as usize);
        for y in 0..br.1 {
            for x in 0..br.0 {
                grid.push(Location::new(x, y));
            }
        }

        Ok((Continent { name, br, grid }, specs))
    }

    #[inline]
    pub fn name(&self) -> ContinentName {
        self.name
    }

    /// Bounds as `(width, height)`; cells span `[0, width) x [0, height)`.
    #[inline]
    pub fn bounds(&self) -> (u32, u32) {
        self.br
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.br.0 && y < self.br.1
    }

    #[inline]
    fn grid_index(&self, x: u32, y: u32) -> usize {
        assert!(
            self.contains(x, y),
            "({x},{y}) is outside {} bounds {:?}",
            self.name,
            self.br
        );
        (y * self.br.0 + x) as usize
    }

    /// The cell at `(x, y)`, in O(1).
    #[inline]
    pub fn location(&self, x: u32, y: u32) -> &Location {
        &self.grid[self.grid_index(x, y)]
    }

    #[inline]
    pub fn location_mut(&mut self, x: u32, y: u32) -> &mut Location {
        let idx = self.grid_index(x, y);
        &mut self.grid[idx]
    }

    /// The handle for cell `(x, y)`.
    #[inline]
    pub fn loc_ref(&self, x: u32, y: u32) -> LocRef {
        LocRef::new(self.name, x, y)
    }

    /// Empty every cell's avatar set (scene reset).
    pub fn reset(&mut self) {
        for loc in &mut self.grid {
            loc.reset();
        }
    }
}

impl fmt::Debug for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Continent({}, {:?})", self.name, self.br)
    }
}
