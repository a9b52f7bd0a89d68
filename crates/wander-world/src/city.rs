//! Cities: typed footprints placed inside zones.
//!
//! A city's rectangle starts at its CSV top-left corner, extends by the
//! footprint configured for its kind, and is clipped to its zone's
//! bottom-right corner. Cities named [`NO_NAME`] are valid map content but
//! stay out of the named-city index.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::continent::ContinentName;
use crate::location::LocRef;
use crate::zone::ZoneId;
use crate::SceneRng;

/// Placeholder name for unnamed cities in the cities CSV.
pub const NO_NAME: &str = "NO NAME";

// ---------------------------------------------------------------------------
// CityId / CityKind
// ---------------------------------------------------------------------------

/// Index of a city in the world's city arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CityId(pub u32);

impl CityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CityId({})", self.0)
    }
}

/// The four city tiers of the dataset, each with a configured footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CityKind {
    Minor,
    Major,
    Capital,
    Instance,
}

impl CityKind {
    /// Parse the cities-CSV `type` column.
    pub fn from_dataset(value: &str) -> Option<CityKind> {
        match value {
            "capital" => Some(CityKind::Capital),
            "major city" => Some(CityKind::Major),
            "minor city" => Some(CityKind::Minor),
            "instance" => Some(CityKind::Instance),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// City
// ---------------------------------------------------------------------------

/// A city rectangle `[tl, br)`, clipped to its owning zone.
#[derive(Debug)]
pub struct City {
    name: String,
    kind: CityKind,
    zone: ZoneId,
    continent: ContinentName,
    tl: (u32, u32),
    br: (u32, u32),
}

impl City {
    /// Build a city from its CSV corner, clipping the footprint to the zone's
    /// bottom-right corner.
    pub(crate) fn new(
        name: String,
        kind: CityKind,
        tl: (u32, u32),
        footprint: (u32, u32),
        zone: ZoneId,
        zone_br: (u32, u32),
        continent: ContinentName,
    ) -> Self {
        let br = (
            zone_br.0.min(tl.0 + footprint.0),
            zone_br.1.min(tl.1 + footprint.1),
        );
        Self {
            name,
            kind,
            zone,
            continent,
            tl,
            br,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> CityKind {
        self.kind
    }

    #[inline]
    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    #[inline]
    pub fn continent(&self) -> ContinentName {
        self.continent
    }

    /// Bounds as `(tl, br)`, bottom-right exclusive.
    #[inline]
    pub fn bounds(&self) -> ((u32, u32), (u32, u32)) {
        (self.tl, self.br)
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.tl.0 <= x && x < self.br.0 && self.tl.1 <= y && y < self.br.1
    }

    /// All cells of the (clipped) footprint.
    pub fn locations(&self) -> impl Iterator<Item = LocRef> + '_ {
        let (tl, br) = (self.tl, self.br);
        (tl.0..br.0).flat_map(move |x| (tl.1..br.1).map(move |y| LocRef::new(self.continent, x, y)))
    }

    /// A uniform cell of the footprint.
    pub fn random_location(&self, rng: &mut SceneRng) -> LocRef {
        let x = rng.gen_range(self.tl.0..self.br.0);
        let y = rng.gen_range(self.tl.1..self.br.1);
        LocRef::new(self.continent, x, y)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "City({}, (({},{}), ({},{})))",
            self.name, self.tl.0, self.tl.1, self.br.0, self.br.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_rng;

    #[test]
    fn kind_parsing() {
        assert_eq!(CityKind::from_dataset("capital"), Some(CityKind::Capital));
        assert_eq!(CityKind::from_dataset("major city"), Some(CityKind::Major));
        assert_eq!(CityKind::from_dataset("minor city"), Some(CityKind::Minor));
        assert_eq!(CityKind::from_dataset("instance"), Some(CityKind::Instance));
        assert_eq!(CityKind::from_dataset("village"), None);
    }

    #[test]
    fn footprint_is_clipped_to_zone() {
        let city = City::new(
            "harrow".into(),
            CityKind::Capital,
            (8, 8),
            (3, 3),
            ZoneId(0),
            (10, 10),
            ContinentName::Kalimdor,
        );
        assert_eq!(city.bounds(), ((8, 8), (10, 10)));
        assert_eq!(city.locations().count(), 4);
    }

    #[test]
    fn random_location_stays_inside_the_footprint() {
        let city = City::new(
            "harrow".into(),
            CityKind::Major,
            (4, 5),
            (2, 2),
            ZoneId(0),
            (20, 20),
            ContinentName::Outland,
        );
        let mut rng = scene_rng(11);
        for _ in 0..100 {
            let loc = city.random_location(&mut rng);
            assert!(city.contains(loc.x, loc.y), "{loc} outside {city}");
            assert_eq!(loc.continent, ContinentName::Outland);
        }
    }

    #[test]
    fn single_cell_city_always_samples_its_cell() {
        let city = City::new(
            NO_NAME.into(),
            CityKind::Minor,
            (7, 7),
            (1, 1),
            ZoneId(0),
            (10, 10),
            ContinentName::Kalimdor,
        );
        let mut rng = scene_rng(0);
        for _ in 0..10 {
            assert_eq!(city.random_location(&mut rng), LocRef::new(ContinentName::Kalimdor, 7, 7));
        }
    }
}
