//! Zones: named rectangles that partition a continent, with typed city lists
//! and the adjacency set driving portal-vs-walk decisions.

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::city::{CityId, CityKind};
use crate::continent::ContinentName;
use crate::location::LocRef;
use crate::world::World;
use crate::SceneRng;

// ---------------------------------------------------------------------------
// ZoneId
// ---------------------------------------------------------------------------

/// Index of a zone in the world's zone arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A named half-open rectangle `[tl, br)` on one continent.
///
/// A zone is its own neighbor; the rest of the adjacency set is loaded from
/// the neighbors file and checked for symmetry at world construction.
#[derive(Debug)]
pub struct Zone {
    id: ZoneId,
    name: String,
    continent: ContinentName,
    tl: (u32, u32),
    br: (u32, u32),
    capitals: Vec<CityId>,
    major_cities: Vec<CityId>,
    minor_cities: Vec<CityId>,
    instances: Vec<CityId>,
    neighbors: BTreeSet<ZoneId>,
}

impl Zone {
    pub(crate) fn new(
        id: ZoneId,
        name: String,
        continent: ContinentName,
        tl: (u32, u32),
        br: (u32, u32),
    ) -> Self {
        Self {
            id,
            name,
            continent,
            tl,
            br,
            capitals: Vec::new(),
            major_cities: Vec::new(),
            minor_cities: Vec::new(),
            instances: Vec::new(),
            neighbors: BTreeSet::from([id]),
        }
    }

    #[inline]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
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

    /// All cells of the zone rectangle.
    pub fn locations(&self) -> impl Iterator<Item = LocRef> + '_ {
        let (tl, br) = (self.tl, self.br);
        (tl.0..br.0).flat_map(move |x| (tl.1..br.1).map(move |y| LocRef::new(self.continent, x, y)))
    }

    pub fn is_neighbor(&self, other: ZoneId) -> bool {
        self.neighbors.contains(&other)
    }

    pub fn neighbors(&self) -> &BTreeSet<ZoneId> {
        &self.neighbors
    }

    /// The zone's cities of one kind.
    pub fn cities(&self, kind: CityKind) -> &[CityId] {
        match kind {
            CityKind::Capital => &self.capitals,
            CityKind::Major => &self.major_cities,
            CityKind::Minor => &self.minor_cities,
            CityKind::Instance => &self.instances,
        }
    }

    pub(crate) fn add_city(&mut self, city: CityId, kind: CityKind) {
        match kind {
            CityKind::Capital => self.capitals.push(city),
            CityKind::Major => self.major_cities.push(city),
            CityKind::Minor => self.minor_cities.push(city),
            CityKind::Instance => self.instances.push(city),
        }
    }

    pub(crate) fn add_neighbor(&mut self, zone: ZoneId) {
        self.neighbors.insert(zone);
    }

    /// Sample the end point of the next ten-minute path, given the avatar's
    /// previous location.
    ///
    /// The policy is evaluated top to bottom, each branch taken independently
    /// with its configured probability and falling through on a miss:
    ///
    /// 1. `prev` is in this zone and inside a city -- stay in that city.
    /// 2. A uniformly chosen capital.
    /// 3. A uniformly chosen major city.
    /// 4. A uniformly chosen minor city.
    /// 5. A uniformly chosen instance.
    /// 6. A uniform cell of the zone rectangle.
    ///
    /// The branch order is part of the output contract: instances are
    /// considered after minor cities even though their probability is higher.
    pub fn random_location(
        &self,
        world: &World,
        prev: Option<LocRef>,
        rng: &mut SceneRng,
    ) -> LocRef {
        let cfg = world.config();

        if let Some(prev) = prev {
            let prev_loc = world.location(prev);
            if prev_loc.zone() == Some(self.id)
                && prev_loc.is_city()
                && rng.gen::<f64>() < cfg.p_same_city
            {
                let city = prev_loc.city().expect("city-flagged cell has a city");
                return world.city(city).random_location(rng);
            }
        }

        let tiers = [
            (&self.capitals, cfg.p_capital),
            (&self.major_cities, cfg.p_major_city),
            (&self.minor_cities, cfg.p_minor_city),
            (&self.instances, cfg.p_instance),
        ];
        for (cities, p) in tiers {
            if !cities.is_empty() && rng.gen::<f64>() < p {
                let pick = cities[rng.gen_range(0..cities.len())];
                return world.city(pick).random_location(rng);
            }
        }

        let x = rng.gen_range(self.tl.0..self.br.0);
        let y = rng.gen_range(self.tl.1..self.br.1);
        LocRef::new(self.continent, x, y)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zone({}, (({},{}), ({},{})))",
            self.name, self.tl.0, self.tl.1, self.br.0, self.br.1
        )
    }
}
