//! Places: what a scene row can send an avatar to.
//!
//! The input dataset records presence at place granularity -- a zone by
//! default, or a specific named city. [`PlaceRef`] is the tagged handle for
//! either; the world resolves scene place names into it.

use crate::city::CityId;
use crate::continent::ContinentName;
use crate::location::LocRef;
use crate::world::World;
use crate::zone::ZoneId;
use crate::SceneRng;

/// A zone or a named city, by arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceRef {
    Zone(ZoneId),
    City(CityId),
}

impl PlaceRef {
    pub fn name(self, world: &World) -> &str {
        match self {
            PlaceRef::Zone(id) => world.zone(id).name(),
            PlaceRef::City(id) => world.city(id).name(),
        }
    }

    pub fn continent(self, world: &World) -> ContinentName {
        match self {
            PlaceRef::Zone(id) => world.zone(id).continent(),
            PlaceRef::City(id) => world.city(id).continent(),
        }
    }

    /// Bounds as `(tl, br)`, bottom-right exclusive.
    pub fn bounds(self, world: &World) -> ((u32, u32), (u32, u32)) {
        match self {
            PlaceRef::Zone(id) => world.zone(id).bounds(),
            PlaceRef::City(id) => world.city(id).bounds(),
        }
    }

    /// All cells of the place's rectangle.
    pub fn locations(self, world: &World) -> Box<dyn Iterator<Item = LocRef> + '_> {
        match self {
            PlaceRef::Zone(id) => Box::new(world.zone(id).locations()),
            PlaceRef::City(id) => Box::new(world.city(id).locations()),
        }
    }

    /// Sample the end point of the next ten-minute path.
    ///
    /// Zones apply the tiered city policy (see
    /// [`Zone::random_location`](crate::zone::Zone::random_location)); cities
    /// sample uniformly inside their footprint.
    pub fn random_location(
        self,
        world: &World,
        prev: Option<LocRef>,
        rng: &mut SceneRng,
    ) -> LocRef {
        match self {
            PlaceRef::Zone(id) => world.zone(id).random_location(world, prev, rng),
            PlaceRef::City(id) => world.city(id).random_location(rng),
        }
    }
}
