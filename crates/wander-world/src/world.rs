//! The world: continents, zone and city arenas, name indices, adjacency.
//!
//! A [`World`] is loaded once per scene from a maps directory containing one
//! zone CSV per continent, `cities.csv`, and `neighbors.txt`. After loading,
//! the only mutable state is the per-location avatar membership sets, cleared
//! by [`World::reset`] at scene start.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::city::{City, CityId, CityKind, NO_NAME};
use crate::config::SimConfig;
use crate::continent::{Continent, ContinentName};
use crate::location::{LocRef, Location};
use crate::place::PlaceRef;
use crate::zone::{Zone, ZoneId};
use crate::WorldError;

// ---------------------------------------------------------------------------
// Cities CSV rows
// ---------------------------------------------------------------------------

/// Raw cities CSV row; rows with blanks are dropped, like zone rows.
#[derive(Debug, serde::Deserialize)]
struct CityRow {
    name: Option<String>,
    tl_x: Option<u32>,
    tl_y: Option<u32>,
    zone: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// All continents plus the global zone/city arenas and name indices.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    continents: Vec<Continent>,
    zones: Vec<Zone>,
    zone_index: HashMap<String, ZoneId>,
    cities: Vec<City>,
    city_index: HashMap<String, CityId>,
}

impl World {
    /// Load the world from a maps directory.
    ///
    /// Expects `<continent>.csv` for every continent, `cities.csv`, and
    /// `neighbors.txt`. The adjacency graph is validated to be symmetric;
    /// an asymmetric graph is corrupt input and fails the load.
    pub fn load(maps_dir: &Path, config: SimConfig) -> Result<World, WorldError> {
        let mut continents = Vec::with_capacity(ContinentName::ALL.len());
        let mut zones: Vec<Zone> = Vec::new();
        let mut zone_index: HashMap<String, ZoneId> = HashMap::new();

        for name in ContinentName::ALL {
            let path = maps_dir.join(format!("{}.csv", name.as_str()));
            let (mut continent, specs) = Continent::from_csv(name, &path)?;
            for spec in specs {
                let id = ZoneId(zones.len() as u32);
                for y in spec.tl.1..spec.br.1 {
                    for x in spec.tl.0..spec.br.0 {
                        continent.location_mut(x, y).set_zone(id);
                    }
                }
                if zone_index.insert(spec.name.clone(), id).is_some() {
                    tracing::warn!(zone = %spec.name, "duplicate zone name, keeping the later definition");
                }
                zones.push(Zone::new(id, spec.name, name, spec.tl, spec.br));
            }
            continents.push(continent);
        }

        let mut world = World {
            config,
            continents,
            zones,
            zone_index,
            cities: Vec::new(),
            city_index: HashMap::new(),
        };
        world.load_cities(&maps_dir.join("cities.csv"))?;
        world.load_adjacency(&maps_dir.join("neighbors.txt"))?;
        world.check_adjacency_symmetry()?;
        Ok(world)
    }

    fn load_cities(&mut self, path: &Path) -> Result<(), WorldError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| WorldError::Csv {
            path: path.to_owned(),
            source,
        })?;

        for row in reader.deserialize::<CityRow>() {
            let row = row.map_err(|source| WorldError::Csv {
                path: path.to_owned(),
                source,
            })?;
            let (name, tl, zone_name, kind_value) = match row {
                CityRow {
                    name: Some(name),
                    tl_x: Some(tl_x),
                    tl_y: Some(tl_y),
                    zone: Some(zone),
                    kind: Some(kind),
                } => (name, (tl_x, tl_y), zone, kind),
                incomplete => {
                    tracing::warn!(
                        city = incomplete.name.as_deref().unwrap_or("<unnamed>"),
                        "dropping city row with empty fields"
                    );
                    continue;
                }
            };

            let kind =
                CityKind::from_dataset(&kind_value).ok_or_else(|| WorldError::UnknownCityType {
                    city: name.clone(),
                    value: kind_value,
                })?;
            let zone_id = *self
                .zone_index
                .get(&zone_name)
                .ok_or_else(|| WorldError::UnknownZone {
                    city: name.clone(),
                    zone: zone_name,
                })?;

            let zone = &self.zones[zone_id.index()];
            let (continent_name, zone_br) = (zone.continent(), zone.bounds().1);
            let footprint = self.config.footprint(kind);
            let id = CityId(self.cities.len() as u32);
            let city = City::new(
                name,
                kind,
                tl,
                (footprint.width, footprint.height),
                zone_id,
                zone_br,
                continent_name,
            );

            let continent = &mut self.continents[continent_name.index()];
            for loc in city.locations() {
                continent.location_mut(loc.x, loc.y).set_city(id);
            }
            self.zones[zone_id.index()].add_city(id, kind);
            if city.name() != NO_NAME {
                self.city_index.insert(city.name().to_owned(), id);
            }
            self.cities.push(city);
        }
        Ok(())
    }

    fn load_adjacency(&mut self, path: &Path) -> Result<(), WorldError> {
        let text = fs::read_to_string(path).map_err(|source| WorldError::Io {
            path: path.to_owned(),
            source,
        })?;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (zone_part, neighbors_part) =
                line.split_once(':')
                    .ok_or_else(|| WorldError::MalformedAdjacency {
                        path: path.to_owned(),
                        line: idx + 1,
                    })?;
            let zone_id = self.require_zone(zone_part.trim())?;
            for neighbor in neighbors_part.split(',') {
                let neighbor = neighbor.trim();
                if neighbor.is_empty() {
                    continue;
                }
                let neighbor_id = self.require_zone(neighbor)?;
                self.zones[zone_id.index()].add_neighbor(neighbor_id);
            }
        }
        Ok(())
    }

    fn require_zone(&self, name: &str) -> Result<ZoneId, WorldError> {
        self.zone_index
            .get(name)
            .copied()
            .ok_or_else(|| WorldError::UnknownAdjacencyZone {
                name: name.to_owned(),
            })
    }

    fn check_adjacency_symmetry(&self) -> Result<(), WorldError> {
        for zone in &self.zones {
            for &neighbor in zone.neighbors() {
                if !self.zones[neighbor.index()].is_neighbor(zone.id()) {
                    return Err(WorldError::AsymmetricAdjacency {
                        from: zone.name().to_owned(),
                        to: self.zones[neighbor.index()].name().to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn continent(&self, name: ContinentName) -> &Continent {
        &self.continents[name.index()]
    }

    /// The cell behind a handle, in O(1).
    #[inline]
    pub fn location(&self, loc: LocRef) -> &Location {
        self.continents[loc.continent.index()].location(loc.x, loc.y)
    }

    #[inline]
    pub fn location_mut(&mut self, loc: LocRef) -> &mut Location {
        self.continents[loc.continent.index()].location_mut(loc.x, loc.y)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[inline]
    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.index()]
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zone_index.get(name).map(|id| self.zone(*id))
    }

    pub fn is_zone(&self, name: &str) -> bool {
        self.zone_index.contains_key(name)
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    #[inline]
    pub fn city(&self, id: CityId) -> &City {
        &self.cities[id.index()]
    }

    pub fn city_by_name(&self, name: &str) -> Option<&City> {
        self.city_index.get(name).map(|id| self.city(*id))
    }

    pub fn city_id_by_name(&self, name: &str) -> Option<CityId> {
        self.city_index.get(name).copied()
    }

    pub fn zone_id_by_name(&self, name: &str) -> Option<ZoneId> {
        self.zone_index.get(name).copied()
    }

    /// Whether `name` is in the named-city index (`NO NAME` never is).
    pub fn is_city(&self, name: &str) -> bool {
        self.city_index.contains_key(name)
    }

    /// Resolve a scene place name. A named city shadows a zone of the same
    /// name.
    pub fn resolve_place(&self, name: &str) -> Result<PlaceRef, WorldError> {
        if let Some(&city) = self.city_index.get(name) {
            Ok(PlaceRef::City(city))
        } else if let Some(&zone) = self.zone_index.get(name) {
            Ok(PlaceRef::Zone(zone))
        } else {
            Err(WorldError::UnknownPlace {
                name: name.to_owned(),
            })
        }
    }

    /// Empty every location's avatar set (scene reset).
    pub fn reset(&mut self) {
        for continent in &mut self.continents {
            continent.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::AvatarId;
    use crate::scene_rng;

    const ZONES_HEADER: &str = "name,tl_x,tl_y,br_x,br_y,capitals,major cities,minor cities\n";

    fn write_default_maps(dir: &Path) {
        fs::write(
            dir.join("kalimdor.csv"),
            format!(
                "{ZONES_HEADER}\
                 meadow,0,0,10,10,1,1,1\n\
                 ridge,10,0,20,10,0,0,0\n\
                 hollow,20,0,30,10,0,0,0\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("eastern kingdoms.csv"),
            format!("{ZONES_HEADER}marsh,0,0,6,6,0,0,0\n"),
        )
        .unwrap();
        fs::write(dir.join("outland.csv"), ZONES_HEADER).unwrap();
        fs::write(
            dir.join("cities.csv"),
            "name,tl_x,tl_y,zone,type\n\
             harrow,1,1,meadow,capital\n\
             weir,5,5,meadow,minor city\n\
             NO NAME,7,7,meadow,instance\n\
             gable,18,8,ridge,capital\n\
             marsh,5,8,meadow,major city\n",
        )
        .unwrap();
        fs::write(
            dir.join("neighbors.txt"),
            "# adjacency fixture\n\
             meadow: ridge\n\
             ridge: meadow, hollow\n\
             hollow: ridge\n\
             marsh:\n",
        )
        .unwrap();
    }

    fn fixture(config: SimConfig) -> (tempfile::TempDir, World) {
        let dir = tempfile::tempdir().unwrap();
        write_default_maps(dir.path());
        let world = World::load(dir.path(), config).unwrap();
        (dir, world)
    }

    fn kal(x: u32, y: u32) -> LocRef {
        LocRef::new(ContinentName::Kalimdor, x, y)
    }

    #[test]
    fn loads_zones_cities_and_indices() {
        let (_dir, world) = fixture(SimConfig::default());
        assert_eq!(world.zones().len(), 4);
        assert_eq!(world.cities().len(), 5);
        assert!(world.is_zone("meadow"));
        assert!(world.is_zone("marsh"));
        assert!(world.is_city("harrow"));
        assert!(world.is_city("gable"));
        assert!(!world.is_city(NO_NAME));
    }

    #[test]
    fn zone_and_city_back_references_are_set() {
        let (_dir, world) = fixture(SimConfig::default());
        let harrow_id = world.city_id_by_name("harrow").unwrap();
        let harrow = world.city(harrow_id);
        assert_eq!(harrow.bounds(), ((1, 1), (4, 4)));
        for loc in harrow.locations() {
            let cell = world.location(loc);
            assert_eq!(cell.city(), Some(harrow_id));
            assert_eq!(cell.zone(), world.zone_id_by_name("meadow"));
        }
        // a cell outside every city has no city back-reference
        assert!(!world.location(kal(0, 0)).is_city());
        // zone assignment follows the covering rectangle
        let in_hollow = world.location(kal(25, 5));
        assert_eq!(in_hollow.zone(), world.zone_id_by_name("hollow"));
    }

    #[test]
    fn city_footprint_is_clipped_to_zone() {
        let (_dir, world) = fixture(SimConfig::default());
        let gable = world.city_by_name("gable").unwrap();
        assert_eq!(gable.bounds(), ((18, 8), (20, 10)));
    }

    #[test]
    fn named_city_shadows_zone_on_resolve() {
        let (_dir, world) = fixture(SimConfig::default());
        assert!(matches!(
            world.resolve_place("marsh").unwrap(),
            PlaceRef::City(_)
        ));
        assert!(matches!(
            world.resolve_place("meadow").unwrap(),
            PlaceRef::Zone(_)
        ));
        assert!(matches!(
            world.resolve_place("nowhere"),
            Err(WorldError::UnknownPlace { .. })
        ));
    }

    #[test]
    fn adjacency_is_reflexive_and_loaded_both_ways() {
        let (_dir, world) = fixture(SimConfig::default());
        let meadow = world.zone_by_name("meadow").unwrap();
        let ridge = world.zone_by_name("ridge").unwrap();
        let hollow = world.zone_by_name("hollow").unwrap();
        assert!(meadow.is_neighbor(meadow.id()));
        assert!(meadow.is_neighbor(ridge.id()));
        assert!(ridge.is_neighbor(meadow.id()));
        assert!(!meadow.is_neighbor(hollow.id()));
        assert!(!hollow.is_neighbor(meadow.id()));
    }

    #[test]
    fn asymmetric_adjacency_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_default_maps(dir.path());
        fs::write(dir.path().join("neighbors.txt"), "meadow: ridge\n").unwrap();
        let err = World::load(dir.path(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, WorldError::AsymmetricAdjacency { .. }));
    }

    #[test]
    fn unknown_adjacency_zone_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_default_maps(dir.path());
        fs::write(dir.path().join("neighbors.txt"), "meadow: atlantis\n").unwrap();
        let err = World::load(dir.path(), SimConfig::default()).unwrap_err();
        assert!(matches!(err, WorldError::UnknownAdjacencyZone { .. }));
    }

    #[test]
    fn malformed_adjacency_line_reports_its_number() {
        let dir = tempfile::tempdir().unwrap();
        write_default_maps(dir.path());
        fs::write(dir.path().join("neighbors.txt"), "# ok\nmeadow ridge\n").unwrap();
        match World::load(dir.path(), SimConfig::default()) {
            Err(WorldError::MalformedAdjacency { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedAdjacency, got {other:?}"),
        }
    }

    #[test]
    fn city_with_unknown_zone_or_type_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_default_maps(dir.path());
        fs::write(
            dir.path().join("cities.csv"),
            "name,tl_x,tl_y,zone,type\nharrow,1,1,atlantis,capital\n",
        )
        .unwrap();
        assert!(matches!(
            World::load(dir.path(), SimConfig::default()),
            Err(WorldError::UnknownZone { .. })
        ));

        fs::write(
            dir.path().join("cities.csv"),
            "name,tl_x,tl_y,zone,type\nharrow,1,1,meadow,village\n",
        )
        .unwrap();
        assert!(matches!(
            World::load(dir.path(), SimConfig::default()),
            Err(WorldError::UnknownCityType { .. })
        ));
    }

    #[test]
    fn reset_clears_avatar_sets() {
        let (_dir, mut world) = fixture(SimConfig::default());
        world.location_mut(kal(3, 3)).add_avatar(AvatarId(0));
        assert_eq!(world.location(kal(3, 3)).avatars().len(), 1);
        world.reset();
        assert!(world.location(kal(3, 3)).avatars().is_empty());
    }

    #[test]
    fn zone_sampling_with_zero_probabilities_is_uniform_in_rect() {
        let config = SimConfig {
            p_same_city: 0.0,
            p_capital: 0.0,
            p_major_city: 0.0,
            p_minor_city: 0.0,
            p_instance: 0.0,
            ..SimConfig::default()
        };
        let (_dir, world) = fixture(config);
        let meadow = world.zone_by_name("meadow").unwrap();
        let mut rng = scene_rng(5);
        for _ in 0..100 {
            let loc = meadow.random_location(&world, None, &mut rng);
            assert!(meadow.contains(loc.x, loc.y), "{loc} escaped the zone");
        }
    }

    #[test]
    fn certain_capital_branch_always_lands_in_the_capital() {
        let config = SimConfig {
            p_same_city: 0.0,
            p_capital: 1.0,
            ..SimConfig::default()
        };
        let (_dir, world) = fixture(config);
        let meadow = world.zone_by_name("meadow").unwrap();
        let harrow = world.city_by_name("harrow").unwrap();
        let mut rng = scene_rng(5);
        for _ in 0..100 {
            let loc = meadow.random_location(&world, None, &mut rng);
            assert!(harrow.contains(loc.x, loc.y), "{loc} outside the capital");
        }
    }

    #[test]
    fn certain_same_city_branch_keeps_the_avatar_in_its_city() {
        let config = SimConfig {
            p_same_city: 1.0,
            ..SimConfig::default()
        };
        let (_dir, world) = fixture(config);
        let meadow = world.zone_by_name("meadow").unwrap();
        let mut rng = scene_rng(5);
        // (5,5) is the single-cell city "weir"
        for _ in 0..20 {
            let loc = meadow.random_location(&world, Some(kal(5, 5)), &mut rng);
            assert_eq!(loc, kal(5, 5));
        }
    }

    #[test]
    fn same_city_branch_requires_prev_in_this_zone() {
        let config = SimConfig {
            p_same_city: 1.0,
            p_capital: 0.0,
            p_major_city: 0.0,
            p_minor_city: 0.0,
            p_instance: 0.0,
            ..SimConfig::default()
        };
        let (_dir, world) = fixture(config);
        let ridge = world.zone_by_name("ridge").unwrap();
        let mut rng = scene_rng(5);
        // prev is inside meadow's capital, but the sampling zone is ridge:
        // branch 1 must not fire, so the draw is uniform in ridge.
        for _ in 0..50 {
            let loc = ridge.random_location(&world, Some(kal(2, 2)), &mut rng);
            assert!(ridge.contains(loc.x, loc.y));
        }
    }
}
