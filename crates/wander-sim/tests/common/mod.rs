//! Shared on-disk fixtures for the simulator integration tests.
//!
//! The fixture world has three kalimdor zones -- `meadow` and `ridge` are
//! adjacent, `hollow` is reachable from `meadow` only by portal -- plus a few
//! single-cell minor cities that make avatar placement fully deterministic
//! regardless of PRNG draws:
//!
//! - `mono` at (5,5) in `meadow`
//! - `lone` at (12,3) in `ridge`
//! - `solo` at (25,5) in `hollow`

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use wander_sim::scene::Scene;
use wander_world::config::SimConfig;
use wander_world::continent::ContinentName;
use wander_world::location::LocRef;
use wander_world::world::World;

pub const ZONES_HEADER: &str = "name,tl_x,tl_y,br_x,br_y,capitals,major cities,minor cities\n";

/// A scene CSV row: `(virtual_time, avatar_id, place, guild)`.
pub type SceneRow<'a> = (i64, &'a str, &'a str, &'a str);

pub struct Fixture {
    pub tmp: tempfile::TempDir,
    pub maps_dir: PathBuf,
    pub scenes_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let maps_dir = tmp.path().join("Maps");
        let scenes_dir = tmp.path().join("Scenes");
        let output_dir = tmp.path().join("IOs");
        fs::create_dir_all(&maps_dir).unwrap();
        fs::create_dir_all(&scenes_dir).unwrap();
        write_maps(&maps_dir);
        Fixture {
            tmp,
            maps_dir,
            scenes_dir,
            output_dir,
        }
    }

    pub fn world(&self, config: SimConfig) -> World {
        World::load(&self.maps_dir, config).unwrap()
    }

    pub fn write_scene(&self, number: u32, rows: &[SceneRow<'_>]) {
        let mut csv = String::from("virtual_time,avatar_id,place,guild\n");
        for (vtime, avatar, place, guild) in rows {
            csv.push_str(&format!("{vtime},{avatar},{place},{guild}\n"));
        }
        fs::write(self.scenes_dir.join(format!("scene{number}.csv")), csv).unwrap();
    }

    pub fn scene(&self, number: u32, config: SimConfig) -> Scene {
        Scene::load(&self.scenes_dir, number, self.world(config)).unwrap()
    }
}

fn write_maps(maps_dir: &Path) {
    fs::write(
        maps_dir.join("kalimdor.csv"),
        format!(
            "{ZONES_HEADER}\
             meadow,0,0,10,10,1,0,1\n\
             ridge,10,0,20,10,0,0,1\n\
             hollow,20,0,30,10,0,0,1\n"
        ),
    )
    .unwrap();
    fs::write(
        maps_dir.join("eastern kingdoms.csv"),
        format!("{ZONES_HEADER}marsh,0,0,6,6,0,0,0\n"),
    )
    .unwrap();
    fs::write(maps_dir.join("outland.csv"), ZONES_HEADER).unwrap();
    fs::write(
        maps_dir.join("cities.csv"),
        "name,tl_x,tl_y,zone,type\n\
         harrow,1,1,meadow,capital\n\
         mono,5,5,meadow,minor city\n\
         lone,12,3,ridge,minor city\n\
         solo,25,5,hollow,minor city\n",
    )
    .unwrap();
    fs::write(
        maps_dir.join("neighbors.txt"),
        "# fixture adjacency\n\
         meadow: ridge\n\
         ridge: meadow, hollow\n\
         hollow: ridge\n\
         marsh:\n",
    )
    .unwrap();
}

/// Advance one tick and return its emitted records.
pub fn tick(scene: &mut Scene) -> String {
    scene.step();
    let mut out = Vec::new();
    scene.generate_io(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// Advance one tick and return its records split into lines.
pub fn tick_lines(scene: &mut Scene) -> Vec<String> {
    tick(scene).lines().map(str::to_owned).collect()
}

pub fn kal(x: u32, y: u32) -> LocRef {
    LocRef::new(ContinentName::Kalimdor, x, y)
}

pub const MONO: (u32, u32) = (5, 5);
pub const LONE: (u32, u32) = (12, 3);
pub const SOLO: (u32, u32) = (25, 5);
