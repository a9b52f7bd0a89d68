//! The scene simulator: CSV ingestion, the tick driver, and the segment
//! runner.
//!
//! A [`Scene`] is built from `scene<N>.csv` and a loaded
//! [`World`]. Construction fills one place log and one guild log per avatar
//! (appearance order), marking avatars absent from a vtime as offline at the
//! previous vtime. Running then repeats, once per second: step every avatar,
//! merge boundary state, and emit this second's I/O records.
//!
//! Per-scene determinism hinges on draw order (see the crate docs): at a
//! vtime boundary, every avatar's place sampling runs first (avatar order,
//! walk coins included), then every avatar's per-guild write draws.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use wander_world::location::{AvatarId, LocRef};
use wander_world::time::{is_vtime_boundary, MINUTE, MINUTES_IN_VTIME};
use wander_world::world::World;
use wander_world::{scene_rng, SceneRng};

use crate::avatar::Avatar;
use crate::changes::ChangeLog;
use crate::guild::{Guild, GuildId, GuildRoster};
use crate::trace::{self, TraceWriter};
use crate::SimError;

// ---------------------------------------------------------------------------
// Scene CSV rows
// ---------------------------------------------------------------------------

/// One sample of the input dataset: an avatar's place (and guild) for one
/// vtime. `guild == "NO"` means guildless.
#[derive(Debug, serde::Deserialize)]
struct SceneRow {
    virtual_time: i64,
    avatar_id: String,
    place: String,
    guild: String,
}

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

/// Where and how [`Scene::run`] writes its segments.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Parent output directory; segments land in `<output_dir>/Scene<N>/`.
    pub output_dir: PathBuf,
    /// Keep files already present in the scene directory instead of
    /// clearing them.
    pub keep_output: bool,
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One scene's complete simulation state.
#[derive(Debug)]
pub struct Scene {
    number: u32,
    seed: u64,
    world: World,
    avatars: Vec<Avatar>,
    guilds: GuildRoster,
    clock: i64,
    /// Clamped scene length in simulated minutes.
    minutes_len: i64,
    rng: SceneRng,
    /// Absolute tick -> cells first entered at that tick (current vtime
    /// only).
    loc_updates: HashMap<i64, BTreeSet<LocRef>>,
    /// The current vtime's system guild write set.
    guild_writes: BTreeSet<GuildId>,
}

impl Scene {
    /// Load `scene<N>.csv` from `scenes_dir` and build all avatars, guilds,
    /// and change logs.
    ///
    /// The scene seed is the configured seed, or the scene number when no
    /// seed is configured. A configured minute limit longer than the scene
    /// logs a warning and is clamped.
    pub fn load(scenes_dir: &Path, number: u32, world: World) -> Result<Scene, SimError> {
        let path = scenes_dir.join(format!("scene{number}.csv"));
        let mut reader = csv::Reader::from_path(&path).map_err(|source| SimError::Csv {
            path: path.clone(),
            source,
        })?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<SceneRow>() {
            let row = row.map_err(|source| SimError::Csv {
                path: path.clone(),
                source,
            })?;
            if row.virtual_time < 0 {
                return Err(SimError::Schema {
                    path,
                    message: format!(
                        "negative virtual_time {} for avatar '{}'",
                        row.virtual_time, row.avatar_id
                    ),
                });
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(SimError::EmptyScene { path });
        }

        // clamp the scene length to the configured minute limit
        let total_vtime = rows.iter().map(|r| r.virtual_time).max().unwrap_or(0) + 1;
        let scene_minutes = total_vtime * MINUTES_IN_VTIME as i64;
        let minutes_len = match world.config().minutes_limit {
            Some(limit) if limit > scene_minutes => {
                tracing::warn!(
                    scene = number,
                    limit_minutes = limit,
                    scene_minutes,
                    "requested time limit is longer than the scene, using the scene length"
                );
                scene_minutes
            }
            Some(limit) => limit,
            None => scene_minutes,
        };
        let vtime_len = (minutes_len - 1).div_euclid(MINUTES_IN_VTIME as i64) + 1;
        rows.retain(|r| r.virtual_time < vtime_len);

        // avatar and guild arenas, in order of first appearance
        let mut avatar_ids: Vec<String> = Vec::new();
        let mut avatar_index: HashMap<String, AvatarId> = HashMap::new();
        let mut guilds = GuildRoster::new();
        let mut guild_index: HashMap<String, GuildId> = HashMap::new();
        for row in &rows {
            if !avatar_index.contains_key(&row.avatar_id) {
                avatar_index.insert(row.avatar_id.clone(), AvatarId(avatar_ids.len() as u32));
                avatar_ids.push(row.avatar_id.clone());
            }
            if row.guild != "NO" && !guild_index.contains_key(&row.guild) {
                guild_index.insert(row.guild.clone(), guilds.push(Guild::new(&row.guild)));
            }
        }

        // fill the change logs, marking avatars absent from a vtime as
        // offline at the previous vtime
        let mut place_logs: Vec<ChangeLog<_>> =
            avatar_ids.iter().map(|aid| ChangeLog::new(format!("AO_{aid}"))).collect();
        let mut guild_logs: Vec<ChangeLog<_>> =
            avatar_ids.iter().map(|aid| ChangeLog::new(format!("AO_{aid}"))).collect();
        let mut seen = vec![false; avatar_ids.len()];
        let mut last_vtime: i64 = -1;
        for row in &rows {
            if row.virtual_time > last_vtime {
                for (idx, seen_this_vtime) in seen.iter_mut().enumerate() {
                    if !*seen_this_vtime {
                        place_logs[idx].append(last_vtime, None);
                    }
                    *seen_this_vtime = false;
                }
                last_vtime = row.virtual_time;
            }

            let avatar = avatar_index[&row.avatar_id];
            seen[avatar.index()] = true;
            let guild = (row.guild != "NO").then(|| guild_index[&row.guild]);
            guild_logs[avatar.index()].append(row.virtual_time, guild);
            let place = world.resolve_place(&row.place)?;
            place_logs[avatar.index()].append(row.virtual_time, Some(place));
        }
        for (idx, seen_this_vtime) in seen.iter().enumerate() {
            if !*seen_this_vtime {
                place_logs[idx].append(last_vtime, None);
            }
        }

        let avatars: Vec<Avatar> = avatar_ids
            .iter()
            .zip(place_logs.into_iter().zip(guild_logs))
            .map(|(aid, (place_log, guild_log))| Avatar::new(aid, place_log, guild_log))
            .collect();

        let seed = world.config().seed.unwrap_or(number as u64);
        let mut scene = Scene {
            number,
            seed,
            world,
            avatars,
            guilds,
            clock: -1,
            minutes_len,
            rng: scene_rng(seed),
            loc_updates: HashMap::new(),
            guild_writes: BTreeSet::new(),
        };
        scene.reset();
        Ok(scene)
    }

    /// Re-seed the PRNG, clear the world's membership sets, and rewind the
    /// clock. Valid only before any ticks have run.
    pub fn reset(&mut self) {
        self.rng = scene_rng(self.seed);
        self.clock = -1;
        self.world.reset();
        for avatar in &self.avatars {
            assert_eq!(
                avatar.clock(),
                -1,
                "{}: cannot reset a scene that has already ticked",
                avatar.object_id()
            );
        }
    }

    /// Advance the whole scene one second.
    ///
    /// Steps every avatar in insertion order, then, at a vtime boundary,
    /// merges the avatars' path breakpoints and draws the boundary's guild
    /// write set.
    pub fn step(&mut self) {
        let Scene {
            avatars,
            world,
            guilds,
            rng,
            ..
        } = self;
        for (idx, avatar) in avatars.iter_mut().enumerate() {
            avatar.step(AvatarId(idx as u32), world, guilds, rng);
        }
        self.clock += 1;

        if is_vtime_boundary(self.clock) {
            self.merge_breakpoints();
            self.draw_guild_writes();
        }
    }

    /// Merge every avatar's vtime breakpoints into absolute-tick location
    /// update sets.
    fn merge_breakpoints(&mut self) {
        let Scene {
            avatars,
            loc_updates,
            clock,
            ..
        } = self;
        loc_updates.clear();
        for avatar in avatars.iter_mut() {
            for (offset, loc) in avatar.take_breakpoints() {
                loc_updates
                    .entry(*clock + offset as i64)
                    .or_default()
                    .insert(loc);
            }
        }
    }

    /// Draw this boundary's guild write set.
    ///
    /// Each recorded transition includes its guild with probability
    /// `|members| / |avatars|`, unconditionally at clock 0. The set is
    /// retained for the vtime and joins every tick's system writes.
    fn draw_guild_writes(&mut self) {
        let Scene {
            avatars,
            guilds,
            rng,
            guild_writes,
            clock,
            ..
        } = self;
        guild_writes.clear();
        let population = avatars.len() as f64;
        for avatar in avatars.iter() {
            for &guild in avatar.guild_updates() {
                let share = guilds.get(guild).members().len() as f64 / population;
                let draw = rng.gen::<f64>();
                if draw < share || *clock == 0 {
                    guild_writes.insert(guild);
                }
            }
        }
    }

    /// Emit this second's records: system writes first (when enabled), then
    /// every avatar's read set, written to `out` in one call.
    pub fn generate_io<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let include_writes = self.world.config().include_writes;
        let mut buf = String::new();
        if include_writes {
            self.emit_system_writes(&mut buf);
        }
        for (idx, avatar) in self.avatars.iter().enumerate() {
            avatar.generate_io(
                AvatarId(idx as u32),
                &self.world,
                &self.guilds,
                &self.avatars,
                include_writes,
                &mut buf,
            );
        }
        out.write_all(buf.as_bytes())
    }

    /// System writes for this second: cells first entered now, plus the
    /// vtime's guild write set.
    fn emit_system_writes(&self, out: &mut String) {
        if let Some(cells) = self.loc_updates.get(&self.clock) {
            for cell in cells {
                let _ = writeln!(out, "sys, {}.0, {cell}, WRITE", self.clock);
            }
        }
        for &guild in &self.guild_writes {
            let _ = writeln!(
                out,
                "sys, {}.0, {}, WRITE",
                self.clock,
                self.guilds.get(guild).object_id()
            );
        }
    }

    /// Run the scene to its clamped length, writing ten-minute segments
    /// under `<output_dir>/Scene<N>/`.
    pub fn run(&mut self, options: &RunOptions) -> Result<(), SimError> {
        self.run_with_progress(options, |_| {})
    }

    /// [`run`](Self::run), reporting completed minutes after each segment.
    pub fn run_with_progress(
        &mut self,
        options: &RunOptions,
        mut progress: impl FnMut(i64),
    ) -> Result<(), SimError> {
        self.reset();

        let scene_dir = options.output_dir.join(format!("Scene{}", self.number));
        fs::create_dir_all(&scene_dir).map_err(|source| SimError::Io {
            path: scene_dir.clone(),
            source,
        })?;
        if !options.keep_output {
            clear_files(&scene_dir)?;
        }

        let compression = self.world.config().compression;
        let pad = (self.minutes_len - 1).max(0).to_string().len();
        let mut start = 0i64;
        while start < self.minutes_len {
            let end = (start + MINUTES_IN_VTIME as i64).min(self.minutes_len);
            let path = scene_dir.join(trace::segment_file_name(
                self.number,
                start,
                end - 1,
                pad,
                compression,
            ));
            let mut writer =
                TraceWriter::create(&path, compression).map_err(|source| SimError::Output {
                    path: path.clone(),
                    source,
                })?;
            for _ in start * MINUTE as i64..end * MINUTE as i64 {
                self.step();
                self.generate_io(&mut writer)
                    .map_err(|source| SimError::Output {
                        path: path.clone(),
                        source,
                    })?;
            }
            writer.finish().map_err(|source| SimError::Output {
                path: path.clone(),
                source,
            })?;
            progress(end - start);
            start = end;
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The clamped scene length in simulated minutes.
    pub fn minutes(&self) -> i64 {
        self.minutes_len
    }

    pub fn clock(&self) -> i64 {
        self.clock
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// All avatars, in scene-CSV appearance order.
    pub fn avatars(&self) -> &[Avatar] {
        &self.avatars
    }

    pub fn guilds(&self) -> &GuildRoster {
        &self.guilds
    }

    /// The current vtime's system guild write set.
    pub fn guild_writes(&self) -> &BTreeSet<GuildId> {
        &self.guild_writes
    }
}

/// Remove the plain files inside `dir`, leaving subdirectories alone.
fn clear_files(dir: &Path) -> Result<(), SimError> {
    let entries = fs::read_dir(dir).map_err(|source| SimError::Io {
        path: dir.to_owned(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| SimError::Io {
            path: dir.to_owned(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|source| SimError::Io { path, source })?;
        }
    }
    Ok(())
}
