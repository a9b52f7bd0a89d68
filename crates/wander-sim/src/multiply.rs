//! Trace multiplication: scale up the I/O rate of an already generated
//! scene.
//!
//! Each record of every segment is replicated `factor` times with a fresh
//! fractional-second offset, then each second is re-sorted by timestamp so
//! the multiplied trace stays time-ordered. Output lands next to the
//! originals as `multiplied-<factor>-<segment name>`, with six-decimal
//! timestamps. An optional avatar filter keeps only the named devices.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, Write as _};
use std::path::{Path, PathBuf};

use rand::Rng;
use wander_world::{scene_rng, SceneRng};

use crate::trace::{self, TraceWriter};
use crate::SimError;

// ---------------------------------------------------------------------------
// MultiplyOptions
// ---------------------------------------------------------------------------

/// Parameters of a multiplication run.
#[derive(Debug, Clone)]
pub struct MultiplyOptions {
    /// Directory holding `Scene<N>/` trace folders.
    pub input_dir: PathBuf,
    /// Directory to write `Scene<N>/multiplied-*` segments into (may equal
    /// `input_dir`).
    pub output_dir: PathBuf,
    /// How many copies to make of each record.
    pub factor: u32,
    /// Seed for the fractional-second jitter.
    pub seed: u64,
    /// Gzip level for the multiplied segments; `None` writes plain text.
    pub compression: Option<u32>,
    /// Raw avatar ids to keep (`None` keeps every device).
    pub avatars: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Trace records
// ---------------------------------------------------------------------------

/// A parsed trace line: `device, time, object, op`.
#[derive(Debug, Clone)]
struct TraceRecord {
    device: String,
    time: f64,
    object: String,
    op: String,
}

fn parse_record(line: &str) -> Option<TraceRecord> {
    let mut parts = line.splitn(4, ", ");
    let device = parts.next()?.to_owned();
    let time: f64 = parts.next()?.parse().ok()?;
    let object = parts.next()?.to_owned();
    let op = parts.next()?.to_owned();
    Some(TraceRecord {
        device,
        time,
        object,
        op,
    })
}

// ---------------------------------------------------------------------------
// Segment discovery
// ---------------------------------------------------------------------------

/// The scene's segment file names, sorted by start minute.
fn segment_files(scene_dir: &Path, scene: u32) -> Result<Vec<(i64, i64, String)>, SimError> {
    let entries = fs::read_dir(scene_dir).map_err(|source| SimError::Io {
        path: scene_dir.to_owned(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SimError::Io {
            path: scene_dir.to_owned(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((start, last)) = trace::parse_segment_minutes(name, scene) {
            files.push((start, last, name.to_owned()));
        }
    }
    files.sort_by_key(|(start, _, _)| *start);
    Ok(files)
}

/// Recover a generated scene's length in minutes from its segment names.
pub fn scene_length_minutes(input_dir: &Path, scene: u32) -> Result<i64, SimError> {
    let scene_dir = input_dir.join(format!("Scene{scene}"));
    let files = segment_files(&scene_dir, scene)?;
    Ok(files.iter().map(|(_, last, _)| last + 1).max().unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Multiplication
// ---------------------------------------------------------------------------

/// Multiply one scene's trace.
pub fn multiply_scene(scene: u32, options: &MultiplyOptions) -> Result<(), SimError> {
    multiply_scene_with_progress(scene, options, |_| {})
}

/// [`multiply_scene`], reporting completed input minutes as it goes.
pub fn multiply_scene_with_progress(
    scene: u32,
    options: &MultiplyOptions,
    mut progress: impl FnMut(i64),
) -> Result<(), SimError> {
    let mut rng = scene_rng(options.seed);
    let in_dir = options.input_dir.join(format!("Scene{scene}"));
    let out_dir = options.output_dir.join(format!("Scene{scene}"));
    fs::create_dir_all(&out_dir).map_err(|source| SimError::Io {
        path: out_dir.clone(),
        source,
    })?;

    let files = segment_files(&in_dir, scene)?;
    if files.is_empty() {
        return Err(SimError::NoSegments {
            scene,
            path: in_dir,
        });
    }

    let device_filter: Option<HashSet<String>> = options
        .avatars
        .as_ref()
        .map(|ids| ids.iter().map(|aid| format!("A_{aid}")).collect());
    let ext = trace::extension(options.compression);

    let mut seconds_done: i64 = 0;
    for (_, _, name) in files {
        let in_path = in_dir.join(&name);
        let stem = name.split('.').next().unwrap_or(&name);
        let out_path = out_dir.join(format!("multiplied-{}-{stem}.{ext}", options.factor));
        let mut writer = TraceWriter::create(&out_path, options.compression).map_err(|source| {
            SimError::Output {
                path: out_path.clone(),
                source,
            }
        })?;

        let reader = trace::open_trace(&in_path).map_err(|source| SimError::Io {
            path: in_path.clone(),
            source,
        })?;
        let mut second: Vec<TraceRecord> = Vec::new();
        let mut current: Option<f64> = None;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| SimError::Io {
                path: in_path.clone(),
                source,
            })?;
            if line.is_empty() {
                continue;
            }
            let record = parse_record(&line).ok_or_else(|| SimError::MalformedTrace {
                path: in_path.clone(),
                line: lineno + 1,
            })?;

            if current.is_none() {
                current = Some(record.time);
            }
            if record.time > current.unwrap_or(record.time) {
                write_multiplied(&second, options.factor, &mut rng, &mut writer).map_err(
                    |source| SimError::Output {
                        path: out_path.clone(),
                        source,
                    },
                )?;
                second.clear();
                current = current.map(|t| t + 1.0);
                seconds_done += 1;
                if seconds_done % 60 == 0 {
                    progress(1);
                }
            }

            let keep = device_filter
                .as_ref()
                .map_or(true, |filter| filter.contains(&record.device));
            if keep {
                second.push(record);
            }
        }
        write_multiplied(&second, options.factor, &mut rng, &mut writer).map_err(|source| {
            SimError::Output {
                path: out_path.clone(),
                source,
            }
        })?;
        seconds_done += 1;
        if seconds_done % 60 == 0 {
            progress(1);
        }

        writer.finish().map_err(|source| SimError::Output {
            path: out_path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Replicate one second's records with fractional jitter, sort by timestamp
/// (stably, so equal times keep input order), and write them out.
fn write_multiplied(
    records: &[TraceRecord],
    factor: u32,
    rng: &mut SceneRng,
    writer: &mut TraceWriter,
) -> std::io::Result<()> {
    let mut multiplied: Vec<(f64, &TraceRecord)> =
        Vec::with_capacity(records.len() * factor as usize);
    for record in records {
        for _ in 0..factor {
            multiplied.push((record.time + rng.gen::<f64>(), record));
        }
    }
    multiplied.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (time, record) in multiplied {
        writeln!(
            writer,
            "{}, {time:.6}, {}, {}",
            record.device, record.object, record.op
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parsing() {
        let record = parse_record("A_0, 42.0, AO_226, READ").unwrap();
        assert_eq!(record.device, "A_0");
        assert_eq!(record.time, 42.0);
        assert_eq!(record.object, "AO_226");
        assert_eq!(record.op, "READ");
        assert!(parse_record("A_0, not-a-time, AO_226, READ").is_none());
        assert!(parse_record("A_0, 42.0, AO_226").is_none());
    }
}
