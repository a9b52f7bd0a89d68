//! Trace segment files: writers, readers, and segment naming.
//!
//! Output is grouped into ten-minute segments named
//! `scene<N>_<start>-<last>.txt[.gz]`, with the minute numbers left-padded
//! to the width of the scene's last minute. The gzip side is optional and
//! driven by the configured compression level.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Segment file extension for a compression setting.
pub fn extension(compression: Option<u32>) -> &'static str {
    if compression.is_some() {
        "txt.gz"
    } else {
        "txt"
    }
}

/// Segment file name for minutes `[start, last]` (inclusive).
pub fn segment_file_name(
    scene: u32,
    start_minute: i64,
    last_minute: i64,
    pad: usize,
    compression: Option<u32>,
) -> String {
    format!(
        "scene{scene}_{start_minute:0pad$}-{last_minute:0pad$}.{}",
        extension(compression)
    )
}

/// Parse `(start, last)` minutes out of a segment file name.
///
/// Returns `None` for files that do not follow the `scene<N>_` naming.
pub fn parse_segment_minutes(file_name: &str, scene: u32) -> Option<(i64, i64)> {
    let rest = file_name.strip_prefix(&format!("scene{scene}_"))?;
    let (range, _ext) = rest.split_once('.')?;
    let (start, last) = range.split_once('-')?;
    Some((start.parse().ok()?, last.parse().ok()?))
}

// ---------------------------------------------------------------------------
// TraceWriter
// ---------------------------------------------------------------------------

/// A buffered segment writer, plain or gzip.
pub enum TraceWriter {
    Plain(BufWriter<File>),
    Gzip(Box<GzEncoder<BufWriter<File>>>),
}

impl TraceWriter {
    /// Create (truncate) the segment file at `path`.
    pub fn create(path: &Path, compression: Option<u32>) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match compression {
            Some(level) => TraceWriter::Gzip(Box::new(GzEncoder::new(
                file,
                Compression::new(level),
            ))),
            None => TraceWriter::Plain(file),
        })
    }

    /// Flush buffers and, for gzip, write the stream trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            TraceWriter::Plain(mut writer) => writer.flush(),
            TraceWriter::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for TraceWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceWriter::Plain(writer) => writer.write(buf),
            TraceWriter::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceWriter::Plain(writer) => writer.flush(),
            TraceWriter::Gzip(encoder) => encoder.flush(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Open a trace segment for line reading, transparently gunzipping `.gz`
/// files.
pub fn open_trace(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(
            file,
        )))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
