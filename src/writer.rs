//! Output sinks: stdout or size-capped shard files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size caps applied to sharded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLimits {
    /// Bytes a shard may hold before the next record opens a new file.
    pub max_shard_bytes: u64,
    /// Files per numbered directory.
    pub max_files_per_directory: u32,
}

impl Default for ShardLimits {
    fn default() -> Self {
        Self {
            max_shard_bytes: 20 * 1024,
            max_files_per_directory: 100,
        }
    }
}

/// Position of the shard currently being written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardState {
    /// Numbered directory under the output root.
    pub directory_index: u32,
    /// File number inside that directory.
    pub file_index: u32,
    /// Bytes written to the current file, newlines included.
    pub bytes_written: u64,
}

/// Destination for rendered records, one per line.
pub trait RecordSink {
    /// Appends one record followed by a newline.
    fn write_record(&mut self, record: &str) -> io::Result<()>;

    /// Flushes buffered output after each delivered result.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Flushes and closes the sink.
    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Writes records into `{root}/{dir:04}/wiki_{file:04}.{ext}` shards.
///
/// Files are opened lazily, so a run without records leaves no shard behind.
#[derive(Debug)]
pub struct RotatingWriter {
    root: PathBuf,
    extension: &'static str,
    limits: ShardLimits,
    state: ShardState,
    current: Option<BufWriter<File>>,
}

impl RotatingWriter {
    /// Creates a writer rooted at `root`. `extension` is the shard file suffix.
    pub fn new(root: impl Into<PathBuf>, extension: &'static str, limits: ShardLimits) -> Self {
        Self {
            root: root.into(),
            extension,
            limits,
            state: ShardState::default(),
            current: None,
        }
    }

    /// Current shard position.
    pub fn state(&self) -> ShardState {
        self.state
    }

    /// Path of the shard at the current position.
    pub fn current_path(&self) -> PathBuf {
        shard_path(&self.root, &self.state, self.extension)
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
        }
        self.state.file_index += 1;
        if self.state.file_index >= self.limits.max_files_per_directory.max(1) {
            self.state.directory_index += 1;
            self.state.file_index = 0;
        }
        self.state.bytes_written = 0;
        Ok(())
    }

    fn open_current(&mut self) -> io::Result<&mut BufWriter<File>> {
        let file = match self.current.take() {
            Some(file) => file,
            None => {
                let path = self.current_path();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                debug!(path = %path.display(), "opening shard");
                BufWriter::new(File::create(&path)?)
            }
        };
        Ok(self.current.insert(file))
    }
}

impl RecordSink for RotatingWriter {
    fn write_record(&mut self, record: &str) -> io::Result<()> {
        let len = record.len() as u64 + 1;
        if self.state.bytes_written > 0
            && self.state.bytes_written + len > self.limits.max_shard_bytes
        {
            self.rotate()?;
        }
        let file = self.open_current()?;
        file.write_all(record.as_bytes())?;
        file.write_all(b"\n")?;
        self.state.bytes_written += len;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Shard file path for a given position.
pub fn shard_path(root: &Path, state: &ShardState, extension: &str) -> PathBuf {
    root.join(format!("{:04}", state.directory_index))
        .join(format!("wiki_{:04}.{extension}", state.file_index))
}

/// Where the reducer sends rendered records.
#[derive(Debug)]
pub enum OutputSink {
    /// Unsharded output on standard output.
    Stdout(BufWriter<Stdout>),
    /// Rotating shard files.
    Shards(RotatingWriter),
}

impl OutputSink {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::Stdout(BufWriter::new(io::stdout()))
    }
}

impl RecordSink for OutputSink {
    fn write_record(&mut self, record: &str) -> io::Result<()> {
        match self {
            Self::Stdout(out) => {
                out.write_all(record.as_bytes())?;
                out.write_all(b"\n")
            }
            Self::Shards(writer) => writer.write_record(record),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::Shards(writer) => writer.flush(),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::Shards(writer) => writer.finish(),
        }
    }
}

impl RecordSink for Vec<String> {
    fn write_record(&mut self, record: &str) -> io::Result<()> {
        self.push(record.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn crossing_record_starts_next_file() {
        let dir = tempfile::tempdir().unwrap();
        let limits = ShardLimits {
            max_shard_bytes: 10,
            max_files_per_directory: 100,
        };
        let mut writer = RotatingWriter::new(dir.path(), "jsonl", limits);
        for record in ["aaaa", "bbbb", "cc"] {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(read(dir.path().join("0000/wiki_0000.jsonl")), "aaaa\nbbbb\n");
        assert_eq!(read(dir.path().join("0000/wiki_0001.jsonl")), "cc\n");
        assert_eq!(
            writer.state(),
            ShardState {
                directory_index: 0,
                file_index: 1,
                bytes_written: 3
            }
        );
    }

    #[test]
    fn oversized_record_gets_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let limits = ShardLimits {
            max_shard_bytes: 4,
            max_files_per_directory: 100,
        };
        let mut writer = RotatingWriter::new(dir.path(), "txt", limits);
        for record in ["a", "much too long", "b"] {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(read(dir.path().join("0000/wiki_0000.txt")), "a\n");
        assert_eq!(
            read(dir.path().join("0000/wiki_0001.txt")),
            "much too long\n"
        );
        assert_eq!(read(dir.path().join("0000/wiki_0002.txt")), "b\n");
    }

    #[test]
    fn full_directory_rolls_over() {
        let dir = tempfile::tempdir().unwrap();
        let limits = ShardLimits {
            max_shard_bytes: 1,
            max_files_per_directory: 2,
        };
        let mut writer = RotatingWriter::new(dir.path(), "jsonl", limits);
        for record in ["1", "2", "3"] {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(read(dir.path().join("0000/wiki_0000.jsonl")), "1\n");
        assert_eq!(read(dir.path().join("0000/wiki_0001.jsonl")), "2\n");
        assert_eq!(read(dir.path().join("0001/wiki_0000.jsonl")), "3\n");
    }

    #[test]
    fn no_records_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let mut writer = RotatingWriter::new(&root, "jsonl", ShardLimits::default());
        writer.finish().unwrap();
        assert!(!root.exists());
    }
}
