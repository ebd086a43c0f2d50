//! Line splitting of gzip-compressed dumps into indexed raw records.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// One well-formed dump line, tagged with its position among kept lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 0-based index among well-formed lines; the ordering key downstream.
    pub source_index: u64,
    /// Line bytes from the first `{`, without the line terminator.
    pub payload: Vec<u8>,
}

/// Iterator over the JSON lines of a dump.
///
/// Lines without a `{` are dropped (and counted) without consuming an index.
/// Anything before the first `{` is cut, which skips tar headers glued to the
/// first record of `.json.tar.gz` dumps.
pub struct DumpReader<R> {
    inner: R,
    buf: Vec<u8>,
    next_index: u64,
    line_number: u64,
    skipped: u64,
}

/// Reader over a gzip-compressed dump file.
pub type GzDumpReader = DumpReader<BufReader<MultiGzDecoder<File>>>;

impl GzDumpReader {
    /// Opens a gzip-compressed dump.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(DumpReader::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}

impl<R: BufRead> DumpReader<R> {
    /// Wraps an already-decoded line source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            next_index: 0,
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines dropped so far for lacking a JSON object.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Records handed out so far.
    pub fn records_read(&self) -> u64 {
        self.next_index
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = io::Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }
            self.line_number += 1;

            let Some(start) = self.buf.iter().position(|&byte| byte == b'{') else {
                self.skipped += 1;
                warn!(line = self.line_number, "dropping line without a JSON object");
                continue;
            };

            let record = RawRecord {
                source_index: self.next_index,
                payload: trim_line_end(&self.buf[start..]).to_vec(),
            };
            self.next_index += 1;
            return Some(Ok(record));
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&byte| byte != b'\n' && byte != b'\r')
        .map_or(0, |pos| pos + 1);
    &line[..end]
}
