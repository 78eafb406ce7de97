use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Size and line count of a log file on disk
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    pub size: u64,
    pub lines: usize,
}

impl FileStats {
    /// Scan the whole file, counting newline-delimited lines
    ///
    /// A trailing fragment without a newline still counts as a line.
    pub fn collect(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut lines = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lines += 1;
        }

        Ok(Self { size, lines })
    }

    /// Size formatted with two decimals in B, KB, MB or GB
    pub fn human_size(&self) -> String {
        human_size(self.size)
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    for unit in &UNITS[..UNITS.len() - 1] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} {}", UNITS[UNITS.len() - 1])
}
