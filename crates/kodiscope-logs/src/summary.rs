use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Dashed banner block that Kodi prints at startup
static STARTUP_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)(-+\n.*?Starting Kodi.*?-+\n)").ok());

/// The last startup banner in `content`, if any
pub fn extract_system_summary(content: &str) -> Option<String> {
    let re = STARTUP_BLOCK.as_ref()?;
    re.captures_iter(content)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read a log file and extract its last startup banner
pub fn read_system_summary(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let bytes = fs::read(path)?;
    Ok(extract_system_summary(&String::from_utf8_lossy(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "\
2024-01-01 10:00:00.000 T:1 info <general>: -----------------------------------\n\
2024-01-01 10:00:00.001 T:1 info <general>: Starting Kodi (21.0). Platform: Linux x86 64-bit\n\
2024-01-01 10:00:00.002 T:1 info <general>: Using Release Kodi x64\n\
2024-01-01 10:00:00.003 T:1 info <general>: -----------------------------------\n";

    #[test]
    fn test_no_banner() {
        assert_eq!(extract_system_summary("just\nsome\nlines\n"), None);
    }

    #[test]
    fn test_single_banner() {
        let content = format!("before\n{BANNER}after info line\n");
        let summary = extract_system_summary(&content).unwrap();
        assert!(summary.contains("Starting Kodi (21.0)"));
        assert!(summary.contains("Using Release"));
        assert!(!summary.contains("after info line"));
    }

    #[test]
    fn test_last_banner_wins() {
        let second = BANNER.replace("21.0", "21.1");
        let content = format!("{BANNER}middle\n{second}");
        let summary = extract_system_summary(&content).unwrap();
        assert!(summary.contains("21.1"));
        assert!(!summary.contains("21.0"));
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kodi.log");
        fs::write(&path, BANNER).unwrap();
        assert!(read_system_summary(&path).unwrap().is_some());
        assert!(read_system_summary(dir.path().join("nope.log")).is_err());
    }
}
