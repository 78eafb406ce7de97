use regex::{Regex, RegexBuilder};

use kodiscope_types::{FilterSpec, LevelSelection, LogLevel};

/// Compiled filter for log lines
#[derive(Clone)]
pub struct CompiledFilter {
    /// Severity selection
    levels: LevelSelection,

    /// Lowercased search query (empty = no restriction)
    query: String,

    /// Lowercased keywords (empty = no restriction)
    keywords: Vec<String>,

    /// Case-insensitive alternation of all keywords, for highlighting
    highlight: Option<Regex>,
}

impl CompiledFilter {
    /// Compile a filter from the user's filter settings
    pub fn new(spec: &FilterSpec) -> Self {
        let keywords: Vec<String> = spec
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            levels: spec.levels.clone(),
            query: spec.query.to_lowercase(),
            highlight: build_highlighter(&keywords),
            keywords,
        }
    }

    /// Filter that passes every non-blank line
    pub fn pass_all() -> Self {
        Self::new(&FilterSpec::pass_all())
    }

    /// Check if a line passes this filter
    pub fn matches(&self, text: &str, level: LogLevel) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        if !self.levels.allows(level) {
            return false;
        }

        if self.query.is_empty() && self.keywords.is_empty() {
            return true;
        }

        let lower = text.to_lowercase();

        if !self.query.is_empty() && !lower.contains(&self.query) {
            return false;
        }

        self.keywords.is_empty() || self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Find all keyword match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.highlight {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("levels", &self.levels)
            .field("query", &self.query)
            .field("keywords", &self.keywords.len())
            .finish()
    }
}

fn build_highlighter(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }

    // Longest first so overlapping keywords highlight the widest hit
    let mut sorted: Vec<&str> = keywords.iter().map(String::as_str).collect();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let pattern = sorted
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "keyword highlighter could not be built");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(levels: &[LogLevel]) -> FilterSpec {
        FilterSpec::pass_all().with_levels(LevelSelection::only(levels.iter().copied()))
    }

    #[test]
    fn test_pass_all_accepts_unclassified() {
        let filter = CompiledFilter::pass_all();
        assert!(filter.matches("plain text", LogLevel::Unclassified));
        assert!(filter.find_matches("plain text").is_empty());
    }

    #[test]
    fn test_blank_lines_never_pass() {
        let filter = CompiledFilter::pass_all();
        assert!(!filter.matches("", LogLevel::Unclassified));
        assert!(!filter.matches("   \t", LogLevel::Unclassified));
    }

    #[test]
    fn test_level_filter() {
        let filter = CompiledFilter::new(&only(&[LogLevel::Error]));
        assert!(filter.matches("x error y", LogLevel::Error));
        assert!(!filter.matches("x info y", LogLevel::Info));
        assert!(!filter.matches("unclassified", LogLevel::Unclassified));
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let filter = CompiledFilter::new(&FilterSpec::pass_all().with_query("PVR"));
        assert!(filter.matches("starting pvr manager", LogLevel::Unclassified));
        assert!(!filter.matches("starting video library", LogLevel::Unclassified));
    }

    #[test]
    fn test_keyword_allow_list() {
        let spec = FilterSpec::pass_all().with_keywords(vec!["Python".into(), "addon".into()]);
        let filter = CompiledFilter::new(&spec);
        assert!(filter.matches("loading PYTHON interpreter", LogLevel::Info));
        assert!(filter.matches("ADDON updated", LogLevel::Info));
        assert!(!filter.matches("skin reloaded", LogLevel::Info));
    }

    #[test]
    fn test_blank_keywords_do_not_restrict() {
        let spec = FilterSpec::pass_all().with_keywords(vec!["  ".into(), String::new()]);
        let filter = CompiledFilter::new(&spec);
        assert!(filter.matches("anything", LogLevel::Unclassified));
        assert!(filter.find_matches("anything").is_empty());
    }

    #[test]
    fn test_all_clauses_combine() {
        let spec = only(&[LogLevel::Warning])
            .with_query("cache")
            .with_keywords(vec!["texture".into()]);
        let filter = CompiledFilter::new(&spec);
        assert!(filter.matches("x warning texture cache full", LogLevel::Warning));
        assert!(!filter.matches("x warning cache full", LogLevel::Warning));
        assert!(!filter.matches("x error texture cache full", LogLevel::Error));
    }

    #[test]
    fn test_find_keyword_matches() {
        let spec = FilterSpec::pass_all().with_keywords(vec!["err".into(), "a.b".into()]);
        let filter = CompiledFilter::new(&spec);
        let matches = filter.find_matches("ERR one, a.b two, axb three, err four");
        assert_eq!(matches, vec![(0, 3), (9, 12), (29, 32)]);
    }
}
