//! Decides which filesystem entries the walker skips.
//!
//! Two independent rules apply. Directories whose full path matches any
//! exclusion regex are pruned. Separately, entries whose own name looks
//! hidden or temporary (`.x`, `#x`, `~x`, `x~`) are always skipped, even when
//! no patterns are configured.

use std::path::Path;

use regex::Regex;

use crate::config::ConfigError;

/// Always excluded: VCS metadata, dependency and build output trees,
/// virtualenvs, the index's own artifacts and the Go module cache.
pub const BASELINE_PATTERNS: &[&str] = &[
    r"/\.git$",
    r"/node_modules",
    r"/bazel-(bin|out|testlogs)",
    r"/venv",
    r"/\.csearchindex",
    r"/go/pkg/mod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// Index into [`ExclusionFilter::patterns`].
    Pattern(usize),
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    SkipEntry(Cause),
    SkipSubtree(Cause),
}

impl Decision {
    pub fn is_include(&self) -> bool {
        matches!(self, Decision::Include)
    }
}

#[derive(Debug, Clone)]
pub struct ExcludePattern {
    source: String,
    regex: Regex,
}

impl ExcludePattern {
    pub fn compile(source: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(source).map_err(|err| ConfigError::InvalidExcludePattern {
            pattern: source.to_string(),
            source: err,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<ExcludePattern>,
}

impl ExclusionFilter {
    /// Compiles the baseline followed by `extra`. Any invalid pattern fails
    /// the whole filter.
    pub fn new(extra: &[String]) -> Result<Self, ConfigError> {
        let patterns = BASELINE_PATTERNS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(ExcludePattern::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// A filter with no patterns; only the hidden-name rule applies.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[ExcludePattern] {
        &self.patterns
    }

    pub fn classify(&self, path: &Path, is_dir: bool) -> Decision {
        if is_dir {
            if let Some(idx) = self.matching_pattern(path) {
                return Decision::SkipSubtree(Cause::Pattern(idx));
            }
        }

        let hidden = path
            .file_name()
            .map(|name| is_hidden_name(&name.to_string_lossy()))
            .unwrap_or(false);
        match (hidden, is_dir) {
            (false, _) => Decision::Include,
            (true, true) => Decision::SkipSubtree(Cause::Hidden),
            (true, false) => Decision::SkipEntry(Cause::Hidden),
        }
    }

    pub fn matching_pattern(&self, path: &Path) -> Option<usize> {
        let text = path.to_string_lossy();
        self.patterns.iter().position(|p| p.is_match(&text))
    }

    pub fn describe(&self, cause: Cause) -> &str {
        match cause {
            Cause::Pattern(idx) => self
                .patterns
                .get(idx)
                .map(ExcludePattern::source)
                .unwrap_or("<unknown pattern>"),
            Cause::Hidden => "hidden or temporary name",
        }
    }
}

fn is_hidden_name(name: &str) -> bool {
    name.starts_with(['.', '#', '~']) || name.ends_with('~')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ExclusionFilter {
        ExclusionFilter::new(&[]).expect("baseline compiles")
    }

    #[test]
    fn baseline_prunes_dependency_directories() {
        let f = filter();
        for dir in [
            "/src/app/node_modules",
            "/src/app/node_modules/left-pad",
            "/src/ws/bazel-out",
            "/src/py/venv",
            "/home/u/go/pkg/mod",
        ] {
            assert!(
                matches!(
                    f.classify(Path::new(dir), true),
                    Decision::SkipSubtree(Cause::Pattern(_))
                ),
                "{dir} should be pruned"
            );
        }
    }

    #[test]
    fn patterns_only_prune_directories() {
        let f = filter();
        assert_eq!(
            f.classify(Path::new("/src/app/node_modules"), false),
            Decision::Include
        );
        assert_eq!(
            f.classify(Path::new("/src/app/bazel-out.txt"), false),
            Decision::Include
        );
    }

    #[test]
    fn hidden_names_are_skipped_without_patterns() {
        let f = ExclusionFilter::empty();
        assert_eq!(
            f.classify(Path::new("/src/.git"), true),
            Decision::SkipSubtree(Cause::Hidden)
        );
        assert_eq!(
            f.classify(Path::new("/src/#lock"), false),
            Decision::SkipEntry(Cause::Hidden)
        );
        assert_eq!(
            f.classify(Path::new("/src/file~"), false),
            Decision::SkipEntry(Cause::Hidden)
        );
        assert_eq!(
            f.classify(Path::new("/src/~tmp"), true),
            Decision::SkipSubtree(Cause::Hidden)
        );
        assert_eq!(f.classify(Path::new("/src/.hidden/main.rs"), false), Decision::Include);
    }

    #[test]
    fn only_the_final_component_counts_as_hidden() {
        let f = ExclusionFilter::empty();
        assert_eq!(
            f.classify(Path::new("/home/u/.config/app/main.rs"), false),
            Decision::Include
        );
        assert_eq!(f.classify(Path::new("/src/a~b"), false), Decision::Include);
    }

    #[test]
    fn extra_patterns_extend_the_baseline() {
        let f = ExclusionFilter::new(&["/generated$".to_string()]).expect("compiles");
        assert_eq!(f.patterns().len(), BASELINE_PATTERNS.len() + 1);
        let decision = f.classify(Path::new("/src/generated"), true);
        assert_eq!(
            decision,
            Decision::SkipSubtree(Cause::Pattern(BASELINE_PATTERNS.len()))
        );
        assert!(matches!(decision, Decision::SkipSubtree(cause) if f.describe(cause) == "/generated$"));
        assert!(f.classify(Path::new("/src/generated-code"), true).is_include());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let f = filter();
        assert!(f.classify(Path::new("/src/Node_Modules"), true).is_include());
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = ExclusionFilter::new(&["/ok".to_string(), "(unclosed".to_string()]).expect_err("should fail");
        match err {
            ConfigError::InvalidExcludePattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
