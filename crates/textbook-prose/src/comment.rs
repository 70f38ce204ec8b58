//! Removal of the comment marker that prose cells carry on every line.
use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;

/// `# ` or `#` at the start of a line.
pub const DEFAULT_COMMENT_PATTERN: &str = r"^#\s?";

#[derive(Debug, Error)]
#[error("invalid comment pattern {pattern:?}: {source}")]
pub struct CommentPatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Strips the first match of a regex from each prose line.
#[derive(Clone, Debug)]
pub struct CommentPattern {
    regex: Regex,
}

impl CommentPattern {
    pub fn new(pattern: &str) -> Result<Self, CommentPatternError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| CommentPatternError {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Removes the first match from `line`. Lines without a match come back borrowed.
    pub fn strip<'a>(&self, line: &'a str) -> Cow<'a, str> {
        self.regex.replace(line, "")
    }

    pub fn strip_lines(&self, text: &str) -> Vec<String> {
        text.split('\n')
            .map(|line| self.strip(line).into_owned())
            .collect()
    }
}

impl Default for CommentPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_COMMENT_PATTERN).expect("default comment pattern"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_the_first_marker() {
        let p = CommentPattern::default();
        assert_eq!(p.strip("# # Title"), "# Title");
        assert_eq!(p.strip("#plain"), "plain");
        assert_eq!(p.strip("#"), "");
        assert_eq!(p.strip("no marker # here"), "no marker # here");
        assert!(matches!(p.strip("text"), Cow::Borrowed(_)));
    }

    #[test]
    fn keeps_indentation_after_the_marker() {
        let p = CommentPattern::default();
        assert_eq!(p.strip("#     code"), "    code");
    }

    #[test]
    fn custom_patterns() {
        let p = CommentPattern::new(r"^//\s?").unwrap();
        assert_eq!(p.strip_lines("// a\n//b\nc"), vec!["a", "b", "c"]);
        assert!(CommentPattern::new("(").is_err());
    }
}
