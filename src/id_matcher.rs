//src/id_matcher.rs

use std::borrow::Cow;
use std::fmt;

use regex::Regex;

use crate::error::Result;

/// How a FASTA header is turned into the identifier records are merged on.
#[derive(Debug, Clone, Default)]
pub enum IdMatcher {
    /// Use the identifier unchanged.
    #[default]
    Identity,
    /// Keep the first capture group, or the whole match if the pattern has none.
    Capture(Regex),
    /// Replace every match of `pattern` with `replacement` (`$1`-style groups allowed).
    Substitute { pattern: Regex, replacement: String },
}

impl IdMatcher {
    pub fn capture(pattern: &str) -> Result<Self> {
        Ok(IdMatcher::Capture(Regex::new(pattern)?))
    }

    pub fn substitute(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(IdMatcher::Substitute {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    /// Normalizes `id`, or returns `None` when the pattern does not match.
    pub fn apply<'a>(&self, id: &'a str) -> Option<Cow<'a, str>> {
        match self {
            IdMatcher::Identity => Some(Cow::Borrowed(id)),
            IdMatcher::Capture(re) => {
                let caps = re.captures(id)?;
                let m = caps.get(1).or_else(|| caps.get(0))?;
                Some(Cow::Borrowed(m.as_str()))
            }
            IdMatcher::Substitute {
                pattern,
                replacement,
            } => {
                if !pattern.is_match(id) {
                    return None;
                }
                Some(pattern.replace_all(id, replacement.as_str()))
            }
        }
    }
}

impl fmt::Display for IdMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdMatcher::Identity => write!(f, "<identity>"),
            IdMatcher::Capture(re) => write!(f, "{re}"),
            IdMatcher::Substitute {
                pattern,
                replacement,
            } => write!(f, "s/{pattern}/{replacement}/"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(IdMatcher::Identity.apply("Ecoli_K12").as_deref(), Some("Ecoli_K12"));
    }

    #[test]
    fn test_capture_group_or_whole_match() {
        let m = IdMatcher::capture(r"^([^|]+)\|").unwrap();
        assert_eq!(m.apply("Ecoli|rpoB").as_deref(), Some("Ecoli"));
        assert_eq!(m.apply("no-pipe-here"), None);

        let m = IdMatcher::capture(r"GCF_\d+").unwrap();
        assert_eq!(m.apply("x_GCF_000005845_rpoB").as_deref(), Some("GCF_000005845"));
    }

    #[test]
    fn test_substitute() {
        let m = IdMatcher::substitute(r"_gene\d+$", "").unwrap();
        assert_eq!(m.apply("Bsub_gene12").as_deref(), Some("Bsub"));
        assert_eq!(m.apply("Bsub"), None);

        let m = IdMatcher::substitute(r"^(\w+)\.(\d+)$", "${2}_$1").unwrap();
        assert_eq!(m.apply("strain.42").as_deref(), Some("42_strain"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(IdMatcher::capture("(unclosed").is_err());
    }
}
