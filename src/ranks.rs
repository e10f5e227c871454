//src/ranks.rs

use crate::error::{Result, WrangleError};

/// The principal ranks, general to specific. Range tokens (`a-b`) may only
/// use these as endpoints.
pub const RANK_LADDER: [(char, &str); 8] = [
    ('d', "domain"),
    ('k', "kingdom"),
    ('p', "phylum"),
    ('c', "class"),
    ('o', "order"),
    ('f', "family"),
    ('g', "genus"),
    ('s', "species"),
];

/// NCBI rank names accepted as single tokens besides the ladder.
const OTHER_RANKS: &[&str] = &[
    "superkingdom",
    "realm",
    "subkingdom",
    "superphylum",
    "subphylum",
    "superclass",
    "subclass",
    "infraclass",
    "cohort",
    "subcohort",
    "superorder",
    "suborder",
    "infraorder",
    "parvorder",
    "superfamily",
    "subfamily",
    "tribe",
    "subtribe",
    "subgenus",
    "section",
    "subsection",
    "series",
    "species group",
    "species subgroup",
    "subspecies",
    "varietas",
    "forma",
    "strain",
    "serotype",
    "serogroup",
    "biotype",
    "genotype",
    "isolate",
    "clade",
];

/// One requested output rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank(&'static str);

impl Rank {
    pub fn name(&self) -> &'static str {
        self.0
    }

    /// Whether a lineage node carrying `node_rank` fills this rank.
    /// `domain` also accepts the older NCBI label `superkingdom`.
    pub fn matches(&self, node_rank: &str) -> bool {
        node_rank == self.0 || (self.0 == "domain" && node_rank == "superkingdom")
    }

    /// Looks up a single (non-range) token.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let lower = token.to_lowercase();

        if let Some(idx) = ladder_index(&lower) {
            return Ok(Rank(RANK_LADDER[idx].1));
        }
        OTHER_RANKS
            .iter()
            .find(|r| **r == lower)
            .map(|r| Rank(*r))
            .ok_or_else(|| WrangleError::UnknownRank(token.to_string()))
    }
}

fn ladder_index(token: &str) -> Option<usize> {
    RANK_LADDER.iter().position(|(abbr, name)| {
        *name == token || (token.len() == 1 && token.starts_with(*abbr))
    })
}

fn ladder_endpoint(endpoint: &str, token: &str) -> Result<usize> {
    let lower = endpoint.trim().to_lowercase();
    ladder_index(&lower).ok_or_else(|| {
        if Rank::parse(&lower).is_ok() {
            WrangleError::RankRange {
                token: token.to_string(),
                reason: format!("'{}' is not one of d,k,p,c,o,f,g,s", endpoint.trim()),
            }
        } else {
            WrangleError::UnknownRank(endpoint.trim().to_string())
        }
    })
}

/// Expands a comma-separated rank list such as `s,g,f`, `species,subphylum`
/// or `o-k` into the ordered list of ranks.
///
/// A range walks the ladder inclusively, from `a` towards `b`, so `d-s` is
/// general-to-specific and `s-d` its reverse.
pub fn parse_rank_list(spec: &str) -> Result<Vec<Rank>> {
    let mut ranks = Vec::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        // "species group" and friends contain no '-', so a dash means a range
        match token.split_once('-') {
            Some((a, b)) => {
                let from = ladder_endpoint(a, token)?;
                let to = ladder_endpoint(b, token)?;
                if from <= to {
                    ranks.extend(RANK_LADDER[from..=to].iter().map(|&(_, n)| Rank(n)));
                } else {
                    ranks.extend(RANK_LADDER[to..=from].iter().rev().map(|&(_, n)| Rank(n)));
                }
            }
            None => ranks.push(Rank::parse(token)?),
        }
    }

    if ranks.is_empty() {
        return Err(WrangleError::UnknownRank(spec.to_string()));
    }
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ranks: &[Rank]) -> Vec<&'static str> {
        ranks.iter().map(Rank::name).collect()
    }

    #[test]
    fn test_abbreviations() {
        let ranks = parse_rank_list("s,g,f,o,c,p,k,d").unwrap();
        assert_eq!(
            names(&ranks),
            vec!["species", "genus", "family", "order", "class", "phylum", "kingdom", "domain"]
        );
    }

    #[test]
    fn test_range_towards_general_is_reversed_ladder() {
        let ranks = parse_rank_list("o-k").unwrap();
        let expected: Vec<&str> = RANK_LADDER[1..=4].iter().rev().map(|(_, n)| *n).collect();
        assert_eq!(names(&ranks), expected);
        assert_eq!(names(&ranks), vec!["order", "class", "phylum", "kingdom"]);
    }

    #[test]
    fn test_range_towards_specific() {
        let ranks = parse_rank_list("p-f").unwrap();
        assert_eq!(names(&ranks), vec!["phylum", "class", "order", "family"]);
        assert_eq!(names(&parse_rank_list("g-g").unwrap()), vec!["genus"]);
    }

    #[test]
    fn test_mixed_tokens() {
        let ranks = parse_rank_list("Species, subphylum ,k-p").unwrap();
        assert_eq!(names(&ranks), vec!["species", "subphylum", "kingdom", "phylum"]);
    }

    #[test]
    fn test_unknown_rank_is_fatal() {
        assert!(matches!(
            parse_rank_list("s,x").unwrap_err(),
            WrangleError::UnknownRank(t) if t == "x"
        ));
        assert!(matches!(
            parse_rank_list("s-subgenus").unwrap_err(),
            WrangleError::RankRange { .. }
        ));
        assert!(parse_rank_list(" , ").is_err());
    }

    #[test]
    fn test_domain_matches_superkingdom() {
        let d = Rank::parse("d").unwrap();
        assert!(d.matches("superkingdom"));
        assert!(d.matches("domain"));
        assert!(!Rank::parse("k").unwrap().matches("superkingdom"));
    }
}
