//src/its.rs

//! Synthesis of ITS (internal transcribed spacer) intervals between
//! adjacent rRNA subunits on a contig.

use crate::gff::{sort_features, FeatureMap};
use crate::types::{Feature, Strand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Downstream,
    Upstream,
}

/// An anchor subunit, the partner expected next to it, and the name of the
/// spacer between them.
#[derive(Debug, Clone, Copy)]
pub struct PairRule {
    pub anchor: &'static str,
    pub partner: &'static str,
    pub direction: Direction,
    pub name: &'static str,
}

pub const PAIR_RULES: [PairRule; 3] = [
    PairRule {
        anchor: "16S",
        partner: "23S",
        direction: Direction::Downstream,
        name: "16S-23S-ITS",
    },
    PairRule {
        anchor: "5_8S",
        partner: "18S",
        direction: Direction::Upstream,
        name: "18S-5_8S-ITS1",
    },
    PairRule {
        anchor: "5_8S",
        partner: "28S",
        direction: Direction::Downstream,
        name: "5_8S-28S-ITS2",
    },
];

pub const ITS_SOURCE: &str = "seqwrangle";

/// Accepted spacer lengths, inclusive.
#[derive(Debug, Clone, Copy)]
pub struct ItsLimits {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for ItsLimits {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: 1500,
        }
    }
}

/// Index of the neighbor of `i` in the given direction. On the minus strand
/// downstream runs towards smaller coordinates; unstranded features count as plus.
fn neighbor_index(i: usize, len: usize, strand: Strand, direction: Direction) -> Option<usize> {
    let towards_higher = (direction == Direction::Downstream) != strand.is_reverse();
    if towards_higher {
        (i + 1 < len).then_some(i + 1)
    } else {
        i.checked_sub(1)
    }
}

/// Finds the spacers on one contig. `features` must be sorted by start.
pub fn find_its(features: &[Feature], limits: ItsLimits) -> Vec<Feature> {
    let mut spacers = Vec::new();

    for (i, anchor) in features.iter().enumerate() {
        for rule in PAIR_RULES.iter().filter(|r| r.anchor == anchor.target) {
            let Some(j) = neighbor_index(i, features.len(), anchor.strand, rule.direction) else {
                continue;
            };
            let neighbor = &features[j];

            let expected_partner = neighbor.target == rule.partner;
            // a neighbor on the other strand is accepted whatever its label;
            // unstranded features read as plus here too
            let opposite_strand = neighbor.strand.is_reverse() != anchor.strand.is_reverse();
            if !expected_partner && !opposite_strand {
                log::debug!(
                    "{}: {} at {} is followed by {}, not {}",
                    anchor.seqid,
                    anchor.target,
                    anchor.start,
                    neighbor.target,
                    rule.partner
                );
                continue;
            }

            let (left, right) = if i < j { (anchor, neighbor) } else { (neighbor, anchor) };
            if right.start <= left.end {
                log::debug!(
                    "{}: {} and {} overlap, no {}",
                    anchor.seqid,
                    left.target,
                    right.target,
                    rule.name
                );
                continue;
            }
            let gap = right.start - left.end;
            if gap < limits.min_len || gap > limits.max_len {
                log::debug!(
                    "{}: {} gap of {gap} outside {}..={}",
                    anchor.seqid,
                    rule.name,
                    limits.min_len,
                    limits.max_len
                );
                continue;
            }

            spacers.push(Feature {
                seqid: anchor.seqid.clone(),
                source: ITS_SOURCE.to_string(),
                kind: "ITS".to_string(),
                start: left.end,
                end: right.start,
                score: ".".to_string(),
                strand: anchor.strand,
                phase: ".".to_string(),
                attributes: format!("Name={};product={} internal transcribed spacer", rule.name, rule.name),
                target: rule.name.to_string(),
            });
        }
    }

    spacers
}

/// Adds the spacers of every contig to its feature list and re-sorts it.
/// Returns the number of spacers added.
pub fn add_its_features(features: &mut FeatureMap, limits: ItsLimits) -> usize {
    let mut added = 0;
    for (contig, list) in features.iter_mut() {
        let spacers = find_its(list, limits);
        if !spacers.is_empty() {
            log::debug!("{contig}: {} ITS regions", spacers.len());
        }
        added += spacers.len();
        list.extend(spacers);
        sort_features(list);
    }
    added
}
