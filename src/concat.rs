//src/concat.rs

use std::io::{BufRead, Write};
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::error::{Result, WrangleError};
use crate::fasta::{write_record, FastaReader};
use crate::id_matcher::IdMatcher;
use crate::io::{display_name, open_input};

#[derive(Debug, Clone)]
pub struct ConcatOptions {
    pub matcher: IdMatcher,
    /// Apply the matcher to the whole header instead of the first token.
    pub full_header: bool,
    pub gap: u8,
    /// Model written in front of each partition line.
    pub model: String,
    pub line_width: usize,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            matcher: IdMatcher::Identity,
            full_header: false,
            gap: b'-',
            model: "DNA".to_string(),
            line_width: 0,
        }
    }
}

/// One input alignment keyed by normalized identifier.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub name: String,
    pub width: usize,
    /// Identifiers in input order.
    pub ids: Vec<String>,
    seqs: AHashMap<String, Vec<u8>>,
}

impl Alignment {
    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.seqs.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Reads an alignment file, normalizing each identifier through the matcher.
pub fn read_alignment<P: AsRef<Path>>(path: P, opts: &ConcatOptions) -> Result<Alignment> {
    let name = display_name(&path);
    read_alignment_from(open_input(&path)?, &name, opts)
}

pub fn read_alignment_from<R: BufRead>(
    reader: R,
    name: &str,
    opts: &ConcatOptions,
) -> Result<Alignment> {
    let mut ids = Vec::new();
    let mut seqs = AHashMap::new();
    let mut width = None;

    for record in FastaReader::new(reader, name) {
        let record = record?;
        let raw = if opts.full_header {
            record.header.as_str()
        } else {
            record.id.as_str()
        };
        let id = opts
            .matcher
            .apply(raw)
            .ok_or_else(|| WrangleError::PatternMismatch {
                id: raw.to_string(),
                file: name.to_string(),
                pattern: opts.matcher.to_string(),
            })?
            .into_owned();

        let expected = *width.get_or_insert(record.seq.len());
        if record.seq.len() != expected {
            log::warn!(
                "{name}: '{id}' has {} columns, expected {expected}",
                record.seq.len()
            );
        }

        if seqs.contains_key(&id) {
            return Err(WrangleError::DuplicateId {
                id,
                file: name.to_string(),
            });
        }
        ids.push(id.clone());
        seqs.insert(id, record.seq);
    }

    let Some(width) = width else {
        return Err(WrangleError::EmptyAlignment(name.to_string()));
    };
    log::info!("{name}: {} sequences, {width} columns", ids.len());

    Ok(Alignment {
        name: name.to_string(),
        width,
        ids,
        seqs,
    })
}

/// Column span of one input inside the concatenated alignment,
/// 0-offset half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    /// RAxML partition line, 1-offset inclusive: `DNA, gene.fa=1-500`.
    pub fn to_raxml(&self, model: &str) -> String {
        format!("{model}, {}={}-{}", self.name, self.start + 1, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct Concatenation {
    pub records: Vec<(String, Vec<u8>)>,
    pub partitions: Vec<Partition>,
}

impl Concatenation {
    pub fn width(&self) -> usize {
        self.partitions.last().map(|p| p.end).unwrap_or(0)
    }

    pub fn write_fasta<W: Write + ?Sized>(&self, writer: &mut W, line_width: usize) -> Result<()> {
        for (id, seq) in &self.records {
            write_record(writer, id, seq, line_width)?;
        }
        Ok(())
    }

    pub fn write_partitions<W: Write + ?Sized>(&self, writer: &mut W, model: &str) -> Result<()> {
        for p in &self.partitions {
            writeln!(writer, "{}", p.to_raxml(model))?;
        }
        Ok(())
    }
}

/// Concatenates alignments by identifier, in input order, padding identifiers
/// missing from an input with `gap` repeated to that input's width.
pub fn concatenate(alignments: &[Alignment], gap: u8) -> Result<Concatenation> {
    // identifiers in first-seen order, with the number of inputs carrying each
    let mut order: Vec<&str> = Vec::new();
    let mut seen: AHashMap<&str, usize> = AHashMap::new();
    for aln in alignments {
        for id in &aln.ids {
            let count = seen.entry(id.as_str()).or_insert_with(|| {
                order.push(id.as_str());
                0
            });
            *count += 1;
        }
    }

    // not exhaustive: one shared identifier is enough to pass
    if alignments.len() > 1 && !seen.values().any(|&n| n > 1) {
        return Err(WrangleError::NoSharedIds(alignments.len()));
    }

    let mut partitions = Vec::with_capacity(alignments.len());
    let mut offset = 0;
    for aln in alignments {
        partitions.push(Partition {
            name: aln.name.clone(),
            start: offset,
            end: offset + aln.width,
        });
        offset += aln.width;
    }

    let mut missing: AHashSet<(usize, &str)> = AHashSet::new();
    let records = order
        .iter()
        .map(|&id| {
            let mut seq = Vec::with_capacity(offset);
            for (i, aln) in alignments.iter().enumerate() {
                match aln.get(id) {
                    Some(s) => seq.extend_from_slice(s),
                    None => {
                        missing.insert((i, id));
                        seq.resize(seq.len() + aln.width, gap);
                    }
                }
            }
            (id.to_string(), seq)
        })
        .collect();

    log::info!(
        "Concatenated {} alignments into {} records of {offset} columns ({} gap-filled segments)",
        alignments.len(),
        order.len(),
        missing.len()
    );

    Ok(Concatenation {
        records,
        partitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn aln(name: &str, text: &str) -> Alignment {
        read_alignment_from(Cursor::new(text.to_string()), name, &ConcatOptions::default()).unwrap()
    }

    #[test]
    fn test_concatenate_pads_missing_ids() {
        let a = aln("A.fa", ">x\nAAAAAAAAAA\n>y\nCCCCCCCCCC\n");
        let b = aln("B.fa", ">z\nGGGGGGGG\n>y\nTTTTTTTT\n");
        let cat = concatenate(&[a, b], b'-').unwrap();

        let ids: Vec<&str> = cat.records.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        assert!(cat.records.iter().all(|(_, s)| s.len() == 18));
        assert_eq!(cat.records[0].1, b"AAAAAAAAAA--------");
        assert_eq!(cat.records[1].1, b"CCCCCCCCCCTTTTTTTT");
        assert_eq!(cat.records[2].1, b"----------GGGGGGGG");
    }

    #[test]
    fn test_partitions_are_contiguous() {
        let a = aln("A.fa", ">x\nAAAAAAAAAA\n");
        let b = aln("B.fa", ">x\nCCCCCCCC\n");
        let c = aln("C.fa", ">x\nGGG\n>w\nTTT\n");
        let cat = concatenate(&[a, b, c], b'N').unwrap();

        let mut expected_start = 0;
        for p in &cat.partitions {
            assert_eq!(p.start, expected_start);
            expected_start = p.end;
        }
        assert_eq!(cat.width(), 21);
        assert_eq!(cat.records[1].1, b"NNNNNNNNNNNNNNNNNNTTT");

        let mut out = Vec::new();
        cat.write_partitions(&mut out, "WAG").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WAG, A.fa=1-10\nWAG, B.fa=11-18\nWAG, C.fa=19-21\n"
        );
    }

    #[test]
    fn test_no_shared_ids_is_fatal() {
        let a = aln("A.fa", ">x\nAA\n");
        let b = aln("B.fa", ">y\nCC\n");
        assert!(matches!(
            concatenate(&[a.clone(), b], b'-').unwrap_err(),
            WrangleError::NoSharedIds(2)
        ));
        // a single input has nothing to share with
        assert_eq!(concatenate(&[a], b'-').unwrap().records.len(), 1);
    }

    #[test]
    fn test_pattern_mismatch_names_id_and_file() {
        let opts = ConcatOptions {
            matcher: IdMatcher::capture(r"^(\w+)\|").unwrap(),
            ..ConcatOptions::default()
        };
        let err = read_alignment_from(Cursor::new(">Ecoli|a\nAC\n>Bsub\nAC\n"), "genes.fa", &opts)
            .unwrap_err();
        match err {
            WrangleError::PatternMismatch { id, file, .. } => {
                assert_eq!(id, "Bsub");
                assert_eq!(file, "genes.fa");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_full_header_matching() {
        let opts = ConcatOptions {
            matcher: IdMatcher::capture(r"\[organism=([^\]]+)\]").unwrap(),
            full_header: true,
            ..ConcatOptions::default()
        };
        let a = read_alignment_from(
            Cursor::new(">g1 [organism=E coli]\nAC\n"),
            "a.fa",
            &opts,
        )
        .unwrap();
        assert_eq!(a.ids, vec!["E coli"]);
    }

    #[test]
    fn test_duplicate_and_empty_inputs() {
        let opts = ConcatOptions::default();
        assert!(matches!(
            read_alignment_from(Cursor::new(">x\nAC\n>x\nGT\n"), "d.fa", &opts).unwrap_err(),
            WrangleError::DuplicateId { .. }
        ));
        assert!(matches!(
            read_alignment_from(Cursor::new(""), "e.fa", &opts).unwrap_err(),
            WrangleError::EmptyAlignment(_)
        ));
    }
}
