//src/columns.rs

use std::io::Write;

use crate::error::{Result, WrangleError};
use crate::fasta::write_record;
use crate::types::FastaRecord;

/// What to do with a column past the end of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Fail on the first out-of-range column.
    #[default]
    Error,
    /// Drop out-of-range columns from that record.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Treat each index as a codon, selecting `3i..3i+3`.
    pub codon: bool,
    pub bounds: BoundsPolicy,
    pub line_width: usize,
}

/// Parses `0,2,5-7` into `[0, 2, 5, 6, 7]`. Order and repeats are kept.
pub fn parse_columns(spec: &str) -> Result<Vec<usize>> {
    let invalid = || WrangleError::InvalidColumns(spec.to_string());
    let mut columns = Vec::new();

    for token in spec.split(',').map(str::trim) {
        if token.is_empty() {
            return Err(invalid());
        }
        match token.split_once('-') {
            Some((a, b)) => {
                let a: usize = a.trim().parse().map_err(|_| invalid())?;
                let b: usize = b.trim().parse().map_err(|_| invalid())?;
                if a <= b {
                    columns.extend(a..=b);
                } else {
                    columns.extend((b..=a).rev());
                }
            }
            None => columns.push(token.parse().map_err(|_| invalid())?),
        }
    }
    Ok(columns)
}

/// Expands codon indices into the three symbol positions of each codon.
pub fn expand_codons(columns: &[usize]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(columns.len() * 3);
    for &c in columns {
        let first = c
            .checked_mul(3)
            .filter(|first| first.checked_add(2).is_some())
            .ok_or_else(|| WrangleError::InvalidColumns(format!("codon {c} is out of addressable range")))?;
        positions.extend([first, first + 1, first + 2]);
    }
    Ok(positions)
}

/// Symbols of `record` at `positions`, in the given order.
pub fn select_columns(record: &FastaRecord, positions: &[usize], bounds: BoundsPolicy) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(positions.len());
    for &p in positions {
        match record.seq.get(p) {
            Some(&b) => out.push(b),
            None if bounds == BoundsPolicy::Skip => {}
            None => {
                return Err(WrangleError::ColumnOutOfRange {
                    id: record.id.clone(),
                    index: p,
                    len: record.len(),
                })
            }
        }
    }
    Ok(out)
}

/// Restricts every record to the selected columns and writes it out.
/// Returns the number of records written.
pub fn select_alignment<I, W>(
    records: I,
    columns: &[usize],
    writer: &mut W,
    opts: &SelectOptions,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<FastaRecord>>,
    W: Write + ?Sized,
{
    let positions = if opts.codon {
        expand_codons(columns)?
    } else {
        columns.to_vec()
    };

    let mut written = 0;
    for record in records {
        let record = record?;
        let seq = select_columns(&record, &positions, opts.bounds)?;
        if seq.len() < positions.len() {
            log::warn!(
                "{}: {} of {} columns out of range, dropped",
                record.id,
                positions.len() - seq.len(),
                positions.len()
            );
        }
        write_record(writer, &record.header, &seq, opts.line_width)?;
        written += 1;
    }
    log::info!("Selected {} columns from {written} records", positions.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(seq: &[u8]) -> FastaRecord {
        FastaRecord::new("s1 desc", seq.to_vec())
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("0,2").unwrap(), vec![0, 2]);
        assert_eq!(parse_columns("5, 1,1,3-5,9-7").unwrap(), vec![5, 1, 1, 3, 4, 5, 9, 8, 7]);
        assert!(parse_columns("1,,2").is_err());
        assert!(parse_columns("a").is_err());
        assert!(parse_columns("-3").is_err());
    }

    #[test]
    fn test_select_single_columns() {
        let got = select_columns(&rec(b"ACGT"), &[0, 2], BoundsPolicy::Error).unwrap();
        assert_eq!(got, b"AG");
        let got = select_columns(&rec(b"ACGT"), &[3, 0, 0], BoundsPolicy::Error).unwrap();
        assert_eq!(got, b"TAA");
    }

    #[test]
    fn test_codon_mode() {
        assert_eq!(expand_codons(&[1]).unwrap(), vec![3, 4, 5]);
        let got = select_columns(&rec(b"AAACGTTTT"), &expand_codons(&[1]).unwrap(), BoundsPolicy::Error).unwrap();
        assert_eq!(got, b"CGT");
    }

    #[test]
    fn test_out_of_range() {
        let err = select_columns(&rec(b"ACGT"), &[1, 4], BoundsPolicy::Error).unwrap_err();
        assert!(matches!(
            err,
            WrangleError::ColumnOutOfRange { index: 4, len: 4, .. }
        ));
        let got = select_columns(&rec(b"ACGT"), &[1, 4], BoundsPolicy::Skip).unwrap();
        assert_eq!(got, b"C");
    }

    #[test]
    fn test_huge_codon_index_is_an_error() {
        let columns = parse_columns("6148914691236517206").unwrap();
        assert!(matches!(expand_codons(&columns), Err(WrangleError::InvalidColumns(_))));

        let records = vec![Ok(rec(b"ACGTAC"))];
        let opts = SelectOptions {
            codon: true,
            ..SelectOptions::default()
        };
        let mut out = Vec::new();
        let err = select_alignment(records, &columns, &mut out, &opts).unwrap_err();
        assert!(matches!(err, WrangleError::InvalidColumns(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_select_alignment_keeps_headers() {
        let records = vec![
            Ok(FastaRecord::new("a one", b"ACGTAC".to_vec())),
            Ok(FastaRecord::new("b", b"TTGGCC".to_vec())),
        ];
        let opts = SelectOptions {
            codon: true,
            ..SelectOptions::default()
        };
        let mut out = Vec::new();
        assert_eq!(select_alignment(records, &[1, 0], &mut out, &opts).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), ">a one\nTACACG\n>b\nGCCTTG\n");
    }
}
