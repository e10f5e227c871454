//src/gff.rs

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, WrangleError};
use crate::fasta::FastaReader;
use crate::types::{FastaRecord, Feature, Strand};

/// Features grouped by contig, each list sorted by start.
pub type FeatureMap = BTreeMap<String, Vec<Feature>>;

/// Everything read from one annotation stream.
#[derive(Debug, Default)]
pub struct GffData {
    pub features: FeatureMap,
    /// Sequences embedded after a `##FASTA` directive.
    pub sequences: Vec<FastaRecord>,
}

fn product_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?S) ribosomal RNA").expect("static regex")
    })
}

fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(';').find_map(|kv| {
        let (k, v) = kv.trim().split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Subunit label of an rRNA feature: `Name=16S_rRNA` gives `16S`, and
/// `product=5.8S ribosomal RNA` gives `5_8S`.
pub fn target_label(attributes: &str) -> Option<String> {
    if let Some(name) = attribute(attributes, "Name") {
        if let Some(label) = name.strip_suffix("_rRNA") {
            return Some(label.to_string());
        }
    }
    let product = attribute(attributes, "product")?;
    let caps = product_regex().captures(product)?;
    Some(caps[1].to_uppercase().replace('.', "_"))
}

/// Parses one 9-column line into a feature with 0-offset half-open coordinates.
/// `target` is left empty.
pub fn parse_feature_line(line: &str, line_no: usize) -> Result<Feature> {
    let err = |message: String| WrangleError::Gff {
        line: line_no,
        message,
    };

    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() != 9 {
        return Err(err(format!("expected 9 columns, found {}", cols.len())));
    }

    let start: usize = cols[3]
        .parse()
        .map_err(|_| err(format!("invalid start '{}'", cols[3])))?;
    let end: usize = cols[4]
        .parse()
        .map_err(|_| err(format!("invalid end '{}'", cols[4])))?;
    if start == 0 || end < start {
        return Err(err(format!("invalid interval {start}..{end}")));
    }

    let strand = cols[6]
        .chars()
        .next()
        .filter(|_| cols[6].len() == 1)
        .and_then(Strand::from_char)
        .ok_or_else(|| err(format!("invalid strand '{}'", cols[6])))?;

    Ok(Feature {
        seqid: cols[0].to_string(),
        source: cols[1].to_string(),
        kind: cols[2].to_string(),
        // 1-offset closed -> 0-offset half-open
        start: start - 1,
        end,
        score: cols[5].to_string(),
        strand,
        phase: cols[7].to_string(),
        attributes: cols[8].to_string(),
        target: String::new(),
    })
}

/// Reads rRNA features from a GFF stream (a file, or annotator stdout).
///
/// Only `rRNA` features with a recognizable subunit label are kept. Reading
/// stops at `##FASTA`, after which the remainder is parsed as sequences.
pub fn read_rrna_features<R: BufRead>(mut reader: R, source_name: &str) -> Result<GffData> {
    let mut data = GffData::default();
    let mut line = String::new();
    let mut line_no = 0;
    let mut has_fasta = false;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;
        let trimmed = line.trim_end_matches(['\n', '\r']);

        if trimmed.starts_with("##FASTA") {
            has_fasta = true;
            break;
        }
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut feature = parse_feature_line(trimmed, line_no)?;
        if feature.kind != "rRNA" {
            continue;
        }
        match target_label(&feature.attributes) {
            Some(target) => feature.target = target,
            None => {
                log::debug!(
                    "{source_name}:{line_no}: no subunit label in '{}', skipping",
                    feature.attributes
                );
                continue;
            }
        }
        data.features
            .entry(feature.seqid.clone())
            .or_default()
            .push(feature);
    }

    for features in data.features.values_mut() {
        sort_features(features);
    }

    if has_fasta {
        data.sequences = FastaReader::new(&mut reader, source_name).collect::<Result<_>>()?;
    }

    log::info!(
        "{source_name}: {} rRNA features on {} contigs",
        data.features.values().map(Vec::len).sum::<usize>(),
        data.features.len()
    );
    Ok(data)
}

/// Stable sort by start, so equal starts keep their input order.
pub fn sort_features(features: &mut [Feature]) {
    features.sort_by_key(|f| f.start);
}

/// Writes features as GFF3, converting back to 1-offset closed coordinates.
/// When `id` is given it is prepended to the attributes as `ID=`.
pub fn write_feature<W: Write + ?Sized>(
    writer: &mut W,
    feature: &Feature,
    id: Option<&str>,
) -> std::io::Result<()> {
    let attributes = match id {
        Some(id) => format!("ID={id};{}", feature.attributes),
        None => feature.attributes.clone(),
    };
    writeln!(
        writer,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        feature.seqid,
        feature.source,
        feature.kind,
        feature.start + 1,
        feature.end,
        feature.score,
        feature.strand.as_char(),
        feature.phase,
        attributes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const BARRNAP: &str = "\
##gff-version 3
contig1\tbarrnap:0.9\trRNA\t1651\t3500\t0\t+\t.\tName=23S_rRNA;product=23S ribosomal RNA
contig1\tbarrnap:0.9\trRNA\t101\t1600\t0\t+\t.\tName=16S_rRNA;product=16S ribosomal RNA
contig1\tprokka\tCDS\t4000\t4500\t.\t-\t0\tproduct=hypothetical protein
contig2\tbarrnap:0.9\trRNA\t10\t160\t1e-10\t-\t.\tName=5_8S_rRNA;product=5.8S ribosomal RNA
contig2\tcmscan\trRNA\t300\t400\t.\t-\t.\tproduct=5S ribosomal RNA (partial)
contig3\tother\trRNA\t1\t50\t.\t+\t.\tproduct=unknown
";

    #[test]
    fn test_target_label() {
        assert_eq!(target_label("Name=16S_rRNA;product=16S ribosomal RNA").as_deref(), Some("16S"));
        assert_eq!(target_label("Name=5_8S_rRNA").as_deref(), Some("5_8S"));
        assert_eq!(target_label("product=5.8S ribosomal RNA").as_deref(), Some("5_8S"));
        assert_eq!(target_label("Name=rrnA;product=23S ribosomal RNA").as_deref(), Some("23S"));
        assert_eq!(target_label("product=tRNA-Ala"), None);
    }

    #[test]
    fn test_read_converts_and_sorts() {
        let data = read_rrna_features(Cursor::new(BARRNAP), "test.gff").unwrap();
        assert_eq!(data.features.len(), 2);

        let c1 = &data.features["contig1"];
        assert_eq!(c1.len(), 2);
        assert_eq!((c1[0].start, c1[0].end, c1[0].target.as_str()), (100, 1600, "16S"));
        assert_eq!((c1[1].start, c1[1].end, c1[1].target.as_str()), (1650, 3500, "23S"));

        let c2 = &data.features["contig2"];
        assert_eq!(c2[0].strand, Strand::Reverse);
        assert_eq!(c2[0].target, "5_8S");
        assert_eq!(c2[1].target, "5S");
        assert!(data.sequences.is_empty());
    }

    #[test]
    fn test_embedded_fasta() {
        let text = format!("{BARRNAP}##FASTA\n>contig1 desc\nACGT\nAC\n>contig2\nGG\n");
        let data = read_rrna_features(Cursor::new(text), "test.gff").unwrap();
        assert_eq!(data.sequences.len(), 2);
        assert_eq!(data.sequences[0].id, "contig1");
        assert_eq!(data.sequences[0].seq, b"ACGTAC");
    }

    #[test]
    fn test_malformed_lines() {
        for bad in [
            "c\ts\trRNA\t0\t10\t.\t+\t.\tName=16S_rRNA\n",
            "c\ts\trRNA\t20\t10\t.\t+\t.\tName=16S_rRNA\n",
            "c\ts\trRNA\t1\t10\t.\tx\t.\tName=16S_rRNA\n",
            "c\ts\trRNA\t1\t10\n",
        ] {
            let err = read_rrna_features(Cursor::new(bad), "bad.gff").unwrap_err();
            assert!(matches!(err, WrangleError::Gff { line: 1, .. }), "{bad}");
        }
    }

    #[test]
    fn test_write_feature_round_trips_coordinates() {
        let f = parse_feature_line("c\ts\trRNA\t101\t1600\t0\t-\t.\tName=16S_rRNA", 1).unwrap();
        assert_eq!((f.start, f.end, f.len()), (100, 1600, 1500));
        let mut out = Vec::new();
        write_feature(&mut out, &f, Some("c_16S_1")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "c\ts\trRNA\t101\t1600\t0\t-\t.\tID=c_16S_1;Name=16S_rRNA\n"
        );
    }
}
