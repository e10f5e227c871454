//src/extract.rs

use std::io::Write;

use ahash::AHashMap;

use crate::error::Result;
use crate::fasta::{reverse_complement, write_record};
use crate::gff::{write_feature, FeatureMap};
use crate::types::{FastaRecord, Feature};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Emit only the synthesized ITS regions.
    pub only_its: bool,
    /// Annotation provenance for the output headers.
    pub gff_name: Option<String>,
    /// Sequence provenance for the output headers.
    pub fasta_name: Option<String>,
    pub line_width: usize,
}

/// A feature with its output identifier.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub feature: Feature,
}

/// Assigns `<prefix>_<target>_<n>` identifiers to every feature.
///
/// The counter runs per (prefix, target) over the whole map, so repeated
/// operons on one contig, or several contigs sharing an overridden prefix,
/// never collide.
pub fn assign_ids(features: &FeatureMap, prefix: Option<&str>) -> AHashMap<String, Vec<Region>> {
    let mut counters: AHashMap<(String, String), usize> = AHashMap::new();
    let mut regions = AHashMap::new();

    for (contig, list) in features {
        let id_prefix = prefix.unwrap_or(contig);
        let named: Vec<Region> = list
            .iter()
            .map(|feature| {
                let n = counters
                    .entry((id_prefix.to_string(), feature.target.clone()))
                    .or_insert(0);
                *n += 1;
                Region {
                    id: format!("{id_prefix}_{}_{n}", feature.target),
                    feature: feature.clone(),
                }
            })
            .collect();
        regions.insert(contig.clone(), named);
    }
    regions
}

/// Output header: ID, 1-offset source coordinates, strand, label, provenance.
pub fn region_header(region: &Region, opts: &ExtractOptions) -> String {
    let f = &region.feature;
    let mut header = format!(
        "{} {}:{}-{}({}) {}",
        region.id,
        f.seqid,
        f.start + 1,
        f.end,
        f.strand.as_char(),
        f.target
    );
    if let Some(gff) = &opts.gff_name {
        header.push_str(&format!(" gff={gff}"));
    }
    if let Some(fasta) = &opts.fasta_name {
        header.push_str(&format!(" fasta={fasta}"));
    }
    header
}

/// Counts reported after extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub contigs: usize,
    pub regions: usize,
    pub skipped: usize,
}

/// Writes the annotated regions of every record as FASTA, reverse
/// complementing minus-strand regions. Records without regions are skipped.
pub fn extract_regions<I, W>(
    records: I,
    regions: &AHashMap<String, Vec<Region>>,
    writer: &mut W,
    opts: &ExtractOptions,
) -> Result<ExtractStats>
where
    I: IntoIterator<Item = Result<FastaRecord>>,
    W: Write + ?Sized,
{
    let mut stats = ExtractStats::default();

    for record in records {
        let record = record?;
        let Some(list) = regions.get(&record.id) else {
            continue;
        };
        stats.contigs += 1;

        for region in list {
            let f = &region.feature;
            if opts.only_its && f.kind != "ITS" {
                continue;
            }
            if f.end > record.len() {
                log::warn!(
                    "{}: {} ends at {} beyond sequence length {}, skipping",
                    record.id,
                    region.id,
                    f.end,
                    record.len()
                );
                stats.skipped += 1;
                continue;
            }

            let slice = &record.seq[f.start..f.end];
            let seq = if f.strand.is_reverse() {
                reverse_complement(slice)
            } else {
                slice.to_vec()
            };
            write_record(writer, &region_header(region, opts), &seq, opts.line_width)?;
            stats.regions += 1;
        }
    }

    log::info!(
        "Extracted {} regions from {} sequences ({} skipped)",
        stats.regions,
        stats.contigs,
        stats.skipped
    );
    Ok(stats)
}

/// Writes the final feature table, spacers included, with their IDs.
pub fn write_regions_gff<W: Write + ?Sized>(
    writer: &mut W,
    features: &FeatureMap,
    regions: &AHashMap<String, Vec<Region>>,
) -> Result<()> {
    writeln!(writer, "##gff-version 3")?;
    for contig in features.keys() {
        for region in regions.get(contig).into_iter().flatten() {
            write_feature(writer, &region.feature, Some(region.id.as_str()))?;
        }
    }
    Ok(())
}
