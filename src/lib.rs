// src/lib.rs
pub mod annotator;
pub mod cli;
pub mod columns;
pub mod concat;
pub mod error;
pub mod extract;
pub mod fasta;
pub mod gff;
pub mod id_matcher;
pub mod io;
pub mod its;
pub mod lineage;
pub mod ranks;
pub mod taxdb;
pub mod types;

use ahash::AHashMap;
use std::path::{Path, PathBuf};

pub use crate::error::{Result, WrangleError};

use crate::annotator::Annotator;
use crate::extract::{assign_ids, Region};
use crate::gff::{read_rrna_features, FeatureMap};
use crate::io::{display_name, open_input};
use crate::its::{add_its_features, ItsLimits};
use crate::types::FastaRecord;

/// Where rRNA annotations come from.
#[derive(Debug, Clone)]
pub enum AnnotationSource {
    /// A precomputed GFF file, possibly carrying sequences after `##FASTA`.
    Gff(PathBuf),
    /// Run the annotator on the input FASTA.
    Annotator(Annotator),
}

impl AnnotationSource {
    /// Provenance label used in output headers.
    pub fn name(&self) -> String {
        match self {
            AnnotationSource::Gff(path) => display_name(path),
            AnnotationSource::Annotator(a) => display_name(&a.program),
        }
    }
}

/// rRNA features of a genome, spacers included, with their output IDs.
pub struct RrnaAnnotation {
    pub features: FeatureMap,
    /// contig -> named regions, in coordinate order
    pub regions: AHashMap<String, Vec<Region>>,
    /// Sequences embedded in the GFF, empty when the annotator was used.
    pub embedded_sequences: Vec<FastaRecord>,
    pub its_count: usize,
}

impl RrnaAnnotation {
    pub fn region_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Loads or computes rRNA annotations, synthesizes ITS intervals between
/// adjacent subunits, and assigns region IDs.
pub fn annotate_rrna(
    fasta: Option<&Path>,
    source: &AnnotationSource,
    limits: ItsLimits,
    prefix: Option<&str>,
) -> Result<RrnaAnnotation> {
    // 1. Features, sorted by start per contig
    let (mut features, embedded_sequences) = match source {
        AnnotationSource::Gff(path) => {
            let data = read_rrna_features(open_input(path)?, &display_name(path))?;
            (data.features, data.sequences)
        }
        AnnotationSource::Annotator(annotator) => {
            let fasta = fasta.ok_or_else(|| {
                WrangleError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "the annotator needs a FASTA file path",
                ))
            })?;
            (annotator.annotate(fasta)?, Vec::new())
        }
    };

    // 2. Spacers between adjacent subunits
    let its_count = add_its_features(&mut features, limits);

    // 3. Output identifiers
    let regions = assign_ids(&features, prefix);

    Ok(RrnaAnnotation {
        features,
        regions,
        embedded_sequences,
        its_count,
    })
}
