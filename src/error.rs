//src/error.rs

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Every failure the tools can run into. All of them are fatal for the
/// invoking binary; recoverable conditions (an untranslatable taxon name,
/// a rejected ITS pairing) are logged instead of raised.
#[derive(Debug, Error)]
pub enum WrangleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed FASTA in {source_name}: {message}")]
    Fasta { source_name: String, message: String },

    #[error("malformed GFF at line {line}: {message}")]
    Gff { line: usize, message: String },

    #[error("taxonomy database: {0}")]
    Taxonomy(String),

    #[error("unrecognized rank token '{0}'")]
    UnknownRank(String),

    #[error("invalid rank range '{token}': {reason}")]
    RankRange { token: String, reason: String },

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("identifier '{id}' in {file} does not match pattern '{pattern}'")]
    PatternMismatch {
        id: String,
        file: String,
        pattern: String,
    },

    #[error("identifier '{id}' occurs more than once in {file}")]
    DuplicateId { id: String, file: String },

    #[error("alignment {0} contains no sequences")]
    EmptyAlignment(String),

    #[error("no identifiers are shared between the {0} input alignments; check the ID pattern")]
    NoSharedIds(usize),

    #[error("executable '{0}' not found in PATH")]
    MissingExecutable(String),

    #[error("annotator '{program}' failed with {status}")]
    AnnotatorFailed { program: String, status: ExitStatus },

    #[error("invalid column list '{0}'")]
    InvalidColumns(String),

    #[error("column {index} is out of range for record '{id}' of length {len}")]
    ColumnOutOfRange { id: String, index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, WrangleError>;
