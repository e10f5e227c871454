//src/types.rs

/// A minimal representation of one FASTA record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// First whitespace-delimited token of the header.
    pub id: String,
    /// Full header line without the leading `>`.
    pub header: String,
    pub seq: Vec<u8>,
}

impl FastaRecord {
    pub fn new(header: impl Into<String>, seq: Vec<u8>) -> Self {
        let header = header.into();
        let id = header.split_whitespace().next().unwrap_or("").to_string();
        Self { id, header, seq }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Strand of a genomic feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Forward),
            '-' => Some(Strand::Reverse),
            '.' | '?' => Some(Strand::Unknown),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '.',
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Strand::Reverse
    }
}

/// A structured representation of one GFF feature.
///
/// Coordinates are 0-offset half-open (`[start, end)`); the GFF reader and
/// writer convert from and to the 1-offset closed form on the file boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub seqid: String,
    pub source: String,
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub score: String,
    pub strand: Strand,
    pub phase: String,
    pub attributes: String,
    /// Subunit label such as `16S`, `5_8S`, or an ITS name like `16S-23S-ITS`.
    pub target: String,
}

impl Feature {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
