//src/fasta.rs

use std::io::{self, BufRead, Write};

use crate::error::{Result, WrangleError};
use crate::types::FastaRecord;

/// Streaming FASTA reader over any `BufRead`.
///
/// Sequence lines may wrap; whitespace inside them is dropped and case is
/// kept as-is so soft-masked bases and gap symbols survive a round trip.
pub struct FastaReader<R> {
    reader: R,
    source_name: String,
    line: String,
    /// Header of the next record, already consumed from `reader`.
    pending_header: Option<String>,
    done: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Self {
            reader,
            source_name: source_name.into(),
            line: String::new(),
            pending_header: None,
            done: false,
        }
    }

    fn malformed(&self, message: impl Into<String>) -> WrangleError {
        WrangleError::Fasta {
            source_name: self.source_name.clone(),
            message: message.into(),
        }
    }

    fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        // 1) find the header, skipping blank lines before it
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                self.line.clear();
                if self.reader.read_line(&mut self.line)? == 0 {
                    return Ok(None);
                }
                let trimmed = self.line.trim_end();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed.strip_prefix('>') {
                    Some(h) => break h.to_string(),
                    None => {
                        return Err(self.malformed(format!(
                            "expected '>' header, found '{}'",
                            truncate(trimmed)
                        )))
                    }
                }
            },
        };

        // 2) collect sequence lines until the next header or EOF
        let mut seq = Vec::new();
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                self.done = true;
                break;
            }
            let trimmed = self.line.trim_end();
            if let Some(h) = trimmed.strip_prefix('>') {
                self.pending_header = Some(h.to_string());
                break;
            }
            seq.extend(trimmed.bytes().filter(|b| !b.is_ascii_whitespace()));
        }

        Ok(Some(FastaRecord::new(header, seq)))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.pending_header.is_none() {
            return None;
        }
        match self.next_record() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                self.pending_header = None;
                Some(Err(e))
            }
        }
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(40) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}


/// Writes one record, wrapping the sequence every `line_width` symbols
/// (`0` disables wrapping).
pub fn write_record<W: Write + ?Sized>(
    writer: &mut W,
    header: &str,
    seq: &[u8],
    line_width: usize,
) -> io::Result<()> {
    writer.write_all(b">")?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(b"\n")?;
    if line_width == 0 {
        writer.write_all(seq)?;
        writer.write_all(b"\n")?;
    } else {
        for chunk in seq.chunks(line_width) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'U' => b'A',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        b'u' => b'a',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'r' => b'y',
        b'y' => b'r',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        // S, W, N and gap symbols are their own complement
        other => other,
    }
}

/// IUPAC-aware reverse complement that keeps case and gap symbols.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}
