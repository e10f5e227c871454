//src/io.rs

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Opens `path` for buffered reading. `-` reads stdin, and files ending in
/// `.gz` are transparently decompressed.
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Opens a buffered writer on `path`, or on stdout when the path is absent or `-`.
pub fn open_output<P: AsRef<Path>>(path: Option<P>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) if p.as_ref().as_os_str() != "-" => {
            Ok(Box::new(BufWriter::new(File::create(p)?)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Display name of an input, used in provenance headers and partition files.
pub fn display_name<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    if path.as_os_str() == "-" {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Read;

    #[test]
    fn test_open_input_reads_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fa.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b">a\nACGT\n").unwrap();
        enc.finish().unwrap();

        let mut text = String::new();
        open_input(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, ">a\nACGT\n");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("/tmp/x/genes.fasta"), "genes.fasta");
        assert_eq!(display_name("-"), "stdin");
    }
}
