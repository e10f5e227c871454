//src/annotator.rs

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::error::{Result, WrangleError};
use crate::gff::{read_rrna_features, FeatureMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kingdom {
    #[default]
    Bacteria,
    Archaea,
    Eukaryota,
    Mitochondria,
}

impl Kingdom {
    pub fn as_arg(self) -> &'static str {
        match self {
            Kingdom::Bacteria => "bac",
            Kingdom::Archaea => "arc",
            Kingdom::Eukaryota => "euk",
            Kingdom::Mitochondria => "mito",
        }
    }
}

impl FromStr for Kingdom {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bac" | "bacteria" => Ok(Kingdom::Bacteria),
            "arc" | "archaea" => Ok(Kingdom::Archaea),
            "euk" | "eukaryota" => Ok(Kingdom::Eukaryota),
            "mito" | "mitochondria" => Ok(Kingdom::Mitochondria),
            other => Err(format!("unknown kingdom '{other}' (bac, arc, euk, mito)")),
        }
    }
}

/// Settings for the external rRNA annotator (barrnap-compatible CLI).
#[derive(Debug, Clone)]
pub struct Annotator {
    pub program: PathBuf,
    pub kingdom: Kingdom,
    pub threads: usize,
    pub evalue: Option<f64>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            program: PathBuf::from("barrnap"),
            kingdom: Kingdom::Bacteria,
            threads: 1,
            evalue: None,
        }
    }
}

impl Annotator {
    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Command line for annotating `fasta`.
    pub fn command(&self, fasta: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--kingdom")
            .arg(self.kingdom.as_arg())
            .arg("--threads")
            .arg(self.threads.max(1).to_string());
        if let Some(evalue) = self.evalue {
            cmd.arg("--evalue").arg(evalue.to_string());
        }
        cmd.arg("--quiet").arg(fasta);
        cmd
    }

    /// Runs the annotator on `fasta` and parses its GFF output as it streams.
    pub fn annotate(&self, fasta: &Path) -> Result<FeatureMap> {
        let mut cmd = self.command(fasta);
        log::info!("Running {cmd:?}");

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => WrangleError::MissingExecutable(self.program_name()),
                _ => WrangleError::Io(e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "annotator stdout unavailable"))?;
        let parsed = match read_rrna_features(BufReader::new(stdout), &self.program_name()) {
            Ok(parsed) => parsed,
            Err(e) => {
                // the annotator may still be writing into the closed pipe
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(WrangleError::AnnotatorFailed {
                program: self.program_name(),
                status,
            });
        }
        Ok(parsed.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kingdom_from_str() {
        assert_eq!("euk".parse::<Kingdom>(), Ok(Kingdom::Eukaryota));
        assert_eq!("Bacteria".parse::<Kingdom>(), Ok(Kingdom::Bacteria));
        assert!("plants".parse::<Kingdom>().is_err());
    }

    #[test]
    fn test_command_line() {
        let annotator = Annotator {
            kingdom: Kingdom::Archaea,
            threads: 4,
            evalue: Some(1e-6),
            ..Annotator::default()
        };
        let cmd = annotator.command(Path::new("genome.fna"));
        assert_eq!(cmd.get_program(), "barrnap");
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["--kingdom", "arc", "--threads", "4", "--evalue", "0.000001", "--quiet", "genome.fna"]
        );
    }

    #[test]
    fn test_missing_executable() {
        let annotator = Annotator {
            program: PathBuf::from("definitely-not-an-installed-annotator"),
            ..Annotator::default()
        };
        let err = annotator.annotate(Path::new("genome.fna")).unwrap_err();
        assert!(matches!(err, WrangleError::MissingExecutable(p) if p == "definitely-not-an-installed-annotator"));
    }

    #[cfg(unix)]
    #[test]
    fn test_streams_annotator_output() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-barrnap");
        let mut f = std::fs::File::create(&script).unwrap();
        writeln!(f, "#!/bin/sh").unwrap();
        writeln!(f, "printf '##gff-version 3\\n'").unwrap();
        writeln!(
            f,
            "printf 'c1\\tbarrnap:0.9\\trRNA\\t11\\t20\\t0\\t+\\t.\\tName=16S_rRNA\\n'"
        )
        .unwrap();
        drop(f);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let annotator = Annotator {
            program: script,
            ..Annotator::default()
        };
        let features = annotator.annotate(Path::new("genome.fna")).unwrap();
        assert_eq!(features["c1"][0].start, 10);
        assert_eq!(features["c1"][0].target, "16S");
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_output_reports_gff_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("garbled-barrnap");
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf '##gff-version 3\\nc1\\tbarrnap\\trRNA\\tten\\n'\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let annotator = Annotator {
            program: script,
            ..Annotator::default()
        };
        assert!(matches!(
            annotator.annotate(Path::new("genome.fna")).unwrap_err(),
            WrangleError::Gff { line: 2, .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_annotator() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken-barrnap");
        std::fs::write(&script, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let annotator = Annotator {
            program: script,
            ..Annotator::default()
        };
        assert!(matches!(
            annotator.annotate(Path::new("genome.fna")).unwrap_err(),
            WrangleError::AnnotatorFailed { .. }
        ));
    }
}
