use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser};

use seqwrangle_rs::annotator::{Annotator, Kingdom};
use seqwrangle_rs::cli::{init_logging, spinner};
use seqwrangle_rs::extract::{extract_regions, write_regions_gff, ExtractOptions};
use seqwrangle_rs::fasta::FastaReader;
use seqwrangle_rs::io::{display_name, open_input, open_output};
use seqwrangle_rs::its::ItsLimits;
use seqwrangle_rs::{annotate_rrna, AnnotationSource, WrangleError};

/// Extract rRNA genes and the ITS spacers between them from a genome,
/// using a precomputed GFF or running barrnap.
#[derive(Parser, Debug)]
#[command(name = "extract-rrna", version, about)]
#[command(group(ArgGroup::new("input").required(true).multiple(true).args(["fasta", "gff"])))]
struct Args {
    /// Genome FASTA (plain or gzipped)
    fasta: Option<PathBuf>,

    /// Precomputed rRNA GFF3; sequences are taken from its ##FASTA section
    /// when no FASTA is given
    #[arg(long)]
    gff: Option<PathBuf>,

    /// Kingdom passed to the annotator (bac, arc, euk, mito)
    #[arg(long, default_value = "bac")]
    kingdom: Kingdom,

    /// Annotator threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Annotator e-value cutoff
    #[arg(long)]
    evalue: Option<f64>,

    /// Annotator executable
    #[arg(long, env = "BARRNAP", default_value = "barrnap")]
    barrnap: PathBuf,

    /// Shortest spacer reported as ITS
    #[arg(long, default_value_t = 1)]
    min_its_length: usize,

    /// Longest spacer reported as ITS
    #[arg(long, default_value_t = 1500)]
    max_its_length: usize,

    /// Prefix for region IDs (default: the contig ID)
    #[arg(long)]
    prefix: Option<String>,

    /// Extracted regions (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wrap sequences at this many columns (0 = single line)
    #[arg(long, default_value_t = 0)]
    line_width: usize,

    /// Emit only the ITS regions
    #[arg(long)]
    only_its: bool,

    /// Also write the features, ITS included, as GFF3
    #[arg(long)]
    gff_out: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: Args) -> seqwrangle_rs::Result<()> {
    let source = match &args.gff {
        Some(path) => AnnotationSource::Gff(path.clone()),
        None => AnnotationSource::Annotator(Annotator {
            program: args.barrnap.clone(),
            kingdom: args.kingdom,
            threads: args.threads,
            evalue: args.evalue,
        }),
    };
    let limits = ItsLimits {
        min_len: args.min_its_length,
        max_len: args.max_its_length,
    };

    let annotating = spinner(
        &format!("Annotating rRNA with {}...", source.name()),
        "yellow",
        args.quiet,
    );
    let annotation = annotate_rrna(args.fasta.as_deref(), &source, limits, args.prefix.as_deref())?;
    annotating.finish_and_clear();
    log::info!(
        "{} regions on {} sequences, {} ITS",
        annotation.region_count(),
        annotation.regions.len(),
        annotation.its_count
    );

    let opts = ExtractOptions {
        only_its: args.only_its,
        gff_name: Some(source.name()),
        fasta_name: args.fasta.as_ref().map(display_name),
        line_width: args.line_width,
    };

    let mut writer = open_output(args.output.as_ref())?;
    let stats = match &args.fasta {
        Some(path) => {
            let records = FastaReader::new(open_input(path)?, display_name(path));
            extract_regions(records, &annotation.regions, &mut writer, &opts)?
        }
        None if !annotation.embedded_sequences.is_empty() => {
            let records = annotation.embedded_sequences.iter().cloned().map(Ok);
            extract_regions(records, &annotation.regions, &mut writer, &opts)?
        }
        None => {
            return Err(WrangleError::Fasta {
                source_name: source.name(),
                message: "no FASTA given and the GFF has no ##FASTA section".to_string(),
            })
        }
    };
    writer.flush()?;

    if stats.contigs < annotation.regions.len() {
        log::warn!(
            "{} annotated sequences were not found in the FASTA input",
            annotation.regions.len() - stats.contigs
        );
    }

    if let Some(path) = &args.gff_out {
        let mut writer = open_output(Some(path))?;
        write_regions_gff(&mut writer, &annotation.features, &annotation.regions)?;
        writer.flush()?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
