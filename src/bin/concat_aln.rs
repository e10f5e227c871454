use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use seqwrangle_rs::cli::{init_logging, spinner};
use seqwrangle_rs::concat::{concatenate, read_alignment, ConcatOptions};
use seqwrangle_rs::id_matcher::IdMatcher;
use seqwrangle_rs::io::open_output;

/// Concatenate FASTA alignments by sequence identifier and write a RAxML
/// partition file describing the column range of each input.
#[derive(Parser, Debug)]
#[command(name = "concat-aln", version, about)]
struct Args {
    /// Input alignments, in concatenation order ('-' reads stdin once)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Concatenated alignment (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// RAxML partition file
    #[arg(short, long)]
    partitions: Option<PathBuf>,

    /// Substitution model written on each partition line
    #[arg(long, default_value = "DNA")]
    model: String,

    /// Symbol used to pad identifiers missing from an input
    #[arg(long, default_value = "-", value_parser = parse_gap)]
    gap: u8,

    /// Regex whose first capture group (or whole match) is the identifier
    #[arg(long, conflicts_with = "id_sub")]
    id_regex: Option<String>,

    /// Regex replaced in each identifier (requires --id-replace)
    #[arg(long, requires = "id_replace")]
    id_sub: Option<String>,

    /// Replacement for --id-sub; $1 etc. refer to capture groups
    #[arg(long, requires = "id_sub")]
    id_replace: Option<String>,

    /// Match against the whole header line instead of its first word
    #[arg(long)]
    full_header: bool,

    /// Wrap sequences at this many columns (0 = single line)
    #[arg(long, default_value_t = 0)]
    line_width: usize,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn matcher(args: &Args) -> seqwrangle_rs::Result<IdMatcher> {
    match (&args.id_regex, &args.id_sub, &args.id_replace) {
        (Some(pattern), _, _) => IdMatcher::capture(pattern),
        (None, Some(pattern), Some(replacement)) => IdMatcher::substitute(pattern, replacement),
        _ => Ok(IdMatcher::Identity),
    }
}

fn parse_gap(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii_graphic() => Ok(*b),
        _ => Err(format!("'{s}' is not a single printable ASCII symbol")),
    }
}

fn run(args: Args) -> seqwrangle_rs::Result<()> {
    let opts = ConcatOptions {
        matcher: matcher(&args)?,
        full_header: args.full_header,
        gap: args.gap,
        model: args.model.clone(),
        line_width: args.line_width,
    };
    log::debug!("Identifier matcher: {}", opts.matcher);

    let reading = spinner("Reading alignments...", "green", args.quiet);
    let mut alignments = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        reading.set_message(format!("Reading {}", path.display()));
        alignments.push(read_alignment(path, &opts)?);
    }
    reading.finish_and_clear();

    let concatenation = concatenate(&alignments, opts.gap)?;

    let mut writer = open_output(args.output.as_ref())?;
    concatenation.write_fasta(&mut writer, opts.line_width)?;
    writer.flush()?;

    if let Some(path) = &args.partitions {
        let mut writer = open_output(Some(path))?;
        concatenation.write_partitions(&mut writer, &opts.model)?;
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
