use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use seqwrangle_rs::cli::init_logging;
use seqwrangle_rs::columns::{parse_columns, select_alignment, BoundsPolicy, SelectOptions};
use seqwrangle_rs::fasta::FastaReader;
use seqwrangle_rs::io::{display_name, open_input, open_output};

/// Keep only the given 0-based columns (or codons) of a FASTA alignment.
#[derive(Parser, Debug)]
#[command(name = "select-columns", version, about)]
struct Args {
    /// Input alignment ('-' or omit for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Columns to keep, e.g. 0,2,5-7; order and repeats are kept
    #[arg(short, long)]
    columns: String,

    /// Treat each index as a codon (columns 3i, 3i+1, 3i+2)
    #[arg(long)]
    codon: bool,

    /// Drop columns past the end of a sequence instead of failing
    #[arg(long)]
    skip_out_of_range: bool,

    /// Output alignment (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

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

fn run(args: Args) -> seqwrangle_rs::Result<()> {
    let columns = parse_columns(&args.columns)?;
    let opts = SelectOptions {
        codon: args.codon,
        bounds: if args.skip_out_of_range {
            BoundsPolicy::Skip
        } else {
            BoundsPolicy::Error
        },
        line_width: args.line_width,
    };

    let records = FastaReader::new(open_input(&args.input)?, display_name(&args.input));
    let mut writer = open_output(args.output.as_ref())?;
    select_alignment(records, &columns, &mut writer, &opts)?;
    writer.flush()?;
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
