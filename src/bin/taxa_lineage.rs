use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, ValueEnum};

use seqwrangle_rs::cli::{init_logging, spinner};
use seqwrangle_rs::io::{open_input, open_output};
use seqwrangle_rs::lineage::{resolve_table, LineageOptions, LineageResolver, ValueKind};
use seqwrangle_rs::ranks::parse_rank_list;
use seqwrangle_rs::taxdb::TaxonomyDb;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    Id,
    Name,
    Both,
}

/// Append taxonomy lineage columns to a tab-separated table whose last
/// column holds a taxon ID or scientific name.
#[derive(Parser, Debug)]
#[command(name = "taxa-lineage", version, about)]
#[command(group(ArgGroup::new("taxonomy").required(true).args(["taxdb", "taxdump"])))]
struct Args {
    /// Input table ('-' or omit for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output table (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// taxDB file: taxid<TAB>parent<TAB>name<TAB>rank
    #[arg(long, env = "TAXDB")]
    taxdb: Option<PathBuf>,

    /// NCBI taxdump directory holding nodes.dmp and names.dmp
    #[arg(long, env = "TAXDUMP_DIR")]
    taxdump: Option<PathBuf>,

    /// Ranks to report: abbreviations (d,k,p,c,o,f,g,s), names, or ranges like o-k
    #[arg(short, long, default_value = "d-s")]
    ranks: String,

    /// What to print per rank
    #[arg(long, value_enum, default_value = "name")]
    report: Output,

    /// Value printed for ranks missing from a lineage
    #[arg(long, default_value = "NA")]
    missing: String,

    /// Lines starting with this character are copied verbatim
    #[arg(long, default_value_t = '#')]
    comment: char,

    /// The first line is data, not a header
    #[arg(long)]
    no_header: bool,

    /// 1-based column holding the taxon key (default: last column)
    #[arg(short = 'k', long)]
    key_column: Option<usize>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: Args) -> seqwrangle_rs::Result<()> {
    // Rank tokens first: a typo should fail before the slow database load
    let ranks = parse_rank_list(&args.ranks)?;

    let loading = spinner("Loading taxonomy...", "blue", args.quiet);
    let db = match (&args.taxdb, &args.taxdump) {
        (Some(path), _) => TaxonomyDb::from_taxdb(path)?,
        (None, Some(dir)) => TaxonomyDb::from_taxdump(dir)?,
        (None, None) => unreachable!("clap requires one taxonomy source"),
    };
    loading.finish_and_clear();

    let opts = LineageOptions {
        value_kind: match args.report {
            Output::Id => ValueKind::Id,
            Output::Name => ValueKind::Name,
            Output::Both => ValueKind::Both,
        },
        sentinel: args.missing,
        comment_char: args.comment,
        no_header: args.no_header,
        key_column: args.key_column,
    };
    let resolver = LineageResolver::new(&db, ranks, opts.value_kind, &opts.sentinel);

    let reader = open_input(&args.input)?;
    let mut writer = open_output(args.output.as_ref())?;
    resolve_table(reader, &mut writer, &resolver, &opts)?;
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
