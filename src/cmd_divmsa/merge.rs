use clap::*;
use divmsa::libs::merge::{self, MergeStrategy};
use divmsa::{Alignment, ColumnMap, ExtendedAlignment, Origin};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("merge")
        .about("Merge A2M results onto a backbone alignment")
        .after_help(
            r###"
Every A2M file must cover all backbone columns: uppercase letters and `-` are
backbone columns, lowercase letters and `.` are insertions.

Insertions at the same anchor are stacked left-aligned into one block as wide as
the longest of them; shorter ones are padded with gaps. Backbone symbols of a
sequence present in several inputs must agree, otherwise the merge fails.

Examples:
1. Merge two chunk results:
   divmsa merge -a backbone.fa c0.a2m c1.a2m -o merged.fa

2. Pairwise reduction, masked output:
   divmsa merge -a backbone.fa *.a2m --parallel --masked masked.fa

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("A2M files in backbone coordinates"),
        )
        .arg(
            Arg::new("alignment")
                .long("alignment")
                .short('a')
                .num_args(1)
                .required(true)
                .help("Backbone alignment in FASTA"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .action(ArgAction::SetTrue)
                .help("Merge by pairwise tree reduction"),
        )
        .arg(
            Arg::new("masked")
                .long("masked")
                .num_args(1)
                .help("Also write the alignment without insertion columns"),
        )
        .arg(
            Arg::new("columns")
                .long("columns")
                .num_args(1)
                .help("Also write the 0-based insertion column indices"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let backbone = Alignment::read_fasta(args.get_one::<String>("alignment").unwrap())?;
    if !backbone.is_aligned() {
        anyhow::bail!("Backbone sequences are not all of the same length");
    }
    let strategy = if args.get_flag("parallel") {
        MergeStrategy::TreeReduction
    } else {
        MergeStrategy::Sequential
    };

    let columns = ColumnMap::identity(backbone.width());
    let mut parts = vec![];
    for (i, infile) in args.get_many::<String>("infiles").unwrap().enumerate() {
        let origin = Origin::Chunk {
            subset: 0,
            chunk: i,
        };
        parts.push(ExtendedAlignment::read_a2m(infile, &columns, origin)?);
    }

    //----------------------------
    // Operating
    //----------------------------
    let acc = ExtendedAlignment::from_backbone(&backbone)?;
    let merged = merge::fold(strategy, acc, parts)?;

    //----------------------------
    // Output
    //----------------------------
    if let Some(file) = args.get_one::<String>("columns") {
        let mut writer = divmsa::writer(file)?;
        for col in merged.insertion_columns() {
            writer.write_fmt(format_args!("{}\n", col))?;
        }
    }
    if let Some(file) = args.get_one::<String>("masked") {
        merged.remove_insertion_columns()?.write_fasta(file)?;
    }
    merged
        .into_alignment()?
        .write_fasta(args.get_one::<String>("outfile").unwrap())?;

    Ok(())
}
