use clap::*;
use divmsa::libs::phylo::Tree;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("decompose")
        .about("Centroid-edge decomposition of the backbone tree")
        .after_help(
            r###"
The leaves are split recursively at the edge that best balances the two sides,
until no part has more than `--size` leaves.

Output is a TSV of subset index and taxon name, subsets in order.

Example:
   divmsa decompose backbone.nwk -A 10

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Newick tree. [stdin] for standard input"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .short('A')
                .num_args(1)
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Maximum number of taxa per subset"),
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
    let tree = Tree::from_file(args.get_one::<String>("infile").unwrap())?;
    let size = *args.get_one::<usize>("size").unwrap();
    let mut writer = divmsa::writer(args.get_one::<String>("outfile").unwrap())?;

    let parts = tree.centroid_decomposition(size)?;
    log::info!("{} alignment subsets", parts.len());

    for (i, part) in parts.iter().enumerate() {
        for name in part {
            writer.write_fmt(format_args!("{}\t{}\n", i, name))?;
        }
    }

    Ok(())
}
