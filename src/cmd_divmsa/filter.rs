use clap::*;
use divmsa::libs::long_branch;
use divmsa::libs::phylo::Tree;
use divmsa::Alignment;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("filter")
        .about("Remove long-branch taxa from the backbone")
        .after_help(
            r###"
A leaf is removed when its pendant edge is longer than `--threshold` times the
median pendant edge length. Parents left with one child are collapsed.

With `--alignment`, the removed taxa also leave the backbone alignment; they can
be written ungapped with `--demoted`, ready to be aligned as queries.

Examples:
1. Prune the tree and list the removed taxa:
   divmsa filter backbone.nwk -l 5 --list removed.txt

2. Also shrink the alignment:
   divmsa filter backbone.nwk -l 5 -a backbone.fa --backbone kept.fa --demoted queries.fa

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Backbone tree in Newick. [stdin] for standard input"),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .short('l')
                .num_args(1)
                .required(true)
                .value_parser(value_parser!(f64))
                .help("Multiple of the median pendant edge length"),
        )
        .arg(
            Arg::new("alignment")
                .long("alignment")
                .short('a')
                .num_args(1)
                .help("Backbone alignment in FASTA"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .num_args(1)
                .help("Write the removed taxa, one per line"),
        )
        .arg(
            Arg::new("backbone")
                .long("backbone")
                .num_args(1)
                .requires("alignment")
                .help("Write the remaining backbone alignment"),
        )
        .arg(
            Arg::new("demoted")
                .long("demoted")
                .num_args(1)
                .requires("alignment")
                .help("Write the removed taxa as ungapped sequences"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename for the pruned tree. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let tree = Tree::from_file(args.get_one::<String>("infile").unwrap())?;
    let threshold = *args.get_one::<f64>("threshold").unwrap();
    if threshold.is_nan() || threshold <= 0.0 {
        anyhow::bail!("Threshold must be positive, got {}", threshold);
    }
    let backbone = match args.get_one::<String>("alignment") {
        Some(file) => Alignment::read_fasta(file)?,
        None => Alignment::new(),
    };

    //----------------------------
    // Operating
    //----------------------------
    let filtered = long_branch::filter_long_branches(tree, backbone, Some(threshold));

    //----------------------------
    // Output
    //----------------------------
    let mut writer = divmsa::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_all((filtered.tree.to_newick() + "\n").as_ref())?;

    if let Some(file) = args.get_one::<String>("list") {
        let mut list = divmsa::writer(file)?;
        for name in &filtered.filtered {
            list.write_fmt(format_args!("{}\n", name))?;
        }
    }
    if let Some(file) = args.get_one::<String>("backbone") {
        filtered.backbone.write_fasta(file)?;
    }
    if let Some(file) = args.get_one::<String>("demoted") {
        filtered.demoted.write_fasta(file)?;
    }

    Ok(())
}
