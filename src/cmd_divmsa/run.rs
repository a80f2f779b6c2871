use clap::*;
use divmsa::libs::config::{InputMode, Options};
use divmsa::libs::pipeline::Upp;
use divmsa::libs::tools::{CommandBackboneBuilder, HmmerAligner};
use std::path::PathBuf;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("run")
        .about("Align fragmentary sequences onto a backbone alignment")
        .after_help(
            r###"
Inputs are either:
* only the sequences (`-s`); a random backbone is drawn and handed to the backbone builder, or
* a backbone alignment (`-a`), its tree (`-t`) and the query sequences (`-s`).

Steps:
* Check the backbone size against the backbone alignment
* Pick the alignment subset size from the backbone divergence, unless `-A` is given
* Optionally remove long-branch taxa from the backbone (`-l`); they become queries
* Decompose the backbone tree into alignment subsets, build one profile per subset
* Search every query against every profile, align each to its best profile
* Merge everything onto the backbone

Outputs, in `--outdir`:
* <prefix>_alignment.fasta          - all sequences, insertion columns included
* <prefix>_alignment_masked.fasta   - insertion columns removed
* <prefix>_insertion_columns.txt    - 0-based insertion column indices
* <prefix>_filtered_taxa.txt        - long-branch taxa
* <prefix>_unaligned.fasta          - queries without any hit, when there are some

Examples:
1. From unaligned sequences:
   divmsa run -s seqs.fa -B 100 -p 8 -d out

2. From an existing backbone:
   divmsa run -a backbone.fa -t backbone.nwk -s queries.fa -p 8 -d out

"###,
        )
        .arg(
            Arg::new("sequence_file")
                .long("sequences")
                .short('s')
                .num_args(1)
                .help("Query sequences, or all sequences when no backbone is given"),
        )
        .arg(
            Arg::new("alignment")
                .long("alignment")
                .short('a')
                .num_args(1)
                .help("Backbone alignment in FASTA"),
        )
        .arg(
            Arg::new("tree")
                .long("tree")
                .short('t')
                .num_args(1)
                .help("Backbone tree in Newick"),
        )
        .arg(
            Arg::new("backbone_size")
                .long("backbone-size")
                .short('B')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Number of backbone taxa. Defaults to min(100, 20% of the sequences)"),
        )
        .arg(
            Arg::new("alignment_size")
                .long("alignment-size")
                .short('A')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Maximum taxa per alignment subset. Estimated from divergence when absent"),
        )
        .arg(
            Arg::new("long_branch_filter")
                .long("long-branch-filter")
                .short('l')
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Remove backbone taxa whose pendant edge exceeds this multiple of the median"),
        )
        .arg(
            Arg::new("molecule")
                .long("molecule")
                .short('m')
                .num_args(1)
                .default_value("dna")
                .value_parser([
                    builder::PossibleValue::new("dna"),
                    builder::PossibleValue::new("rna"),
                    builder::PossibleValue::new("amino"),
                ])
                .help("Molecule type"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for the backbone draw and divergence sampling"),
        )
        .arg(
            Arg::new("parallel_merge")
                .long("parallel-merge")
                .action(ArgAction::SetTrue)
                .help("Merge by pairwise tree reduction instead of a sequential fold"),
        )
        .arg(
            Arg::new("missing")
                .long("missing")
                .num_args(1)
                .default_value("skip")
                .value_parser([
                    builder::PossibleValue::new("skip"),
                    builder::PossibleValue::new("fail"),
                ])
                .help("What to do with a job that produced nothing"),
        )
        .arg(
            Arg::new("keep_temp")
                .long("keep-temp")
                .action(ArgAction::SetTrue)
                .help("Keep the intermediate files"),
        )
        .arg(
            Arg::new("backbone_builder")
                .long("backbone-builder")
                .num_args(1)
                .default_value("divmsa-backbone")
                .help("Program that aligns the backbone and infers its tree"),
        )
        .arg(
            Arg::new("hmmbuild")
                .long("hmmbuild")
                .num_args(1)
                .default_value("hmmbuild")
                .help("Path to hmmbuild"),
        )
        .arg(
            Arg::new("hmmsearch")
                .long("hmmsearch")
                .num_args(1)
                .default_value("hmmsearch")
                .help("Path to hmmsearch"),
        )
        .arg(
            Arg::new("hmmalign")
                .long("hmmalign")
                .num_args(1)
                .default_value("hmmalign")
                .help("Path to hmmalign"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('d')
                .num_args(1)
                .default_value(".")
                .help("Output directory"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .short('o')
                .num_args(1)
                .default_value("output")
                .help("Prefix of the output files"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let opt = Options::from_matches(args)?;
    let mode = opt.input_mode()?;

    let builder = match mode {
        InputMode::Sequences { .. } => CommandBackboneBuilder::new(&opt.tools.backbone_builder)?,
        // never called with a ready backbone
        InputMode::Backbone { .. } => CommandBackboneBuilder {
            program: PathBuf::from(&opt.tools.backbone_builder),
        },
    };
    let aligner = HmmerAligner::new(
        &opt.tools.hmmbuild,
        &opt.tools.hmmsearch,
        &opt.tools.hmmalign,
        opt.molecule,
    )?;

    //----------------------------
    // Operating
    //----------------------------
    let report = Upp::new(&opt, &builder, &aligner).run()?;

    //----------------------------
    // Output
    //----------------------------
    log::info!(
        "Aligned {} fragments onto a backbone of {} taxa in {} subsets; {} unaligned",
        report.aligned,
        report.backbone_size,
        report.subsets,
        report.unaligned
    );
    for path in &report.outputs {
        println!("{}", path);
    }

    Ok(())
}
