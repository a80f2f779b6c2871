use clap::*;
use divmsa::libs::splitter;
use divmsa::Alignment;
use rand::SeedableRng;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("split")
        .about("Draw a random backbone from the input sequences")
        .after_help(
            r###"
Draws `--size` sequences uniformly without replacement. They form the backbone;
all others are queries. Gaps are removed from both sets, input order is kept.

The default size is min(100, 20% of the sequences).

Examples:
1. 100 backbone sequences:
   divmsa split seqs.fa -B 100 --backbone bb.fa --query q.fa

2. Another draw:
   divmsa split seqs.fa --seed 7

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input FASTA. [stdin] for standard input"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .short('B')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Backbone size"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed"),
        )
        .arg(
            Arg::new("backbone")
                .long("backbone")
                .num_args(1)
                .default_value("stdout")
                .help("Backbone sequences. [stdout] for screen"),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .num_args(1)
                .default_value("query.fasta")
                .help("Query sequences"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let size = args.get_one::<usize>("size").copied();
    let seed = *args.get_one::<u64>("seed").unwrap();

    let sequences = Alignment::read_fasta(infile)?.ungapped();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let split = splitter::split_backbone(sequences, size, &mut rng)?;

    split
        .backbone
        .write_fasta(args.get_one::<String>("backbone").unwrap())?;
    split
        .query
        .write_fasta(args.get_one::<String>("query").unwrap())?;

    Ok(())
}
