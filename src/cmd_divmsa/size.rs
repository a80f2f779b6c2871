use clap::*;
use divmsa::libs::sizer;
use divmsa::{Alignment, MoleculeType};
use rand::SeedableRng;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("size")
        .about("Alignment subset size from backbone divergence")
        .after_help(
            r###"
The size starts at 10. When the average p-distance of the backbone exceeds 0.60,
it doubles for as long as the doubled value stays below the number of taxa.

Amino acid backbones are not measured and always get 10.

Output is a TSV row: subset_size, average_p and max_p.

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Backbone alignment in FASTA. [stdin] for standard input"),
        )
        .arg(
            Arg::new("molecule")
                .long("molecule")
                .short('m')
                .num_args(1)
                .default_value("dna")
                .help("Molecule type: dna, rna or amino"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for pair sampling"),
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
    let infile = args.get_one::<String>("infile").unwrap();
    let molecule: MoleculeType = args.get_one::<String>("molecule").unwrap().parse()?;
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = divmsa::writer(args.get_one::<String>("outfile").unwrap())?;

    let backbone = Alignment::read_fasta(infile)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let sizing = sizer::subset_size(&backbone, molecule, &mut rng);

    let fmt = |v: Option<f64>| v.map_or("NA".to_string(), |p| format!("{:.4}", p));
    writer.write_fmt(format_args!(
        "{}\t{}\t{}\n",
        sizing.subset_size,
        fmt(sizing.average_p),
        fmt(sizing.max_p)
    ))?;

    Ok(())
}
