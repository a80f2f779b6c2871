use clap::*;
use divmsa::libs::chunks;
use divmsa::Alignment;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("chunks")
        .about("Fragment chunks per alignment subset")
        .after_help(
            r###"
Each alignment subset gets lcm(subsets, workers) / subsets fragment chunks, so the
subsets * chunks jobs fill every worker in each round.

Output is a TSV row: subsets, workers, chunks and jobs.

With `--fragments` and `--outdir`, the fragments are also divided into that many
near-equal files, <outdir>/fc_<i>.fasta.

Examples:
1. Plan only:
   divmsa chunks -S 3 -p 4

2. Divide the fragments:
   divmsa chunks -S 3 -p 4 --fragments queries.fa --outdir chunks

"###,
        )
        .arg(
            Arg::new("subsets")
                .long("subsets")
                .short('S')
                .num_args(1)
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Number of alignment subsets"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of workers"),
        )
        .arg(
            Arg::new("fragments")
                .long("fragments")
                .num_args(1)
                .requires("outdir")
                .help("Fragments to divide"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('d')
                .num_args(1)
                .help("Directory for the fragment chunks"),
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
    let subsets = *args.get_one::<usize>("subsets").unwrap();
    let workers = *args.get_one::<usize>("parallel").unwrap();
    let mut writer = divmsa::writer(args.get_one::<String>("outfile").unwrap())?;

    let count = chunks::chunk_count(subsets, workers)?;
    writer.write_fmt(format_args!(
        "{}\t{}\t{}\t{}\n",
        subsets,
        workers,
        count,
        subsets * count
    ))?;

    if let Some(file) = args.get_one::<String>("fragments") {
        let outdir = std::path::Path::new(args.get_one::<String>("outdir").unwrap());
        std::fs::create_dir_all(outdir)?;

        let fragments = Alignment::read_fasta(file)?;
        let names: Vec<&String> = fragments.names().collect();
        for (i, group) in chunks::divide(&names, count).iter().enumerate() {
            let path = outdir.join(format!("fc_{}.fasta", i));
            fragments
                .sub_alignment(group)
                .write_fasta(&path.to_string_lossy())?;
        }
    }

    Ok(())
}
