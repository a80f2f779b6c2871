extern crate clap;
use clap::*;

mod cmd_divmsa;

fn main() -> anyhow::Result<()> {
    let app = Command::new("divmsa")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`divmsa` - Divide-and-conquer multiple sequence alignment")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log progress. -vv for per-job detail"),
        )
        .subcommand(cmd_divmsa::run::make_subcommand())
        .subcommand(cmd_divmsa::split::make_subcommand())
        .subcommand(cmd_divmsa::size::make_subcommand())
        .subcommand(cmd_divmsa::filter::make_subcommand())
        .subcommand(cmd_divmsa::decompose::make_subcommand())
        .subcommand(cmd_divmsa::chunks::make_subcommand())
        .subcommand(cmd_divmsa::merge::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Pipeline:
    * run       - Align fragments onto a backbone, end to end

* Stages:
    * split     - Draw a random backbone from the input sequences
    * size      - Alignment subset size from backbone divergence
    * filter    - Remove long-branch taxa from the backbone
    * decompose - Centroid-edge decomposition of the backbone tree
    * chunks    - Fragment chunks per alignment subset
    * merge     - Merge A2M results onto a backbone alignment

"###,
        );

    let matches = app.get_matches();

    let level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    match matches.subcommand() {
        Some(("run", sub_matches)) => cmd_divmsa::run::execute(sub_matches),
        Some(("split", sub_matches)) => cmd_divmsa::split::execute(sub_matches),
        Some(("size", sub_matches)) => cmd_divmsa::size::execute(sub_matches),
        Some(("filter", sub_matches)) => cmd_divmsa::filter::execute(sub_matches),
        Some(("decompose", sub_matches)) => cmd_divmsa::decompose::execute(sub_matches),
        Some(("chunks", sub_matches)) => cmd_divmsa::chunks::execute(sub_matches),
        Some(("merge", sub_matches)) => cmd_divmsa::merge::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
