//! The complete run: backbone, decomposition, search, alignment and merge.

use crate::libs::alignment::Alignment;
use crate::libs::chunks;
use crate::libs::config::{InputMode, Options};
use crate::libs::decomposition::{JobResult, RootProblem};
use crate::libs::error::DivError;
use crate::libs::extended::ExtendedAlignment;
use crate::libs::jobs::JobPool;
use crate::libs::long_branch;
use crate::libs::merge::{self, MissingPolicy};
use crate::libs::phylo::Tree;
use crate::libs::sizer;
use crate::libs::splitter;
use crate::libs::tools::{BackboneBuilder, ProfileAligner};
use itertools::Itertools;
use rand::SeedableRng;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What a run did, for the caller to report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub backbone_size: usize,
    pub subset_size: usize,
    pub subsets: usize,
    pub chunks_per_subset: usize,
    pub filtered: Vec<String>,
    /// Fragment pool size, long-branch taxa included.
    pub fragments: usize,
    /// Fragments present in the merged alignment.
    pub aligned: usize,
    pub unaligned: usize,
    pub outputs: Vec<String>,
}

/// The UPP driver. Collaborators are injected so they can be swapped.
pub struct Upp<'a> {
    options: &'a Options,
    builder: &'a dyn BackboneBuilder,
    aligner: &'a dyn ProfileAligner,
}

struct Inputs {
    backbone: Alignment,
    tree: Tree,
    fragments: Alignment,
    /// Size the backbone is expected to have.
    stated: Option<usize>,
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Tree leaves and backbone rows must name the same taxa.
fn check_taxa(tree: &Tree, backbone: &Alignment) -> Result<(), DivError> {
    let leaves = tree.leaf_names();
    if let Some(name) = leaves.iter().find(|n| !backbone.contains(n)) {
        return Err(DivError::Configuration(format!(
            "Tree leaf {} is not in the backbone alignment",
            name
        )));
    }
    let leaves: std::collections::HashSet<&str> = leaves.iter().map(|n| n.as_str()).collect();
    if let Some(name) = backbone.names().find(|n| !leaves.contains(n.as_str())) {
        return Err(DivError::Configuration(format!(
            "Backbone taxon {} is not a leaf of the tree",
            name
        )));
    }
    Ok(())
}

impl<'a> Upp<'a> {
    pub fn new(
        options: &'a Options,
        builder: &'a dyn BackboneBuilder,
        aligner: &'a dyn ProfileAligner,
    ) -> Self {
        Self {
            options,
            builder,
            aligner,
        }
    }

    pub fn run(&self) -> anyhow::Result<Report> {
        let opt = self.options;
        opt.validate()?;
        let mode = opt.input_mode()?;

        std::fs::create_dir_all(&opt.outdir)?;
        let pool = JobPool::new(opt.workers, Path::new(&opt.outdir), opt.keep_temp)?;
        let mut rng = rand::rngs::StdRng::seed_from_u64(opt.seed);

        let inputs = match mode {
            InputMode::Sequences { sequences } => self.generate_backbone(&sequences, &pool, &mut rng)?,
            InputMode::Backbone {
                alignment,
                tree,
                fragments,
            } => Inputs {
                backbone: Alignment::read_fasta(&alignment)?,
                tree: Tree::from_file(&tree)?,
                fragments: Alignment::read_fasta(&fragments)?.ungapped(),
                stated: opt.backbone_size,
            },
        };

        check_taxa(&inputs.tree, &inputs.backbone)?;

        let mut report = Report::default();
        let backbone_size = inputs.backbone.num_taxa();
        if let Some(stated) = inputs.stated {
            if stated != backbone_size {
                return Err(DivError::Sizing {
                    stated,
                    actual: backbone_size,
                }
                .into());
            }
        }
        if !inputs.backbone.is_aligned() {
            return Err(DivError::Configuration(
                "Backbone sequences are not all of the same length".to_string(),
            )
            .into());
        }
        report.backbone_size = backbone_size;

        let subset_size = match opt.alignment_size {
            Some(size) => size,
            None => {
                log::info!("Alignment subset size not given. Calculating subset size.");
                sizer::subset_size(&inputs.backbone, opt.molecule, &mut rng).subset_size
            }
        };
        report.subset_size = subset_size;

        let filtered =
            long_branch::filter_long_branches(inputs.tree, inputs.backbone, opt.long_branch_filter);
        let mut fragments = inputs.fragments;
        for (name, seq) in filtered.demoted.into_iter_pairs() {
            fragments.push(name, seq)?;
        }
        report.filtered = filtered.filtered;

        let parts = filtered.tree.centroid_decomposition(subset_size)?;
        let mut root = RootProblem::new(filtered.backbone, filtered.tree, fragments, parts)?;
        report.subsets = root.num_subsets();
        log::debug!(
            "Alignment subset sizes: {}",
            root.subsets().map(|s| s.taxa.len()).join(",")
        );

        report.fragments = root.fragments.num_taxa();
        let chunk_count = chunks::chunk_count(root.num_subsets(), opt.workers)?;
        report.chunks_per_subset = chunk_count;
        log::info!(
            "{} alignment subsets, {} fragment chunks each, {} fragments",
            root.num_subsets(),
            chunk_count,
            root.fragments.num_taxa()
        );

        self.build_profiles(&mut root, &pool)?;
        self.search_fragments(&mut root, &pool, chunk_count)?;

        let (assigned, unaligned) = root.assign_fragments();
        for (subset, fragments) in root.subsets_mut().zip(assigned.iter()) {
            subset.set_fragments(fragments, chunk_count);
        }
        if !unaligned.is_empty() {
            log::warn!(
                "{} fragments had no hit and are left unaligned",
                unaligned.num_taxa()
            );
        }
        report.unaligned = unaligned.num_taxa();

        self.align_fragments(&mut root, &pool)?;

        let merged = merge::merge_problem(&mut root, opt.merge_strategy, opt.missing_policy)?;
        report.aligned = merged.num_taxa().saturating_sub(root.backbone.num_taxa());
        report.outputs = self.write_outputs(merged, &report.filtered, &unaligned)?;

        Ok(report)
    }

    fn generate_backbone(
        &self,
        sequences: &str,
        pool: &JobPool,
        rng: &mut rand::rngs::StdRng,
    ) -> anyhow::Result<Inputs> {
        let opt = self.options;
        log::info!("Reading input sequences: {}", sequences);
        let all = Alignment::read_fasta(sequences)?.ungapped();

        let split = splitter::split_backbone(all, opt.backbone_size, rng)?;
        let size = split.backbone.num_taxa();
        log::info!("Backbone size set to: {}", size);

        let input = pool.path("backbone.fasta");
        split.backbone.write_fasta(&path_str(&input))?;

        log::info!("Generating backbone alignment and tree");
        let files = self
            .builder
            .build(
                &input,
                size,
                Path::new(&opt.outdir),
                opt.molecule,
                opt.workers,
            )
            .ok_or_else(|| anyhow::anyhow!("Backbone builder produced no alignment and tree"))?;
        log::info!(
            "Backbone alignment written to {}, tree to {}",
            files.alignment.display(),
            files.tree.display()
        );

        Ok(Inputs {
            backbone: Alignment::read_fasta(&path_str(&files.alignment))?,
            tree: Tree::from_file(&path_str(&files.tree))?,
            fragments: split.query,
            stated: Some(size),
        })
    }

    fn build_profiles(&self, root: &mut RootProblem, pool: &JobPool) -> anyhow::Result<()> {
        let mut jobs: Vec<(PathBuf, PathBuf)> = Vec::new();
        for subset in root.subsets() {
            let input = pool.path(&format!("a_{}.fasta", subset.index));
            subset.alignment.write_fasta(&path_str(&input))?;
            jobs.push((input, pool.path(&format!("a_{}.hmm", subset.index))));
        }

        let results = pool.run(&jobs, |(input, output)| {
            JobResult::from_option(self.aligner.build_profile(input, output))
        });
        for (subset, result) in root.subsets_mut().zip(results) {
            if !result.is_done() {
                self.tolerate(&format!("profile of subset {}", subset.index))?;
            }
            subset.profile = result;
        }
        Ok(())
    }

    fn search_fragments(
        &self,
        root: &mut RootProblem,
        pool: &JobPool,
        chunk_count: usize,
    ) -> anyhow::Result<()> {
        let names: Vec<&String> = root.fragments.names().collect();
        let mut chunk_files: Vec<Option<PathBuf>> = Vec::new();
        for (k, group) in chunks::divide(&names, chunk_count).iter().enumerate() {
            if group.is_empty() {
                chunk_files.push(None);
                continue;
            }
            let path = pool.path(&format!("fc_{}.fasta", k));
            root.fragments.sub_alignment(group).write_fasta(&path_str(&path))?;
            chunk_files.push(Some(path));
        }

        // (subset position, chunk, profile, fragments, output)
        let mut jobs = Vec::new();
        for (position, subset) in root.subsets().enumerate() {
            let Some(profile) = subset.profile.done() else {
                continue;
            };
            for (k, file) in chunk_files.iter().enumerate() {
                if let Some(file) = file {
                    let output = pool.path(&format!("a_{}_fc_{}.tblout", subset.index, k));
                    jobs.push((position, k, profile.clone(), file.clone(), output));
                }
            }
        }
        log::info!("Running {} search jobs", jobs.len());

        let results = pool.run(&jobs, |(_, _, profile, fragments, output)| {
            JobResult::from_option(self.aligner.search(profile, fragments, output))
        });

        let mut subsets: Vec<_> = root.subsets_mut().collect();
        for subset in subsets.iter_mut() {
            subset.hits = chunk_files
                .iter()
                .map(|f| match f {
                    Some(_) => JobResult::Missing,
                    None => JobResult::Empty,
                })
                .collect();
        }
        for ((position, k, ..), result) in jobs.iter().zip(results) {
            if !result.is_done() {
                self.tolerate(&format!("search of subset {} chunk {}", subsets[*position].index, k))?;
            }
            subsets[*position].hits[*k] = result;
        }
        Ok(())
    }

    fn align_fragments(&self, root: &mut RootProblem, pool: &JobPool) -> anyhow::Result<()> {
        // (subset position, chunk, profile, fragments, output)
        let mut jobs = Vec::new();
        for (position, subset) in root.subsets().enumerate() {
            for chunk in &subset.chunks {
                if !matches!(chunk.alignment, JobResult::Pending) {
                    continue;
                }
                let Some(profile) = subset.profile.done() else {
                    continue;
                };
                let stem = format!("a_{}_ac_{}", subset.index, chunk.index);
                let input = pool.path(&format!("{}.fasta", stem));
                chunk.fragments.write_fasta(&path_str(&input))?;
                jobs.push((
                    position,
                    chunk.index,
                    profile.clone(),
                    input,
                    pool.path(&format!("{}.a2m", stem)),
                ));
            }
        }
        log::info!("Running {} alignment jobs", jobs.len());

        let results = pool.run(&jobs, |(_, _, profile, fragments, output)| {
            JobResult::from_option(self.aligner.align(profile, fragments, output))
        });

        let mut subsets: Vec<_> = root.subsets_mut().collect();
        for subset in subsets.iter_mut() {
            for chunk in subset.chunks.iter_mut() {
                if matches!(chunk.alignment, JobResult::Pending) {
                    chunk.alignment = JobResult::Missing;
                }
            }
        }
        for ((position, index, ..), result) in jobs.iter().zip(results) {
            let subset = &mut subsets[*position];
            let origin = subset.chunks[*index].origin();
            subset.chunks[*index].alignment = match result {
                JobResult::Done(path) => JobResult::Done(ExtendedAlignment::read_a2m(
                    &path_str(&path),
                    &subset.columns,
                    origin,
                )?),
                _ => JobResult::Missing,
            };
        }
        Ok(())
    }

    /// Missing intermediate results are warned about or fatal, as configured.
    fn tolerate(&self, label: &str) -> Result<(), DivError> {
        match self.options.missing_policy {
            MissingPolicy::Skip => {
                log::warn!("No result for {}", label);
                Ok(())
            }
            MissingPolicy::Fail => Err(DivError::MissingResult(label.to_string())),
        }
    }

    fn write_outputs(
        &self,
        merged: ExtendedAlignment,
        filtered: &[String],
        unaligned: &Alignment,
    ) -> anyhow::Result<Vec<String>> {
        let opt = self.options;
        let mut outputs = Vec::new();
        log::info!("Generating output");

        let columns_file = opt.output_path("insertion_columns.txt");
        let mut writer = crate::writer(&columns_file)?;
        for col in merged.insertion_columns() {
            writeln!(writer, "{}", col)?;
        }
        writer.flush()?;
        outputs.push(columns_file);

        let masked = merged.remove_insertion_columns()?;
        let unmasked_file = opt.output_path("alignment.fasta");
        merged.into_alignment()?.write_fasta(&unmasked_file)?;
        log::info!("Unmasked alignment written to {}", unmasked_file);
        outputs.push(unmasked_file);

        let masked_file = opt.output_path("alignment_masked.fasta");
        masked.write_fasta(&masked_file)?;
        log::info!("Masked alignment written to {}", masked_file);
        outputs.push(masked_file);

        let filtered_file = opt.output_path("filtered_taxa.txt");
        let mut writer = crate::writer(&filtered_file)?;
        for name in filtered {
            writeln!(writer, "{}", name)?;
        }
        writer.flush()?;
        outputs.push(filtered_file);

        if !unaligned.is_empty() {
            let unaligned_file = opt.output_path("unaligned.fasta");
            unaligned.write_fasta(&unaligned_file)?;
            log::info!("Unaligned fragments written to {}", unaligned_file);
            outputs.push(unaligned_file);
        }

        Ok(outputs)
    }
}
