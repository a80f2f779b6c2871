use crate::libs::alignment::MoleculeType;
use crate::libs::error::DivError;
use crate::libs::merge::{MergeStrategy, MissingPolicy};
use clap::ArgMatches;

/// Names or paths of the external programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub backbone_builder: String,
    pub hmmbuild: String,
    pub hmmsearch: String,
    pub hmmalign: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            backbone_builder: "divmsa-backbone".to_string(),
            hmmbuild: "hmmbuild".to_string(),
            hmmsearch: "hmmsearch".to_string(),
            hmmalign: "hmmalign".to_string(),
        }
    }
}

/// Run options, built once and passed by reference to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub sequence_file: Option<String>,
    pub alignment_file: Option<String>,
    pub tree_file: Option<String>,
    pub backbone_size: Option<usize>,
    pub alignment_size: Option<usize>,
    pub long_branch_filter: Option<f64>,
    pub workers: usize,
    pub molecule: MoleculeType,
    pub seed: u64,
    pub outdir: String,
    pub prefix: String,
    pub merge_strategy: MergeStrategy,
    pub missing_policy: MissingPolicy,
    pub keep_temp: bool,
    pub tools: ToolPaths,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sequence_file: None,
            alignment_file: None,
            tree_file: None,
            backbone_size: None,
            alignment_size: None,
            long_branch_filter: None,
            workers: 1,
            molecule: MoleculeType::Nucleotide,
            seed: 42,
            outdir: ".".to_string(),
            prefix: "output".to_string(),
            merge_strategy: MergeStrategy::Sequential,
            missing_policy: MissingPolicy::Skip,
            keep_temp: false,
            tools: ToolPaths::default(),
        }
    }
}

/// Which inputs a run starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Only unaligned sequences; the backbone is built from a random sample.
    Sequences { sequences: String },
    /// A ready backbone alignment and tree, plus the fragments to insert.
    Backbone {
        alignment: String,
        tree: String,
        fragments: String,
    },
}

impl Options {
    /// Reads the options of the `run` subcommand.
    pub fn from_matches(args: &ArgMatches) -> Result<Self, DivError> {
        let string = |id: &str| args.get_one::<String>(id).cloned();
        let defaults = Options::default();

        let molecule = match args.get_one::<String>("molecule") {
            Some(m) => m.parse()?,
            None => defaults.molecule,
        };
        let merge_strategy = if args.get_flag("parallel_merge") {
            MergeStrategy::TreeReduction
        } else {
            MergeStrategy::Sequential
        };
        let missing_policy = match args.get_one::<String>("missing") {
            Some(p) => p.parse()?,
            None => defaults.missing_policy,
        };

        let opt = Options {
            sequence_file: string("sequence_file"),
            alignment_file: string("alignment"),
            tree_file: string("tree"),
            backbone_size: args.get_one::<usize>("backbone_size").copied(),
            alignment_size: args.get_one::<usize>("alignment_size").copied(),
            long_branch_filter: args.get_one::<f64>("long_branch_filter").copied(),
            workers: args
                .get_one::<usize>("parallel")
                .copied()
                .unwrap_or(defaults.workers),
            molecule,
            seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
            outdir: string("outdir").unwrap_or(defaults.outdir),
            prefix: string("prefix").unwrap_or(defaults.prefix),
            merge_strategy,
            missing_policy,
            keep_temp: args.get_flag("keep_temp"),
            tools: ToolPaths {
                backbone_builder: string("backbone_builder")
                    .unwrap_or(defaults.tools.backbone_builder),
                hmmbuild: string("hmmbuild").unwrap_or(defaults.tools.hmmbuild),
                hmmsearch: string("hmmsearch").unwrap_or(defaults.tools.hmmsearch),
                hmmalign: string("hmmalign").unwrap_or(defaults.tools.hmmalign),
            },
        };
        opt.validate()?;
        Ok(opt)
    }

    /// Checks values that make no sense on their own.
    pub fn validate(&self) -> Result<(), DivError> {
        if self.workers == 0 {
            return Err(DivError::Configuration(
                "Worker count must be at least 1".to_string(),
            ));
        }
        if self.backbone_size == Some(0) {
            return Err(DivError::Configuration(
                "Backbone size must be at least 1".to_string(),
            ));
        }
        if self.alignment_size == Some(0) {
            return Err(DivError::Configuration(
                "Alignment subset size must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.long_branch_filter {
            if t.is_nan() || t <= 0.0 {
                return Err(DivError::Configuration(format!(
                    "Long branch multiplier must be positive, got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Either sequences alone, or a backbone alignment with its tree and the fragments.
    pub fn input_mode(&self) -> Result<InputMode, DivError> {
        match (&self.sequence_file, &self.alignment_file, &self.tree_file) {
            (Some(sequences), None, None) => Ok(InputMode::Sequences {
                sequences: sequences.clone(),
            }),
            (Some(fragments), Some(alignment), Some(tree)) => Ok(InputMode::Backbone {
                alignment: alignment.clone(),
                tree: tree.clone(),
                fragments: fragments.clone(),
            }),
            _ => Err(DivError::Configuration(
                "Either give the backbone alignment, its tree and the query sequences, or only the sequences".to_string(),
            )),
        }
    }

    /// `<outdir>/<prefix>_<suffix>`
    pub fn output_path(&self, suffix: &str) -> String {
        std::path::Path::new(&self.outdir)
            .join(format!("{}_{}", self.prefix, suffix))
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_mode() {
        let mut opt = Options {
            sequence_file: Some("seqs.fa".to_string()),
            ..Default::default()
        };
        assert_eq!(
            opt.input_mode().unwrap(),
            InputMode::Sequences {
                sequences: "seqs.fa".to_string()
            }
        );

        opt.alignment_file = Some("bb.fa".to_string());
        assert!(matches!(
            opt.input_mode(),
            Err(DivError::Configuration(_))
        ));

        opt.tree_file = Some("bb.nwk".to_string());
        assert_eq!(
            opt.input_mode().unwrap(),
            InputMode::Backbone {
                alignment: "bb.fa".to_string(),
                tree: "bb.nwk".to_string(),
                fragments: "seqs.fa".to_string(),
            }
        );

        opt.sequence_file = None;
        assert!(opt.input_mode().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Options::default().validate().is_ok());

        let bad = [
            Options {
                workers: 0,
                ..Default::default()
            },
            Options {
                backbone_size: Some(0),
                ..Default::default()
            },
            Options {
                alignment_size: Some(0),
                ..Default::default()
            },
            Options {
                long_branch_filter: Some(-1.0),
                ..Default::default()
            },
        ];
        for opt in bad {
            assert!(matches!(opt.validate(), Err(DivError::Configuration(_))));
        }
    }

    #[test]
    fn test_output_path() {
        let opt = Options {
            outdir: "out".to_string(),
            prefix: "upp".to_string(),
            ..Default::default()
        };
        assert_eq!(
            std::path::PathBuf::from(opt.output_path("alignment.fasta")),
            std::path::Path::new("out").join("upp_alignment.fasta")
        );
    }
}
