//! Out-of-process collaborators: the backbone builder and the profile aligner.
//!
//! Every call runs one external program and reports an absent result when the
//! program fails or leaves no output behind. Retrying is left to the caller.

use crate::libs::alignment::MoleculeType;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One line of a profile search: a fragment and its bit score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub name: String,
    pub score: f64,
}

/// Files produced by a backbone build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackboneFiles {
    pub alignment: PathBuf,
    pub tree: PathBuf,
}

pub trait BackboneBuilder: Sync {
    fn build(
        &self,
        sequences: &Path,
        backbone_size: usize,
        outdir: &Path,
        molecule: MoleculeType,
        workers: usize,
    ) -> Option<BackboneFiles>;
}

/// Trains a profile per alignment subset, scores fragments against it and aligns them.
pub trait ProfileAligner: Sync {
    /// Writes a profile for the aligned FASTA `alignment` to `output`.
    fn build_profile(&self, alignment: &Path, output: &Path) -> Option<PathBuf>;

    /// Scores every fragment in `fragments` against `profile`.
    /// Fragments without a hit are simply not listed.
    fn search(&self, profile: &Path, fragments: &Path, output: &Path) -> Option<Vec<SearchHit>>;

    /// Aligns `fragments` to `profile`, writing A2M to `output`.
    fn align(&self, profile: &Path, fragments: &Path, output: &Path) -> Option<PathBuf>;
}

/// Finds `program` on PATH, or accepts it as an explicit path.
pub fn locate(program: &str) -> anyhow::Result<PathBuf> {
    which::which(program)
        .map_err(|_| anyhow::anyhow!("{} not found. Install it or pass its path.", program))
}

fn run(cmd: &mut Command) -> bool {
    log::debug!("Running {:?}", cmd);
    match cmd.stdout(Stdio::null()).output() {
        Ok(out) if out.status.success() => true,
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            log::warn!(
                "{:?} exited with {}: {}",
                cmd.get_program(),
                out.status,
                stderr.trim()
            );
            false
        }
        Err(e) => {
            log::warn!("Failed to execute {:?}: {}", cmd.get_program(), e);
            false
        }
    }
}

fn existing(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        log::warn!("Expected output {} was not produced", path.display());
        None
    }
}

/// Runs an external backbone pipeline.
///
/// The program is called as
/// `<program> -i <sequences> -o <outdir> -B <size> -m <dna|amino> -p <workers>`
/// and must leave `backbone.fasta` and `backbone.nwk` in `<outdir>`.
#[derive(Debug, Clone)]
pub struct CommandBackboneBuilder {
    pub program: PathBuf,
}

impl CommandBackboneBuilder {
    pub fn new(program: &str) -> anyhow::Result<Self> {
        Ok(Self {
            program: locate(program)?,
        })
    }
}

impl BackboneBuilder for CommandBackboneBuilder {
    fn build(
        &self,
        sequences: &Path,
        backbone_size: usize,
        outdir: &Path,
        molecule: MoleculeType,
        workers: usize,
    ) -> Option<BackboneFiles> {
        let ok = run(Command::new(&self.program)
            .arg("-i")
            .arg(sequences)
            .arg("-o")
            .arg(outdir)
            .arg("-B")
            .arg(backbone_size.to_string())
            .arg("-m")
            .arg(molecule.as_str())
            .arg("-p")
            .arg(workers.to_string()));
        if !ok {
            return None;
        }
        Some(BackboneFiles {
            alignment: existing(&outdir.join("backbone.fasta"))?,
            tree: existing(&outdir.join("backbone.nwk"))?,
        })
    }
}

/// HMMER3: hmmbuild, hmmsearch and hmmalign.
#[derive(Debug, Clone)]
pub struct HmmerAligner {
    pub hmmbuild: PathBuf,
    pub hmmsearch: PathBuf,
    pub hmmalign: PathBuf,
    pub molecule: MoleculeType,
}

impl HmmerAligner {
    pub fn new(
        hmmbuild: &str,
        hmmsearch: &str,
        hmmalign: &str,
        molecule: MoleculeType,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            hmmbuild: locate(hmmbuild)?,
            hmmsearch: locate(hmmsearch)?,
            hmmalign: locate(hmmalign)?,
            molecule,
        })
    }

    fn molecule_flag(&self) -> &'static str {
        if self.molecule.is_nucleotide() {
            "--dna"
        } else {
            "--amino"
        }
    }
}

impl ProfileAligner for HmmerAligner {
    fn build_profile(&self, alignment: &Path, output: &Path) -> Option<PathBuf> {
        // every non-empty column becomes a match state
        let ok = run(Command::new(&self.hmmbuild)
            .args(["--symfrac", "0.0", "--informat", "afa", "--cpu", "1"])
            .arg(self.molecule_flag())
            .arg(output)
            .arg(alignment));
        if ok {
            existing(output)
        } else {
            None
        }
    }

    fn search(&self, profile: &Path, fragments: &Path, output: &Path) -> Option<Vec<SearchHit>> {
        let ok = run(Command::new(&self.hmmsearch)
            .args(["--noali", "-E", "99999999", "--cpu", "1"])
            .arg("--tblout")
            .arg(output)
            .arg(profile)
            .arg(fragments));
        if !ok {
            return None;
        }
        let content = std::fs::read_to_string(existing(output)?).ok()?;
        Some(parse_tblout(&content))
    }

    fn align(&self, profile: &Path, fragments: &Path, output: &Path) -> Option<PathBuf> {
        let ok = run(Command::new(&self.hmmalign)
            .args(["--allcol", "--outformat", "A2M"])
            .arg(self.molecule_flag())
            .arg("-o")
            .arg(output)
            .arg(profile)
            .arg(fragments));
        if ok {
            existing(output)
        } else {
            None
        }
    }
}

/// Target name (column 1) and full-sequence score (column 6) of a `--tblout` table.
/// A fragment listed twice keeps its best score.
pub fn parse_tblout(content: &str) -> Vec<SearchHit> {
    let mut best: indexmap::IndexMap<String, f64> = indexmap::IndexMap::new();
    for line in content.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }
        let Ok(score) = fields[5].parse::<f64>() else {
            continue;
        };
        best.entry(fields[0].to_string())
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }
    best.into_iter()
        .map(|(name, score)| SearchHit { name, score })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tblout() {
        let content = "\
#                                                               --- full sequence ---- --- best 1 domain ---- --- domain number estimation ----
# target name        accession  query name           accession    E-value  score  bias   E-value  score  bias   exp reg clu  ov env dom rep inc description of target
#------------------- ---------- -------------------- ---------- --------- ------ ----- --------- ------ -----   --- --- --- --- --- --- --- --- ---------------------
frag1                -          subset0              -            1.2e-10   40.5   0.1   1.3e-10   40.3   0.1   1.0   1   0   0   1   1   1   1 -
frag2                -          subset0              -                1.5   -2.5   0.0       1.6   -2.7   0.0   1.0   1   0   0   1   1   1   0 -
frag1                -          subset0              -              1e-05   12.0   0.1   1.3e-10   40.3   0.1   1.0   1   0   0   1   1   1   1 -
#
# Program:         hmmsearch
";
        let hits = parse_tblout(content);
        assert_eq!(
            hits,
            vec![
                SearchHit {
                    name: "frag1".to_string(),
                    score: 40.5
                },
                SearchHit {
                    name: "frag2".to_string(),
                    score: -2.5
                },
            ]
        );
    }

    #[test]
    fn test_parse_tblout_empty() {
        assert!(parse_tblout("").is_empty());
        assert!(parse_tblout("# only comments\n#\n").is_empty());
        assert!(parse_tblout("short line\n").is_empty());
    }

    #[test]
    fn test_locate_missing() {
        assert!(locate("surely-not-a-real-program-divmsa").is_err());
    }
}
