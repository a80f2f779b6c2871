use crate::libs::error::DivError;
use indexmap::IndexMap;
use rand::Rng;
use rayon::prelude::*;
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoleculeType {
    Nucleotide,
    Amino,
}

impl MoleculeType {
    pub fn is_nucleotide(&self) -> bool {
        matches!(self, MoleculeType::Nucleotide)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoleculeType::Nucleotide => "dna",
            MoleculeType::Amino => "amino",
        }
    }
}

impl std::str::FromStr for MoleculeType {
    type Err = DivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dna" | "rna" | "nucleotide" => Ok(MoleculeType::Nucleotide),
            "amino" | "protein" | "aa" => Ok(MoleculeType::Amino),
            _ => Err(DivError::Configuration(format!(
                "Unknown molecule type: {}",
                s
            ))),
        }
    }
}

/// `-` in match columns, `.` in A2M insert columns.
pub fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}

/// Average and maximum pairwise p-distance of an alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PDistance {
    pub average: f64,
    pub max: f64,
    /// Number of pairs that shared at least one non-gap site.
    pub pairs: usize,
}

/// Fraction of differing sites among the sites where neither sequence has a gap.
/// `None` when the two sequences share no such site.
pub fn pair_distance(a: &[u8], b: &[u8]) -> Option<f64> {
    let mut sites = 0usize;
    let mut diffs = 0usize;
    for (&x, &y) in a.iter().zip(b.iter()) {
        if is_gap(x) || is_gap(y) {
            continue;
        }
        sites += 1;
        if !x.eq_ignore_ascii_case(&y) {
            diffs += 1;
        }
    }
    if sites == 0 {
        None
    } else {
        Some(diffs as f64 / sites as f64)
    }
}

/// Sequences keyed by unique name, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Alignment {
    seqs: IndexMap<String, Vec<u8>>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sequence. Names must be unique.
    pub fn push(&mut self, name: impl Into<String>, seq: Vec<u8>) -> Result<(), DivError> {
        let name = name.into();
        if self.seqs.contains_key(&name) {
            return Err(DivError::Configuration(format!(
                "Duplicated sequence name: {}",
                name
            )));
        }
        self.seqs.insert(name, seq);
        Ok(())
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, DivError>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut aln = Self::new();
        for (name, seq) in pairs {
            aln.push(name, seq)?;
        }
        Ok(aln)
    }

    pub fn num_taxa(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// Column count, taken from the first sequence.
    pub fn width(&self) -> usize {
        self.seqs.values().next().map(|s| s.len()).unwrap_or(0)
    }

    /// All sequences have the same length.
    pub fn is_aligned(&self) -> bool {
        let width = self.width();
        self.seqs.values().all(|s| s.len() == width)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seqs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.seqs.get(name).map(|s| s.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.seqs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.seqs.iter()
    }

    pub fn into_iter_pairs(self) -> impl Iterator<Item = (String, Vec<u8>)> {
        self.seqs.into_iter()
    }

    /// A copy restricted to `names`, in the order given. Unknown names are skipped.
    pub fn sub_alignment<S: AsRef<str>>(&self, names: &[S]) -> Alignment {
        let seqs = names
            .iter()
            .filter_map(|n| {
                self.seqs
                    .get_key_value(n.as_ref())
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect();
        Alignment { seqs }
    }

    /// Moves the sequences named in `names` out of `self`.
    /// The returned alignment keeps the order of `self`.
    pub fn split_off<S: AsRef<str>>(&mut self, names: &[S]) -> Alignment {
        let wanted: std::collections::HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let mut taken = IndexMap::new();
        let mut kept = IndexMap::new();
        for (name, seq) in std::mem::take(&mut self.seqs) {
            if wanted.contains(name.as_str()) {
                taken.insert(name, seq);
            } else {
                kept.insert(name, seq);
            }
        }
        self.seqs = kept;
        Alignment { seqs: taken }
    }

    /// Drops columns where every sequence has a gap.
    /// Returns the reduced alignment and the indices of the kept columns.
    pub fn remove_all_gap_columns(&self) -> (Alignment, Vec<usize>) {
        let width = self.width();
        let kept: Vec<usize> = (0..width)
            .filter(|&col| {
                self.seqs
                    .values()
                    .any(|s| s.get(col).is_some_and(|&b| !is_gap(b)))
            })
            .collect();

        let seqs = self
            .seqs
            .iter()
            .map(|(name, seq)| {
                let reduced = kept.iter().filter_map(|&col| seq.get(col).copied()).collect();
                (name.clone(), reduced)
            })
            .collect();

        (Alignment { seqs }, kept)
    }

    /// Strips every gap symbol, giving the raw sequences back.
    pub fn ungapped(&self) -> Alignment {
        let seqs = self
            .seqs
            .iter()
            .map(|(name, seq)| {
                (
                    name.clone(),
                    seq.iter().copied().filter(|&b| !is_gap(b)).collect(),
                )
            })
            .collect();
        Alignment { seqs }
    }

    /// Exact p-distance over all pairs.
    pub fn p_distance(&self) -> PDistance {
        let rows: Vec<&[u8]> = self.seqs.values().map(|s| s.as_slice()).collect();
        let n = rows.len();

        let (sum, pairs, max) = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut sum = 0.0;
                let mut pairs = 0usize;
                let mut max = 0.0f64;
                for j in (i + 1)..n {
                    if let Some(d) = pair_distance(rows[i], rows[j]) {
                        sum += d;
                        pairs += 1;
                        max = max.max(d);
                    }
                }
                (sum, pairs, max)
            })
            .reduce(
                || (0.0, 0, 0.0),
                |a, b| (a.0 + b.0, a.1 + b.1, f64::max(a.2, b.2)),
            );

        summarize(sum, pairs, max)
    }

    /// p-distance estimated from at most `max_pairs` random pairs.
    /// Falls back to the exact computation when there are fewer pairs than that.
    pub fn p_distance_sampled<R: Rng>(&self, rng: &mut R, max_pairs: usize) -> PDistance {
        let n = self.seqs.len();
        let total = n.saturating_sub(1) * n / 2;
        if total <= max_pairs || n < 2 {
            return self.p_distance();
        }

        let rows: Vec<&[u8]> = self.seqs.values().map(|s| s.as_slice()).collect();
        let sampled: Vec<(usize, usize)> = (0..max_pairs)
            .map(|_| {
                let i = rng.gen_range(0..n);
                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                (i, j)
            })
            .collect();

        let (sum, pairs, max) = sampled
            .par_iter()
            .filter_map(|&(i, j)| pair_distance(rows[i], rows[j]))
            .map(|d| (d, 1usize, d))
            .reduce(
                || (0.0, 0, 0.0),
                |a, b| (a.0 + b.0, a.1 + b.1, f64::max(a.2, b.2)),
            );

        summarize(sum, pairs, max)
    }

    pub fn read_fasta(infile: &str) -> anyhow::Result<Alignment> {
        let reader = crate::reader(infile)?;
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut aln = Alignment::new();
        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            let seq = record.sequence().as_ref().to_vec();
            aln.push(name, seq)?;
        }

        Ok(aln)
    }

    /// Writes one record per sequence, no line wrapping.
    pub fn write_fasta(&self, outfile: &str) -> anyhow::Result<()> {
        let writer = crate::writer(outfile)?;
        let mut fa_out = noodles_fasta::io::writer::Builder::default()
            .set_line_base_count(usize::MAX)
            .build_from_writer(writer);

        for (name, seq) in &self.seqs {
            let definition = noodles_fasta::record::Definition::new(name.clone(), None);
            let record = noodles_fasta::Record::new(
                definition,
                noodles_fasta::record::Sequence::from(seq.clone()),
            );
            fa_out.write_record(&record)?;
        }
        fa_out.get_mut().flush()?;

        Ok(())
    }
}

fn summarize(sum: f64, pairs: usize, max: f64) -> PDistance {
    PDistance {
        average: if pairs == 0 { 0.0 } else { sum / pairs as f64 },
        max,
        pairs,
    }
}
