//! Bottom-up folding of chunk results into one extended alignment.

use crate::libs::decomposition::{JobResult, RootProblem};
use crate::libs::error::{DivError, MergeConsistencyError};
use crate::libs::extended::{ExtendedAlignment, Origin};
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// One child at a time, in child order.
    #[default]
    Sequential,
    /// Adjacent siblings merged pairwise in parallel, halving the count each round.
    TreeReduction,
}

impl std::str::FromStr for MergeStrategy {
    type Err = DivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(MergeStrategy::Sequential),
            "tree" | "parallel" | "tree-reduction" => Ok(MergeStrategy::TreeReduction),
            _ => Err(DivError::Configuration(format!(
                "Unknown merge strategy: {}",
                s
            ))),
        }
    }
}

/// What to do with a result the collaborator never produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Log it and leave it out of the merge.
    #[default]
    Skip,
    Fail,
}

impl std::str::FromStr for MissingPolicy {
    type Err = DivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingPolicy::Skip),
            "fail" => Ok(MissingPolicy::Fail),
            _ => Err(DivError::Configuration(format!(
                "Unknown missing-result policy: {}",
                s
            ))),
        }
    }
}

/// Unwraps a slot according to `policy`. Empty slots contribute nothing.
pub fn resolve<T>(
    slot: JobResult<T>,
    label: &str,
    policy: MissingPolicy,
) -> Result<Option<T>, DivError> {
    match slot {
        JobResult::Done(v) => Ok(Some(v)),
        JobResult::Empty => Ok(None),
        JobResult::Missing | JobResult::Pending => match policy {
            MissingPolicy::Skip => {
                log::warn!("No result for {}, it is left out of the merge", label);
                Ok(None)
            }
            MissingPolicy::Fail => Err(DivError::MissingResult(label.to_string())),
        },
    }
}

/// Folds `parts` into `acc` one after another.
pub fn fold_sequential(
    mut acc: ExtendedAlignment,
    parts: Vec<ExtendedAlignment>,
) -> Result<ExtendedAlignment, MergeConsistencyError> {
    for part in parts {
        log::debug!(
            "Merging {} ({} sequences) into {}",
            part.origin(),
            part.num_taxa(),
            acc.origin()
        );
        acc.merge_in(part)?;
    }
    Ok(acc)
}

/// Reduces `parts` pairwise in parallel, then folds the survivor into `acc`.
///
/// Only adjacent parts are paired and the left one receives, so the result equals
/// [`fold_sequential`] on the same input.
pub fn fold_tree_reduction(
    acc: ExtendedAlignment,
    mut parts: Vec<ExtendedAlignment>,
) -> Result<ExtendedAlignment, MergeConsistencyError> {
    while parts.len() > 1 {
        log::debug!("Pairwise merge round over {} alignments", parts.len());
        parts = parts
            .into_par_iter()
            .chunks(2)
            .map(|pair| {
                let mut pair = pair.into_iter();
                let Some(mut left) = pair.next() else {
                    unreachable!("rayon chunks are never empty")
                };
                match pair.next() {
                    Some(right) if left.is_empty() => Ok(right),
                    Some(right) => left.merge_in(right).map(|_| left),
                    None => Ok(left),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    fold_sequential(acc, parts)
}

pub fn fold(
    strategy: MergeStrategy,
    acc: ExtendedAlignment,
    parts: Vec<ExtendedAlignment>,
) -> Result<ExtendedAlignment, MergeConsistencyError> {
    match strategy {
        MergeStrategy::Sequential => fold_sequential(acc, parts),
        MergeStrategy::TreeReduction => fold_tree_reduction(acc, parts),
    }
}

/// Folds chunk results into subsets, subsets into placements and placements into the root.
///
/// Each placement accumulator starts from its backbone rows. Chunk results are moved
/// out of the tree as they are consumed.
pub fn merge_problem(
    root: &mut RootProblem,
    strategy: MergeStrategy,
    policy: MissingPolicy,
) -> Result<ExtendedAlignment, DivError> {
    let width = root.backbone.width();
    let mut placements = Vec::with_capacity(root.placements.len());

    for placement in root.placements.iter_mut() {
        let mut subsets = Vec::with_capacity(placement.subsets.len());
        for subset in placement.subsets.iter_mut() {
            let mut chunks = Vec::with_capacity(subset.chunks.len());
            for chunk in subset.chunks.iter_mut() {
                let label = chunk.origin().to_string();
                if let Some(ext) = resolve(chunk.alignment.take(), &label, policy)? {
                    chunks.push(ext);
                }
            }
            log::info!(
                "Merging {} fragment chunks of alignment subset {}",
                chunks.len(),
                subset.index
            );
            let acc = ExtendedAlignment::new(width, subset.origin());
            subsets.push(fold(strategy, acc, chunks)?);
        }

        log::info!(
            "Merging {} alignment subsets into placement subset {}",
            subsets.len(),
            placement.index
        );
        let mut acc = ExtendedAlignment::from_backbone(&root.backbone.sub_alignment(&placement.taxa))?;
        acc.set_origin(placement.origin());
        placements.push(fold(strategy, acc, subsets)?);
    }

    let acc = ExtendedAlignment::new(width, Origin::Backbone);
    Ok(fold(strategy, acc, placements)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::alignment::Alignment;
    use crate::libs::extended::ColumnMap;
    use crate::libs::phylo::Tree;

    fn a2m(pairs: &[(&str, &str)], width: usize, origin: Origin) -> ExtendedAlignment {
        ExtendedAlignment::from_a2m(
            pairs
                .iter()
                .map(|(n, s)| (n.to_string(), s.as_bytes().to_vec())),
            &ColumnMap::identity(width),
            origin,
        )
        .unwrap()
    }

    fn chunk(subset: usize, chunk: usize) -> Origin {
        Origin::Chunk { subset, chunk }
    }

    fn parts() -> Vec<ExtendedAlignment> {
        vec![
            a2m(&[("f1", "AaaC-T")], 4, chunk(0, 0)),
            a2m(&[("f2", "A-cGTt")], 4, chunk(0, 1)),
            ExtendedAlignment::new(4, chunk(0, 2)),
            a2m(&[("f3", "gA-GT"), ("f4", "ACGTtt")], 4, chunk(1, 0)),
            a2m(&[("f5", "AbbbCGT")], 4, chunk(1, 1)),
        ]
    }

    fn backbone() -> Alignment {
        Alignment::from_pairs(vec![("A", b"ACGT".to_vec()), ("B", b"A-GT".to_vec())]).unwrap()
    }

    fn render(ext: ExtendedAlignment) -> Vec<(String, String)> {
        ext.into_alignment()
            .unwrap()
            .into_iter_pairs()
            .map(|(n, s)| (n, String::from_utf8(s).unwrap()))
            .collect()
    }

    #[test]
    fn test_sequential_fold() {
        let acc = ExtendedAlignment::from_backbone(&backbone()).unwrap();
        let merged = fold_sequential(acc, parts()).unwrap();

        assert_eq!(merged.block_width(0), 1);
        assert_eq!(merged.block_width(1), 3);
        assert_eq!(merged.block_width(2), 1);
        assert_eq!(merged.block_width(3), 0);
        assert_eq!(merged.block_width(4), 2);
        assert_eq!(merged.width(), 11);
        assert_eq!(merged.block_contributors(1), &[chunk(0, 0), chunk(1, 1)]);

        let expected: Vec<(String, String)> = vec![
            ("A", "-A---C-GT--"),
            ("B", "-A-----GT--"),
            ("f1", "-Aaa-C--T--"),
            ("f2", "-A----cGTt-"),
            ("f3", "gA-----GT--"),
            ("f4", "-A---C-GTtt"),
            ("f5", "-AbbbC-GT--"),
        ]
        .into_iter()
        .map(|(n, s)| (n.to_string(), s.to_string()))
        .collect();
        assert_eq!(render(merged), expected);
    }

    #[test]
    fn test_tree_reduction_matches_sequential() {
        let seq = fold_sequential(
            ExtendedAlignment::from_backbone(&backbone()).unwrap(),
            parts(),
        )
        .unwrap();
        let par = fold_tree_reduction(
            ExtendedAlignment::from_backbone(&backbone()).unwrap(),
            parts(),
        )
        .unwrap();
        assert_eq!(render(seq), render(par));
    }

    #[test]
    fn test_tree_reduction_reports_conflict() {
        let mut bad = parts();
        bad.push(a2m(&[("f1", "TaaC-T")], 4, chunk(2, 0)));
        let err = fold_tree_reduction(ExtendedAlignment::new(4, Origin::Backbone), bad)
            .unwrap_err();
        assert!(matches!(
            err.conflict,
            crate::libs::error::Conflict::Symbol { ref name, column: 0, .. } if name == "f1"
        ));
    }

    #[test]
    fn test_resolve_policy() {
        assert_eq!(
            resolve(JobResult::Done(1), "x", MissingPolicy::Fail).unwrap(),
            Some(1)
        );
        assert_eq!(
            resolve(JobResult::<u8>::Empty, "x", MissingPolicy::Fail).unwrap(),
            None
        );
        assert_eq!(
            resolve(JobResult::<u8>::Missing, "x", MissingPolicy::Skip).unwrap(),
            None
        );
        assert!(matches!(
            resolve(JobResult::<u8>::Missing, "subset 0 chunk 3", MissingPolicy::Fail),
            Err(DivError::MissingResult(label)) if label == "subset 0 chunk 3"
        ));
    }

    fn problem() -> RootProblem {
        let backbone = backbone();
        let fragments = Alignment::from_pairs(vec![
            ("f1", b"ACT".to_vec()),
            ("f2", b"ACGTT".to_vec()),
        ])
        .unwrap();
        let mut root = RootProblem::new(
            backbone,
            Tree::from_newick("(A,B);").unwrap(),
            fragments,
            vec![vec!["A".to_string()], vec!["B".to_string()]],
        )
        .unwrap();

        let fragments = root.fragments.clone();
        {
            let mut subsets = root.subsets_mut();

            let s0 = subsets.next().unwrap();
            s0.set_fragments(&fragments.sub_alignment(&["f1"]), 2);
            s0.chunks[0].alignment = JobResult::Done(a2m(&[("f1", "AC-T")], 4, chunk(0, 0)));

            // subset B has an empty column 1, its profile has 3 match columns
            let s1 = subsets.next().unwrap();
            s1.set_fragments(&fragments.sub_alignment(&["f2"]), 2);
            s1.chunks[0].alignment = JobResult::Missing;
            s1.chunks[1].alignment = JobResult::Done(
                ExtendedAlignment::from_a2m(
                    vec![("f2".to_string(), b"AcGTt".to_vec())],
                    &s1.columns,
                    chunk(1, 1),
                )
                .unwrap(),
            );
        }
        root
    }

    #[test]
    fn test_merge_problem() {
        let mut root = problem();
        assert_eq!(root.subsets().nth(1).unwrap().columns.len(), 3);

        let merged = merge_problem(&mut root, MergeStrategy::Sequential, MissingPolicy::Skip)
            .unwrap();
        let rows = render(merged);
        assert_eq!(
            rows,
            vec![
                ("A".to_string(), "A-CGT-".to_string()),
                ("B".to_string(), "A--GT-".to_string()),
                ("f1".to_string(), "A-C-T-".to_string()),
                ("f2".to_string(), "Ac-GTt".to_string()),
            ]
        );

        // consumed
        assert!(root.subsets().all(|s| s
            .chunks
            .iter()
            .all(|c| c.alignment == JobResult::Pending || c.alignment == JobResult::Empty)));
    }

    #[test]
    fn test_merge_problem_fail_policy() {
        let mut root = problem();
        let err = merge_problem(&mut root, MergeStrategy::TreeReduction, MissingPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, DivError::MissingResult(ref l) if l == "subset 1 chunk 0"));
    }
}
