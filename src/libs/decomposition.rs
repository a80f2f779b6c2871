//! The decomposition tree: one root, one placement subset, its alignment subsets
//! and their fragment chunks.
//!
//! Each role is its own struct and results live in typed slots on the node that
//! owns them.

use crate::libs::alignment::Alignment;
use crate::libs::error::DivError;
use crate::libs::extended::{ColumnMap, ExtendedAlignment, Origin};
use crate::libs::phylo::Tree;
use crate::libs::tools::SearchHit;
use std::collections::HashSet;
use std::path::PathBuf;

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult<T> {
    /// Not run yet.
    Pending,
    /// Nothing to do, e.g. a chunk without fragments.
    Empty,
    /// The job ran but the collaborator produced nothing.
    Missing,
    Done(T),
}

impl<T> Default for JobResult<T> {
    fn default() -> Self {
        JobResult::Pending
    }
}

impl<T> JobResult<T> {
    /// `Done` for `Some`, `Missing` for `None`.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => JobResult::Done(v),
            None => JobResult::Missing,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, JobResult::Done(_))
    }

    pub fn done(&self) -> Option<&T> {
        match self {
            JobResult::Done(v) => Some(v),
            _ => None,
        }
    }

    /// Moves the result out, leaving `Pending` behind.
    pub fn take(&mut self) -> JobResult<T> {
        std::mem::take(self)
    }
}

#[derive(Debug, Clone)]
pub struct ChunkProblem {
    pub subset: usize,
    pub index: usize,
    pub fragments: Alignment,
    pub alignment: JobResult<ExtendedAlignment>,
}

impl ChunkProblem {
    pub fn origin(&self) -> Origin {
        Origin::Chunk {
            subset: self.subset,
            chunk: self.index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubsetProblem {
    pub index: usize,
    pub taxa: Vec<String>,
    /// Backbone rows of `taxa` with all-gap columns removed.
    pub alignment: Alignment,
    pub columns: ColumnMap,
    pub profile: JobResult<PathBuf>,
    /// One slot per search chunk of the fragment pool.
    pub hits: Vec<JobResult<Vec<SearchHit>>>,
    pub chunks: Vec<ChunkProblem>,
}

impl SubsetProblem {
    pub fn new(index: usize, taxa: Vec<String>, backbone: &Alignment) -> Self {
        let (alignment, kept) = backbone.sub_alignment(&taxa).remove_all_gap_columns();
        Self {
            index,
            taxa,
            alignment,
            columns: ColumnMap::new(backbone.width(), kept),
            profile: JobResult::Pending,
            hits: Vec::new(),
            chunks: Vec::new(),
        }
    }

    pub fn origin(&self) -> Origin {
        Origin::Subset(self.index)
    }

    /// Splits the assigned fragments into `count` near-equal chunks.
    pub fn set_fragments(&mut self, fragments: &Alignment, count: usize) {
        let names: Vec<&String> = fragments.names().collect();
        self.chunks = crate::libs::chunks::divide(&names, count)
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                let fragments = fragments.sub_alignment(&group);
                let alignment = if fragments.is_empty() {
                    JobResult::Empty
                } else {
                    JobResult::Pending
                };
                ChunkProblem {
                    subset: self.index,
                    index,
                    fragments,
                    alignment,
                }
            })
            .collect();
    }
}

#[derive(Debug, Clone)]
pub struct PlacementProblem {
    pub index: usize,
    pub taxa: Vec<String>,
    pub subsets: Vec<SubsetProblem>,
}

impl PlacementProblem {
    pub fn origin(&self) -> Origin {
        Origin::Placement(self.index)
    }
}

#[derive(Debug, Clone)]
pub struct RootProblem {
    pub backbone: Alignment,
    pub tree: Tree,
    /// Fragments to insert, long-branch taxa included.
    pub fragments: Alignment,
    pub placements: Vec<PlacementProblem>,
}

/// A borrowed view of one node, tagged with its role.
#[derive(Debug, Clone, Copy)]
pub enum Problem<'a> {
    Root(&'a RootProblem),
    Placement(&'a PlacementProblem),
    Subset(&'a SubsetProblem),
    Chunk(&'a ChunkProblem),
}

impl Problem<'_> {
    pub fn label(&self) -> String {
        match self {
            Problem::Root(_) => "root".to_string(),
            Problem::Placement(p) => format!("p_{}", p.index),
            Problem::Subset(s) => format!("a_{}", s.index),
            Problem::Chunk(c) => format!("a_{}_fc_{}", c.subset, c.index),
        }
    }
}

impl RootProblem {
    /// A single placement subset covering the whole backbone, split into `parts`.
    ///
    /// The parts must be disjoint and cover every backbone taxon.
    pub fn new(
        backbone: Alignment,
        tree: Tree,
        fragments: Alignment,
        parts: Vec<Vec<String>>,
    ) -> Result<Self, DivError> {
        let mut seen = HashSet::new();
        for name in parts.iter().flatten() {
            if !backbone.contains(name) {
                return Err(DivError::Configuration(format!(
                    "Taxon {} of the decomposition is not in the backbone alignment",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(DivError::Configuration(format!(
                    "Taxon {} appears in more than one alignment subset",
                    name
                )));
            }
        }
        if let Some(name) = backbone.names().find(|n| !seen.contains(n.as_str())) {
            return Err(DivError::Configuration(format!(
                "Backbone taxon {} is missing from the tree",
                name
            )));
        }

        let subsets = parts
            .into_iter()
            .enumerate()
            .map(|(i, taxa)| SubsetProblem::new(i, taxa, &backbone))
            .collect();
        let placement = PlacementProblem {
            index: 0,
            taxa: backbone.names().cloned().collect(),
            subsets,
        };

        Ok(Self {
            backbone,
            tree,
            fragments,
            placements: vec![placement],
        })
    }

    pub fn subsets(&self) -> impl Iterator<Item = &SubsetProblem> {
        self.placements.iter().flat_map(|p| p.subsets.iter())
    }

    pub fn subsets_mut(&mut self) -> impl Iterator<Item = &mut SubsetProblem> {
        self.placements.iter_mut().flat_map(|p| p.subsets.iter_mut())
    }

    pub fn num_subsets(&self) -> usize {
        self.subsets().count()
    }

    /// Every node, parents before children, children in index order.
    pub fn iter(&self) -> Vec<Problem<'_>> {
        let mut nodes = vec![Problem::Root(self)];
        for p in &self.placements {
            nodes.push(Problem::Placement(p));
            for s in &p.subsets {
                nodes.push(Problem::Subset(s));
                nodes.extend(s.chunks.iter().map(Problem::Chunk));
            }
        }
        nodes
    }

    /// Each fragment goes to the subset with the highest score, ties to the lower index.
    ///
    /// Returns one fragment alignment per subset and the fragments nobody scored,
    /// both in fragment pool order.
    pub fn assign_fragments(&self) -> (Vec<Alignment>, Alignment) {
        let mut best: indexmap::IndexMap<&str, (usize, f64)> = indexmap::IndexMap::new();
        for (position, subset) in self.subsets().enumerate() {
            for hit in subset.hits.iter().filter_map(|h| h.done()).flatten() {
                match best.get_mut(hit.name.as_str()) {
                    Some(entry) if hit.score > entry.1 => *entry = (position, hit.score),
                    Some(_) => {}
                    None => {
                        best.insert(hit.name.as_str(), (position, hit.score));
                    }
                }
            }
        }

        let mut assigned: Vec<Vec<&String>> = vec![Vec::new(); self.num_subsets()];
        let mut unassigned = Vec::new();
        for name in self.fragments.names() {
            match best.get(name.as_str()) {
                Some(&(position, _)) => assigned[position].push(name),
                None => unassigned.push(name),
            }
        }

        (
            assigned
                .iter()
                .map(|names| self.fragments.sub_alignment(names))
                .collect(),
            self.fragments.sub_alignment(&unassigned),
        )
    }
}
