//! Extended alignments: a fixed set of backbone columns plus insertion blocks.
//!
//! Anchor `a` (`0..=backbone_width`) names the slot after the first `a`
//! backbone columns, so anchor 0 holds insertions before the first backbone
//! column and anchor `backbone_width` holds trailing insertions.
//!
//! While merging, every row keeps its backbone symbols and, per anchor, only
//! its own left-aligned insertion content. Block widths are tracked once per
//! alignment and padding is implicit, so folding another alignment in costs
//! time proportional to the incoming rows. Gap padding is materialized in a
//! single conversion step, [`ExtendedAlignment::into_alignment`].

use crate::libs::alignment::{is_gap, Alignment};
use crate::libs::error::{Conflict, DivError, MergeConsistencyError};
use indexmap::IndexMap;
use std::collections::BTreeMap;

pub const GAP: u8 = b'-';

/// Which job introduced an alignment, or an insertion block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    Backbone,
    Placement(usize),
    Subset(usize),
    Chunk { subset: usize, chunk: usize },
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Backbone => write!(f, "backbone"),
            Origin::Placement(i) => write!(f, "placement {}", i),
            Origin::Subset(i) => write!(f, "subset {}", i),
            Origin::Chunk { subset, chunk } => write!(f, "subset {} chunk {}", subset, chunk),
        }
    }
}

/// Maps the match columns of a subset profile to global backbone columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    backbone_width: usize,
    columns: Vec<usize>,
}

impl ColumnMap {
    /// Every backbone column is a match column.
    pub fn identity(backbone_width: usize) -> Self {
        Self {
            backbone_width,
            columns: (0..backbone_width).collect(),
        }
    }

    /// `columns` must be strictly increasing and below `backbone_width`.
    pub fn new(backbone_width: usize, columns: Vec<usize>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.last().map_or(true, |&c| c < backbone_width));
        Self {
            backbone_width,
            columns,
        }
    }

    pub fn backbone_width(&self) -> usize {
        self.backbone_width
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Global column of local match column `local`.
    pub fn column(&self, local: usize) -> usize {
        self.columns[local]
    }

    /// Global anchor for an insertion that follows `local_count` local match columns.
    pub fn anchor(&self, local_count: usize) -> usize {
        if local_count == 0 {
            0
        } else {
            self.columns[local_count - 1] + 1
        }
    }
}

/// One sequence of an extended alignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedRow {
    backbone: Vec<u8>,
    /// anchor -> insertion content, gaps normalized to `-`, no trailing gaps
    insertions: BTreeMap<usize, Vec<u8>>,
}

impl ExtendedRow {
    pub fn new(backbone: Vec<u8>) -> Self {
        Self {
            backbone,
            insertions: BTreeMap::new(),
        }
    }

    pub fn backbone(&self) -> &[u8] {
        &self.backbone
    }

    /// Insertion content at `anchor`, without padding.
    pub fn insertion(&self, anchor: usize) -> &[u8] {
        self.insertions.get(&anchor).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Records content at `anchor`, replacing anything already there.
    pub fn set_insertion(&mut self, anchor: usize, content: &[u8]) {
        let mut content: Vec<u8> = content
            .iter()
            .map(|&b| if is_gap(b) { GAP } else { b })
            .collect();
        while content.last() == Some(&GAP) {
            content.pop();
        }
        if content.is_empty() {
            self.insertions.remove(&anchor);
        } else {
            self.insertions.insert(anchor, content);
        }
    }

    fn check_compatible(
        &self,
        name: &str,
        other: &ExtendedRow,
        origin: Origin,
    ) -> Result<(), MergeConsistencyError> {
        if let Some((column, (&expected, &found))) = self
            .backbone
            .iter()
            .zip(other.backbone.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(MergeConsistencyError {
                origin,
                conflict: Conflict::Symbol {
                    name: name.to_string(),
                    column,
                    expected,
                    found,
                },
            });
        }
        for (&anchor, content) in &other.insertions {
            if let Some(mine) = self.insertions.get(&anchor) {
                if mine != content {
                    return Err(MergeConsistencyError {
                        origin,
                        conflict: Conflict::Insertion {
                            name: name.to_string(),
                            anchor,
                        },
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtendedAlignment {
    origin: Origin,
    backbone_width: usize,
    /// Block width per anchor, `backbone_width + 1` entries.
    widths: Vec<usize>,
    /// Jobs that contributed content per anchor, in merge order.
    contributors: Vec<Vec<Origin>>,
    rows: IndexMap<String, ExtendedRow>,
}

impl ExtendedAlignment {
    /// An empty alignment over `backbone_width` backbone columns.
    pub fn new(backbone_width: usize, origin: Origin) -> Self {
        Self {
            origin,
            backbone_width,
            widths: vec![0; backbone_width + 1],
            contributors: vec![Vec::new(); backbone_width + 1],
            rows: IndexMap::new(),
        }
    }

    /// Seeds an accumulator with the backbone alignment itself.
    pub fn from_backbone(backbone: &Alignment) -> Result<Self, MergeConsistencyError> {
        let mut ext = Self::new(backbone.width(), Origin::Backbone);
        for (name, seq) in backbone.iter() {
            let row = ExtendedRow::new(seq.iter().map(|&b| if is_gap(b) { GAP } else { b }).collect());
            ext.insert_row(name.clone(), row)?;
        }
        Ok(ext)
    }

    /// Parses aligner output in A2M convention: uppercase letters and `-` are
    /// match columns, lowercase letters and `.` are insertions. Match columns
    /// are relabelled to global backbone columns through `columns`.
    pub fn from_a2m<I>(
        records: I,
        columns: &ColumnMap,
        origin: Origin,
    ) -> Result<Self, MergeConsistencyError>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut ext = Self::new(columns.backbone_width(), origin);

        for (name, seq) in records {
            let mut backbone = vec![GAP; columns.backbone_width()];
            let mut inserts: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
            let mut matched = 0usize;

            for &b in &seq {
                if b.is_ascii_lowercase() || b == b'.' {
                    inserts.entry(matched).or_default().push(b);
                } else {
                    if matched == columns.len() {
                        matched += 1;
                        break;
                    }
                    backbone[columns.column(matched)] = if b == b'-' { GAP } else { b };
                    matched += 1;
                }
            }
            if matched != columns.len() {
                let found = if matched > columns.len() {
                    seq.iter()
                        .filter(|&&b| !(b.is_ascii_lowercase() || b == b'.'))
                        .count()
                } else {
                    matched
                };
                return Err(MergeConsistencyError {
                    origin,
                    conflict: Conflict::BackboneWidth {
                        expected: columns.len(),
                        found,
                    },
                });
            }

            let mut row = ExtendedRow::new(backbone);
            for (local, content) in inserts {
                row.set_insertion(columns.anchor(local), &content);
            }
            ext.insert_row(name, row)?;
        }

        Ok(ext)
    }

    /// Reads an A2M file produced by the profile aligner.
    pub fn read_a2m(infile: &str, columns: &ColumnMap, origin: Origin) -> anyhow::Result<Self> {
        let records = Alignment::read_fasta(infile)?;
        Ok(Self::from_a2m(records.into_iter_pairs(), columns, origin)?)
    }

    fn insert_row(&mut self, name: String, row: ExtendedRow) -> Result<(), MergeConsistencyError> {
        if row.backbone.len() != self.backbone_width {
            return Err(MergeConsistencyError {
                origin: self.origin,
                conflict: Conflict::BackboneWidth {
                    expected: self.backbone_width,
                    found: row.backbone.len(),
                },
            });
        }
        for (&anchor, content) in &row.insertions {
            if content.len() > self.widths[anchor] {
                self.widths[anchor] = content.len();
            }
            if !self.contributors[anchor].contains(&self.origin) {
                self.contributors[anchor].push(self.origin);
            }
        }
        self.rows.insert(name, row);
        Ok(())
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Relabels an accumulator. Recorded block contributors are kept.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn backbone_width(&self) -> usize {
        self.backbone_width
    }

    pub fn num_taxa(&self) -> usize {
        self.rows.len()
    }

    /// No sequences and no insertion blocks.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.widths.iter().all(|&w| w == 0)
    }

    /// Total column count: backbone columns plus every insertion block.
    pub fn width(&self) -> usize {
        self.backbone_width + self.widths.iter().sum::<usize>()
    }

    pub fn block_width(&self, anchor: usize) -> usize {
        self.widths.get(anchor).copied().unwrap_or(0)
    }

    pub fn block_contributors(&self, anchor: usize) -> &[Origin] {
        self.contributors
            .get(anchor)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.rows.keys()
    }

    pub fn row(&self, name: &str) -> Option<&ExtendedRow> {
        self.rows.get(name)
    }

    /// Folds `other` into `self`.
    ///
    /// Backbone columns must agree for every shared sequence. Each insertion
    /// block grows to the wider of the two; sequences lacking content at an
    /// anchor are padded implicitly. On error `self` is left untouched.
    pub fn merge_in(&mut self, other: ExtendedAlignment) -> Result<(), MergeConsistencyError> {
        if other.is_empty() {
            return Ok(());
        }
        if other.backbone_width != self.backbone_width {
            return Err(MergeConsistencyError {
                origin: other.origin,
                conflict: Conflict::BackboneWidth {
                    expected: self.backbone_width,
                    found: other.backbone_width,
                },
            });
        }

        for (name, row) in &other.rows {
            if let Some(mine) = self.rows.get(name) {
                mine.check_compatible(name, row, other.origin)?;
            }
        }

        for (anchor, &width) in other.widths.iter().enumerate() {
            if width > self.widths[anchor] {
                self.widths[anchor] = width;
            }
        }
        for (anchor, origins) in other.contributors.into_iter().enumerate() {
            for origin in origins {
                if !self.contributors[anchor].contains(&origin) {
                    self.contributors[anchor].push(origin);
                }
            }
        }

        for (name, row) in other.rows {
            match self.rows.get_mut(&name) {
                Some(mine) => {
                    for (anchor, content) in row.insertions {
                        mine.insertions.entry(anchor).or_insert(content);
                    }
                }
                None => {
                    self.rows.insert(name, row);
                }
            }
        }

        Ok(())
    }

    /// Materializes one row with all blocks padded to their widths.
    fn render(&self, row: &ExtendedRow) -> Vec<u8> {
        let mut seq = Vec::with_capacity(self.width());
        for anchor in 0..=self.backbone_width {
            let content = row.insertion(anchor);
            seq.extend_from_slice(content);
            seq.resize(seq.len() + self.widths[anchor] - content.len(), GAP);
            if anchor < self.backbone_width {
                seq.push(row.backbone[anchor]);
            }
        }
        seq
    }

    /// Rendered sequence of `name`.
    pub fn sequence(&self, name: &str) -> Option<Vec<u8>> {
        self.rows.get(name).map(|row| self.render(row))
    }

    /// Converts to the immutable output form.
    /// Rows keep accumulation order.
    pub fn into_alignment(self) -> Result<Alignment, DivError> {
        let mut aln = Alignment::new();
        for (name, row) in &self.rows {
            aln.push(name.clone(), self.render(row))?;
        }
        Ok(aln)
    }

    /// Only the backbone columns of every sequence.
    pub fn remove_insertion_columns(&self) -> Result<Alignment, DivError> {
        let mut aln = Alignment::new();
        for (name, row) in &self.rows {
            aln.push(name.clone(), row.backbone.clone())?;
        }
        Ok(aln)
    }

    /// 0-based indices of insertion columns in the rendered output.
    pub fn insertion_columns(&self) -> Vec<usize> {
        let mut cols = Vec::with_capacity(self.width() - self.backbone_width);
        let mut pos = 0;
        for anchor in 0..=self.backbone_width {
            cols.extend(pos..pos + self.widths[anchor]);
            pos += self.widths[anchor] + 1;
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backbone(pairs: &[(&str, &str)]) -> ExtendedAlignment {
        let aln =
            Alignment::from_pairs(pairs.iter().map(|(n, s)| (*n, s.as_bytes().to_vec()))).unwrap();
        ExtendedAlignment::from_backbone(&aln).unwrap()
    }

    fn a2m(pairs: &[(&str, &str)], columns: &ColumnMap, origin: Origin) -> ExtendedAlignment {
        ExtendedAlignment::from_a2m(
            pairs
                .iter()
                .map(|(n, s)| (n.to_string(), s.as_bytes().to_vec())),
            columns,
            origin,
        )
        .unwrap()
    }

    fn seq(ext: &ExtendedAlignment, name: &str) -> String {
        String::from_utf8(ext.sequence(name).unwrap()).unwrap()
    }

    #[test]
    fn test_from_a2m_relabel() {
        // local match columns 0,1,2 -> global 0,2,3 of a 4-column backbone
        let columns = ColumnMap::new(4, vec![0, 2, 3]);
        let ext = a2m(&[("f1", "AgtC-"), ("f2", "aA-.T")], &columns, Origin::Subset(0));

        assert_eq!(ext.backbone_width(), 4);
        let f1 = ext.row("f1").unwrap();
        assert_eq!(f1.backbone(), b"A-C-");
        assert_eq!(f1.insertion(1), b"gt");

        let f2 = ext.row("f2").unwrap();
        assert_eq!(f2.backbone(), b"A--T");
        assert_eq!(f2.insertion(0), b"a");
        // trailing '.' trimmed
        assert_eq!(f2.insertion(3), b"");

        assert_eq!(ext.block_width(0), 1);
        assert_eq!(ext.block_width(1), 2);
        assert_eq!(seq(&ext, "f1"), "-Agt-C-");
    }

    #[test]
    fn test_from_a2m_wrong_width() {
        let columns = ColumnMap::identity(3);
        let res = ExtendedAlignment::from_a2m(
            vec![("f1".to_string(), b"ACGT".to_vec())],
            &columns,
            Origin::Chunk { subset: 1, chunk: 0 },
        );
        let err = res.unwrap_err();
        assert_eq!(err.origin, Origin::Chunk { subset: 1, chunk: 0 });
        assert_eq!(
            err.conflict,
            Conflict::BackboneWidth {
                expected: 3,
                found: 4
            }
        );

        let res = ExtendedAlignment::from_a2m(
            vec![("f1".to_string(), b"Ac".to_vec())],
            &columns,
            Origin::Subset(0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_padding() {
        // receiver: S1 inserts "ab" after backbone column 0, S2 nothing
        let mut receiver = backbone(&[("S2", "AC")]);
        let columns = ColumnMap::identity(2);
        receiver
            .merge_in(a2m(&[("S1", "AabC")], &columns, Origin::Subset(0)))
            .unwrap();
        assert_eq!(receiver.block_width(1), 2);

        let other = a2m(&[("S3", "AcC")], &columns, Origin::Subset(1));
        assert_eq!(other.block_width(1), 1);
        receiver.merge_in(other).unwrap();

        assert_eq!(receiver.block_width(1), 2);
        assert_eq!(receiver.row("S1").unwrap().insertion(1), b"ab");
        assert_eq!(seq(&receiver, "S1"), "AabC");
        assert_eq!(seq(&receiver, "S2"), "A--C");
        assert_eq!(seq(&receiver, "S3"), "Ac-C");
        assert_eq!(
            receiver.block_contributors(1),
            &[Origin::Subset(0), Origin::Subset(1)]
        );
    }

    #[test]
    fn test_backbone_invariance() {
        let mut receiver = backbone(&[("b1", "AC-T"), ("b2", "A-GT")]);
        let before: Vec<Vec<u8>> = ["b1", "b2"]
            .iter()
            .map(|n| receiver.row(n).unwrap().backbone().to_vec())
            .collect();

        let columns = ColumnMap::identity(4);
        receiver
            .merge_in(a2m(
                &[("f1", "aaAC-Tt"), ("b1", "AC-T")],
                &columns,
                Origin::Chunk { subset: 0, chunk: 0 },
            ))
            .unwrap();
        receiver
            .merge_in(a2m(&[("f2", "A-ggGT")], &columns, Origin::Chunk { subset: 0, chunk: 1 }))
            .unwrap();

        for (name, old) in ["b1", "b2"].iter().zip(before) {
            assert_eq!(receiver.row(name).unwrap().backbone(), old.as_slice());
        }
        let aln = receiver.into_alignment().unwrap();
        assert!(aln.is_aligned());
        assert_eq!(aln.names().collect::<Vec<_>>(), vec!["b1", "b2", "f1", "f2"]);
        assert_eq!(aln.get("b1"), Some(&b"--AC---T-"[..]));
        assert_eq!(aln.get("f1"), Some(&b"aaAC---Tt"[..]));
        assert_eq!(aln.get("f2"), Some(&b"--A-ggGT-"[..]));
    }

    #[test]
    fn test_empty_merge_is_identity() {
        let mut receiver = backbone(&[("b1", "ACGT")]);
        let columns = ColumnMap::identity(4);
        receiver
            .merge_in(a2m(&[("f1", "ACgGT")], &columns, Origin::Subset(0)))
            .unwrap();
        let snapshot = receiver.clone();

        receiver
            .merge_in(ExtendedAlignment::new(4, Origin::Subset(1)))
            .unwrap();
        assert_eq!(receiver, snapshot);

        // an empty alignment is skipped even with another coordinate system
        receiver
            .merge_in(ExtendedAlignment::new(0, Origin::Subset(2)))
            .unwrap();
        assert_eq!(receiver, snapshot);
    }

    #[test]
    fn test_merge_width_mismatch() {
        let mut receiver = backbone(&[("b1", "ACGT")]);
        let other = a2m(&[("f1", "ACG")], &ColumnMap::identity(3), Origin::Subset(4));
        let err = receiver.merge_in(other).unwrap_err();
        assert_eq!(err.origin, Origin::Subset(4));
        assert!(matches!(
            err.conflict,
            Conflict::BackboneWidth {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_merge_symbol_mismatch_leaves_receiver() {
        let mut receiver = backbone(&[("b1", "ACGT")]);
        let snapshot = receiver.clone();
        let other = a2m(
            &[("f1", "ACGT"), ("b1", "ACCT")],
            &ColumnMap::identity(4),
            Origin::Chunk { subset: 3, chunk: 2 },
        );
        let err = receiver.merge_in(other).unwrap_err();
        assert_eq!(
            err.conflict,
            Conflict::Symbol {
                name: "b1".to_string(),
                column: 2,
                expected: b'G',
                found: b'C'
            }
        );
        assert_eq!(receiver, snapshot);
    }

    #[test]
    fn test_merge_insertion_conflict() {
        let columns = ColumnMap::identity(2);
        let mut receiver = a2m(&[("f1", "AaC")], &columns, Origin::Subset(0));
        let other = a2m(&[("f1", "AgC")], &columns, Origin::Subset(1));
        let err = receiver.merge_in(other).unwrap_err();
        assert!(matches!(err.conflict, Conflict::Insertion { anchor: 1, .. }));

        // the same content from both sides is accepted
        let same = a2m(&[("f1", "AaC")], &columns, Origin::Subset(2));
        receiver.merge_in(same).unwrap();
        assert_eq!(seq(&receiver, "f1"), "AaC");
    }

    #[test]
    fn test_shared_row_gains_insertion() {
        let columns = ColumnMap::identity(2);
        let mut receiver = backbone(&[("b1", "AC")]);
        receiver
            .merge_in(a2m(&[("b1", "AttC")], &columns, Origin::Subset(0)))
            .unwrap();
        assert_eq!(seq(&receiver, "b1"), "AttC");
    }

    #[test]
    fn test_remove_insertion_columns() {
        let mut receiver = backbone(&[("b1", "AC-T")]);
        let columns = ColumnMap::identity(4);
        receiver
            .merge_in(a2m(&[("f1", "gAcC-Tt")], &columns, Origin::Subset(0)))
            .unwrap();

        let masked = receiver.remove_insertion_columns().unwrap();
        assert_eq!(masked.width(), receiver.backbone_width());
        assert_eq!(masked.get("b1"), Some(&b"AC-T"[..]));
        assert_eq!(masked.get("f1"), Some(&b"AC-T"[..]));

        let cols = receiver.insertion_columns();
        assert_eq!(cols, vec![0, 2, 6]);

        // retained columns of the unmasked output are exactly the backbone columns
        let full = receiver.clone().into_alignment().unwrap();
        for name in ["b1", "f1"] {
            let row = full.get(name).unwrap();
            let kept: Vec<u8> = row
                .iter()
                .enumerate()
                .filter(|(i, _)| !cols.contains(i))
                .map(|(_, &b)| b)
                .collect();
            assert_eq!(kept.as_slice(), masked.get(name).unwrap());
        }
        // masking does not touch the unmasked alignment
        assert_eq!(receiver.width(), 7);
    }

    #[test]
    fn test_column_map_anchor() {
        let columns = ColumnMap::new(6, vec![1, 2, 5]);
        assert_eq!(columns.anchor(0), 0);
        assert_eq!(columns.anchor(1), 2);
        assert_eq!(columns.anchor(3), 6);
    }
}
