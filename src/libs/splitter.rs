use crate::libs::alignment::Alignment;
use crate::libs::error::DivError;
use rand::Rng;

/// `min(100, 20% of the taxa)`, kept within `1..=num_taxa`.
pub fn default_backbone_size(num_taxa: usize) -> usize {
    std::cmp::min(100, num_taxa / 5).clamp(1.min(num_taxa), num_taxa)
}

/// The two halves of a split input set.
#[derive(Debug, Clone)]
pub struct Split {
    pub backbone: Alignment,
    pub query: Alignment,
}

/// Draws `backbone_size` sequences uniformly without replacement.
///
/// The drawn sequences leave the query pool. Both halves keep input order.
/// When `backbone_size` is `None`, [`default_backbone_size`] is used.
pub fn split_backbone<R: Rng>(
    sequences: Alignment,
    backbone_size: Option<usize>,
    rng: &mut R,
) -> Result<Split, DivError> {
    let total = sequences.num_taxa();
    let size = backbone_size.unwrap_or_else(|| default_backbone_size(total));
    if size > total {
        return Err(DivError::Configuration(format!(
            "Backbone size {} is larger than the number of sequences {}",
            size, total
        )));
    }

    let mut picked = rand::seq::index::sample(rng, total, size).into_vec();
    picked.sort_unstable();
    let names: Vec<String> = {
        let all: Vec<&String> = sequences.names().collect();
        picked.iter().map(|&i| all[i].clone()).collect()
    };

    let mut query = sequences;
    let backbone = query.split_off(&names);
    log::info!(
        "Split {} sequences into a backbone of {} and a query set of {}",
        total,
        backbone.num_taxa(),
        query.num_taxa()
    );

    Ok(Split { backbone, query })
}
