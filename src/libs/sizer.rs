use crate::libs::alignment::{Alignment, MoleculeType};
use rand::Rng;

pub const BASE_SUBSET_SIZE: usize = 10;

/// Average p-distance above which subsets are enlarged.
pub const DIVERGENCE_THRESHOLD: f64 = 0.60;

/// Pairs evaluated at most when estimating backbone divergence.
pub const MAX_SAMPLED_PAIRS: usize = 20_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    pub subset_size: usize,
    /// `None` for amino acid backbones, which are not measured.
    pub average_p: Option<f64>,
    pub max_p: Option<f64>,
    pub warning: Option<String>,
}

/// Subset size for a backbone with the given divergence and taxon count.
///
/// Starting from 10, a divergent backbone (average p-distance above 0.60)
/// doubles the size for as long as the doubled value stays below the taxon count.
pub fn size_from_divergence(average_p: f64, num_taxa: usize) -> usize {
    let mut size = BASE_SUBSET_SIZE;
    if average_p > DIVERGENCE_THRESHOLD {
        while size * 2 < num_taxa {
            size *= 2;
        }
    }
    size
}

/// Target alignment subset size for the external decomposer.
pub fn subset_size<R: Rng>(backbone: &Alignment, molecule: MoleculeType, rng: &mut R) -> Sizing {
    if !molecule.is_nucleotide() {
        let warning = format!(
            "Automated alignment subset sizing is not implemented for amino acid alignments. Setting to {}.",
            BASE_SUBSET_SIZE
        );
        log::warn!("{}", warning);
        return Sizing {
            subset_size: BASE_SUBSET_SIZE,
            average_p: None,
            max_p: None,
            warning: Some(warning),
        };
    }

    let pd = backbone.p_distance_sampled(rng, MAX_SAMPLED_PAIRS);
    let subset_size = size_from_divergence(pd.average, backbone.num_taxa());
    log::info!(
        "Average p-distance of backbone is {:.2}, max {:.2}. Alignment subset size set to {}.",
        pd.average,
        pd.max,
        subset_size
    );

    Sizing {
        subset_size,
        average_p: Some(pd.average),
        max_p: Some(pd.max),
        warning: None,
    }
}
