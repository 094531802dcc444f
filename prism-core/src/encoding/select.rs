use crate::encoding::{Encoding, EncodingName};
use crate::setup::Sizes;

/// The rendering chosen for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub encoding: EncodingName,
    pub size: u64,
}

/// Pick the variant to serve.
///
/// Only encodings with a variant on disk are considered. Among those sharing
/// the highest weight the smallest wins; a lower weight is never preferred over
/// a higher one, however small it is. When nothing acceptable exists the
/// identity variant is served instead of a 406.
pub fn select_variant(ranked: &[Encoding], sizes: &Sizes) -> Variant {
    let candidates: Vec<(f32, Variant)> = ranked
        .iter()
        .filter_map(|e| {
            sizes.get(e.name).map(|size| {
                (
                    e.weight,
                    Variant {
                        encoding: e.name,
                        size,
                    },
                )
            })
        })
        .collect();

    let top = candidates
        .iter()
        .map(|(weight, _)| *weight)
        .fold(f32::NEG_INFINITY, f32::max);

    // min_by_key keeps the first of equal sizes, so ties follow the ranking.
    candidates
        .into_iter()
        .filter(|(weight, _)| *weight == top)
        .map(|(_, variant)| variant)
        .min_by_key(|variant| variant.size)
        .unwrap_or(Variant {
            encoding: EncodingName::Identity,
            size: sizes.identity,
        })
}
