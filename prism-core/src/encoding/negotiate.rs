use crate::encoding::{Encoding, EncodingName};
use std::cmp::Ordering;

/// Weight given to identity when the client does not mention it.
///
/// Low enough that any explicitly negotiated encoding wins, but still usable.
pub const IDENTITY_BASELINE_WEIGHT: f32 = 0.1;

/// Encodings a `*` entry stands in for. Brotli is only selected when named.
const CATCH_ALL_ENCODINGS: [EncodingName; 2] = [EncodingName::Deflate, EncodingName::Gzip];

/// Parse an `Accept-Encoding` header into encodings ranked by preference.
///
/// Never fails: unknown codings and malformed parameters are dropped. The
/// result is sorted by descending weight, ties broken by name.
pub fn parse_accept_encoding(header: Option<&str>) -> Vec<Encoding> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => {
            return vec![Encoding::new(
                EncodingName::Identity,
                IDENTITY_BASELINE_WEIGHT,
            )];
        }
    };

    let mut mentioned: Vec<Encoding> = Vec::new();
    let mut identity: Option<f32> = None;
    let mut catch_all: Option<f32> = None;

    for token in header.split(',') {
        let mut parts = token.split(';').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let weight = parse_weight(parts);

        // Repeated codings each count; a later identity or `*` replaces an earlier one.
        if name.eq_ignore_ascii_case("br") {
            mentioned.push(Encoding::new(EncodingName::Brotli, weight));
        } else if name.eq_ignore_ascii_case("gzip") {
            mentioned.push(Encoding::new(EncodingName::Gzip, weight));
        } else if name.eq_ignore_ascii_case("deflate") {
            mentioned.push(Encoding::new(EncodingName::Deflate, weight));
        } else if name.eq_ignore_ascii_case("identity") {
            identity = Some(weight);
        } else if name == "*" {
            catch_all = Some(weight);
        }
    }

    let mut unmentioned: Vec<EncodingName> = CATCH_ALL_ENCODINGS
        .into_iter()
        .filter(|name| !mentioned.iter().any(|e| e.name == *name))
        .collect();
    match identity {
        Some(weight) => mentioned.push(Encoding::new(EncodingName::Identity, weight)),
        None => unmentioned.push(EncodingName::Identity),
    }

    match catch_all {
        Some(weight) => {
            mentioned.extend(unmentioned.into_iter().map(|name| Encoding::new(name, weight)));
        }
        None if identity.is_none() => {
            mentioned.push(Encoding::new(
                EncodingName::Identity,
                IDENTITY_BASELINE_WEIGHT,
            ));
        }
        None => {}
    }

    // NaN weights fail this comparison as well.
    mentioned.retain(|e| e.weight > 0.0);
    mentioned.sort_by(rank);
    mentioned
}

/// Extract `q` from the parameters following a coding. Defaults to 1.
fn parse_weight<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    for param in params {
        let mut kv = param.splitn(2, '=').map(str::trim);
        if kv.next() == Some("q") {
            return kv.next().and_then(|v| v.parse().ok()).unwrap_or(0.0);
        }
    }

    1.0
}

fn rank(a: &Encoding, b: &Encoding) -> Ordering {
    b.weight
        .partial_cmp(&a.weight)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.name.as_str().cmp(b.name.as_str()))
}
