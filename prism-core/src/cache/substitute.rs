use aho_corasick::{AhoCorasick, BuildError, MatchKind};

/// Replace every occurrence of each token with its value in a single left-to-right pass.
///
/// Works on raw bytes, so content that is not UTF-8 passes through untouched.
/// Tokens are plain text, never patterns. Inserted values are not scanned again.
/// When several tokens match at the same position the longest one wins.
pub fn replace_tokens(content: &[u8], pairs: &[(String, String)]) -> Result<Vec<u8>, BuildError> {
    let (tokens, values): (Vec<&str>, Vec<&str>) = pairs
        .iter()
        .filter(|(token, _)| !token.is_empty())
        .map(|(token, value)| (token.as_str(), value.as_str()))
        .unzip();
    if tokens.is_empty() {
        return Ok(content.to_vec());
    }

    let automaton = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&tokens)?;
    Ok(automaton.replace_all_bytes(content, &values))
}
