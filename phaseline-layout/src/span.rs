//! Locating values in layout source for diagnostics.

use miette::SourceSpan;

/// Find every `key = "value"` assignment in `src`.
///
/// Returned spans cover the value without its quotes, in source order.
pub(crate) fn find_value_spans(src: &str, key: &str, value: &str) -> Vec<SourceSpan> {
    let patterns = [
        format!("{} = \"{}\"", key, value), // name = "Store"
        format!("{}=\"{}\"", key, value),   // name="Store"
    ];

    let mut spans: Vec<SourceSpan> = patterns
        .iter()
        .flat_map(|pattern| {
            src.match_indices(pattern.as_str()).map(move |(pos, _)| {
                // Skip to the value, past the opening quote
                let start = pos + pattern.len() - value.len() - 1;
                SourceSpan::from((start, value.len()))
            })
        })
        .collect();

    spans.sort_by_key(|span| span.offset());
    spans
}
