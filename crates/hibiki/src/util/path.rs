const MAX_NAME_LEN: usize = 200;
const FALLBACK_NAME: &str = "untitled";

/// Turn a work title into a filesystem-safe folder name.
///
/// Forbidden characters become `-`, runs of whitespace collapse to a
/// single space, and the result is capped at 200 characters. The
/// function is idempotent: sanitizing an already-sanitized name returns
/// it unchanged.
pub fn sanitize_title(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    // Trim again after the cut so a trailing space cannot survive and
    // break idempotency.
    let capped: String = collapsed.chars().take(MAX_NAME_LEN).collect();
    let capped = capped.trim_end();

    if capped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        capped.to_string()
    }
}
