const MAX_VISIBLE_CHARS: usize = 100;

const SENSITIVE_MARKERS: [&str; 5] = ["Bearer ", "api_key=", "password=", "secret=", "token="];

/// Renders user supplied text for a log line: one line, bounded length,
/// credentials masked.
pub fn sanitize_prompt(prompt: &str) -> String {
    let flattened = prompt.split_whitespace().collect::<Vec<_>>().join(" ");

    if flattened.is_empty() {
        return String::from("[EMPTY]");
    }

    let total = flattened.chars().count();
    let visible = if total > MAX_VISIBLE_CHARS {
        let head: String = flattened.chars().take(MAX_VISIBLE_CHARS).collect();
        format!("{}... ({} chars total)", head, total)
    } else {
        flattened
    };

    redact_sensitive_markers(&visible)
}

fn redact_sensitive_markers(text: &str) -> String {
    let mut result = text.to_string();

    for marker in SENSITIVE_MARKERS {
        let mut search_from = 0;
        while let Some(found) = result[search_from..].find(marker) {
            let value_start = search_from + found + marker.len();
            let value_end = result[value_start..]
                .find(|c: char| c.is_whitespace() || matches!(c, '&' | '"' | '\''))
                .map(|i| value_start + i)
                .unwrap_or(result.len());

            result.replace_range(value_start..value_end, "[REDACTED]");
            search_from = value_start + "[REDACTED]".len();
        }
    }

    result
}
