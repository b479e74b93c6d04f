//! Escaping for upstream-derived text. Provider payloads are untrusted: names, descriptions and
//! icon codes pass through here before they reach any rendered output.

/// Escape text for insertion into HTML element content or a quoted attribute value.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drop control characters (escape sequences included) so upstream text cannot drive the
/// terminal.
pub fn terminal_safe(input: &str) -> String {
    input.chars().filter(|c| !c.is_control()).collect()
}
