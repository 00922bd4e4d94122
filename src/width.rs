//! Terminal display width helpers.

/// Display width of a string once ANSI escapes are stripped.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Strip ANSI escapes, e.g. to compare rendered output in tests or logs.
pub fn plain_text(text: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text)).into_owned()
}

/// Right-pad `text` with spaces to `width` display columns.
pub fn pad_to(text: &str, width: usize) -> String {
    let current = display_width(text);
    let mut padded = text.to_string();
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(current)));
    padded
}
