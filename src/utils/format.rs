use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Human readable size with one decimal ("512.0 B", "1.5 GB").
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// Cut a string so that it occupies at most `max_width` terminal columns.
pub fn truncate_to_display_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if width + cw > max_width {
            break;
        }
        width += cw;
        out.push(c);
    }
    out
}

/// Keep the tail of a string that fits in `max_width` columns, prefixed with "...".
/// Used for long paths in panel titles where the deepest components matter most.
pub fn truncate_path_left(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return truncate_to_display_width("...", max_width);
    }
    let budget = max_width - 3;
    let mut width = 0;
    let mut tail: Vec<char> = Vec::new();
    for c in s.chars().rev() {
        let cw = c.width().unwrap_or(0);
        if width + cw > budget {
            break;
        }
        width += cw;
        tail.push(c);
    }
    let suffix: String = tail.into_iter().rev().collect();
    format!("...{}", suffix)
}

/// Remove ANSI escape sequences (CSI and OSC) and stray control characters.
///
/// Transfer tools redraw their progress display with cursor movement codes,
/// which would otherwise show up as garbage in the output pane.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // CSI: parameters until a final byte in @..~
                    for n in chars.by_ref() {
                        if ('@'..='~').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // OSC: terminated by BEL or ESC \
                    while let Some(n) = chars.next() {
                        if n == '\u{7}' {
                            break;
                        }
                        if n == '\u{1b}' {
                            if chars.peek() == Some(&'\\') {
                                chars.next();
                            }
                            break;
                        }
                    }
                }
                _ => {
                    chars.next();
                }
            }
            continue;
        }
        if c == '\t' || !c.is_control() {
            out.push(c);
        }
    }
    out
}
