use unicode_segmentation::UnicodeSegmentation;

use crate::util::unicode::{display_width, grapheme_display_width, truncate_to_width};

/// Word-wrap text to `width` cells. Explicit newlines are kept as line breaks.
///
/// Break rules (priority order):
/// 1. Whitespace between words
/// 2. After hyphens inside a word too long for one line
/// 3. Grapheme wrap as the fallback for long tokens
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            out.push(String::new());
        } else {
            wrap_line(raw, width, &mut out);
        }
    }
    out
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if width == 0 {
        out.push(line.to_string());
        return;
    }

    let mut current = String::new();
    let mut current_w = 0;
    for word in line.split_whitespace() {
        let ww = display_width(word);
        let sep = usize::from(!current.is_empty());
        if current_w + sep + ww <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_w += sep + ww;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if ww <= width {
            current.push_str(word);
            current_w = ww;
            continue;
        }

        let mut chunks = split_long_word(word, width);
        let last = chunks.pop();
        out.extend(chunks);
        if let Some(last) = last {
            current_w = display_width(&last);
            current = last;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

fn split_long_word(word: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = word;
    while display_width(rest) > width {
        let mut w = 0;
        let mut cut = 0;
        let mut hyphen_cut = None;
        for (i, g) in rest.grapheme_indices(true) {
            let gw = grapheme_display_width(g);
            if w + gw > width {
                break;
            }
            w += gw;
            cut = i + g.len();
            if g == "-" {
                hyphen_cut = Some(cut);
            }
        }
        if cut == 0 {
            // a single grapheme wider than the column
            cut = rest.graphemes(true).next().map_or(rest.len(), str::len);
        }
        let cut = hyphen_cut.unwrap_or(cut);
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Wrap text into exactly `lines` lines: short text is padded with empty
/// lines, long text is cropped and the last kept line ends with `…`.
pub fn wrap_to_lines(text: &str, width: usize, lines: usize) -> Vec<String> {
    let mut wrapped = wrap_text(text, width);
    if wrapped.len() > lines {
        wrapped.truncate(lines);
        if let Some(last) = wrapped.last_mut() {
            if display_width(last) < width {
                last.push('\u{2026}');
            } else {
                // one extra cell forces truncate_to_width to make room for the ellipsis
                *last = truncate_to_width(&format!("{last} "), width);
            }
        }
    }
    wrapped.resize(lines, String::new());
    wrapped
}
