//! Replaces `$...$` and `$$...$$` math in prose lines with inline code holding the Unicode form.
//!
//! Inline math follows the Pandoc rules: the opening `$` must be followed by a non-space
//! character, the closing `$` must be preceded by one and must not be followed by a digit. So
//! "costs $5 and $10" stays as it is. `\$` is a literal dollar sign, and backtick code spans and
//! fenced code blocks are left untouched. Math that fails to convert is kept verbatim.
use tracing::debug;

use crate::blocks::fence_marker;
use crate::math::to_unicode;

/// Substitutes math in `lines`. Display math may change the number of lines.
pub fn substitute_math<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut fence: Option<char> = None;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_ref();

        if let Some(open) = fence {
            if fence_marker(line) == Some(open) {
                fence = None;
            }
            out.push(line.to_string());
            i += 1;
            continue;
        }
        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            out.push(line.to_string());
            i += 1;
            continue;
        }

        let trimmed = line.trim();
        if trimmed == "$$" {
            let close = (i + 1..lines.len()).find(|&j| lines[j].as_ref().trim() == "$$");
            let Some(close) = close else {
                debug!(line = i, "unterminated display math left as is");
                out.push(line.to_string());
                i += 1;
                continue;
            };
            let body = lines[i + 1..close]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join(" ");
            match to_unicode(&body) {
                Ok(text) => push_display(&mut out, &text),
                Err(error) => {
                    debug!(%error, line = i, "display math left as is");
                    out.extend(lines[i..=close].iter().map(|l| l.as_ref().to_string()));
                }
            }
            i = close + 1;
            continue;
        }
        if let Some(body) = single_line_display(trimmed) {
            match to_unicode(body) {
                Ok(text) => push_display(&mut out, &text),
                Err(error) => {
                    debug!(%error, line = i, "display math left as is");
                    out.push(line.to_string());
                }
            }
            i += 1;
            continue;
        }

        out.push(substitute_inline(line));
        i += 1;
    }
    out
}

/// `$$ x $$` on a line of its own.
fn single_line_display(trimmed: &str) -> Option<&str> {
    let body = trimmed.strip_prefix("$$")?.strip_suffix("$$")?;
    (!body.trim().is_empty()).then_some(body)
}

fn push_display(out: &mut Vec<String>, text: &str) {
    out.push(String::new());
    out.push(code_span(text));
    out.push(String::new());
}

fn code_span(text: &str) -> String {
    if text.contains('`') {
        format!("`` {text} ``")
    } else {
        format!("`{text}`")
    }
}

/// Substitutes inline math within one line.
pub fn substitute_inline(line: &str) -> String {
    let b = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'\\' if b.get(i + 1) == Some(&b'$') => {
                out.push_str("\\$");
                i += 2;
            }
            b'`' => {
                let run = b[i..].iter().take_while(|&&c| c == b'`').count();
                let end = closing_backticks(b, i + run, run).unwrap_or(i + run);
                out.push_str(&line[i..end]);
                i = end;
            }
            b'$' => match inline_close(b, i) {
                Some(close) => {
                    let body = &line[i + 1..close];
                    match to_unicode(body) {
                        Ok(text) => out.push_str(&code_span(&text)),
                        Err(error) => {
                            debug!(%error, math = body, "inline math left as is");
                            out.push_str(&line[i..=close]);
                        }
                    }
                    i = close + 1;
                }
                None => {
                    out.push('$');
                    i += 1;
                }
            },
            _ => {
                let step = line[i..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&line[i..i + step]);
                i += step;
            }
        }
    }
    out
}

/// End (exclusive) of the code span whose opening run of `run` backticks ends at `from`.
fn closing_backticks(b: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < b.len() {
        if b[j] == b'`' {
            let len = b[j..].iter().take_while(|&&c| c == b'`').count();
            if len == run {
                return Some(j + len);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

/// Index of the `$` closing the inline math opened at `open`.
fn inline_close(b: &[u8], open: usize) -> Option<usize> {
    let first = *b.get(open + 1)?;
    if first.is_ascii_whitespace() || first == b'$' {
        return None;
    }
    let mut j = open + 1;
    while j < b.len() {
        match b[j] {
            b'\\' => j += 2,
            b'$' => {
                let tight = !b[j - 1].is_ascii_whitespace();
                let digit_follows = b.get(j + 1).is_some_and(u8::is_ascii_digit);
                if tight && !digit_follows {
                    return Some(j);
                }
                j += 1;
            }
            _ => j += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_inline_math_with_code() {
        assert_eq!(
            substitute_inline("The value $x^2$ is positive"),
            "The value `x²` is positive"
        );
        assert_eq!(
            substitute_inline(r"$\alpha$ and $\beta$"),
            "`α` and `β`"
        );
    }

    #[test]
    fn leaves_unconvertible_math_alone() {
        assert_eq!(substitute_inline(r"$\badcmd{$"), r"$\badcmd{$");
    }

    #[test]
    fn follows_pandoc_delimiter_rules() {
        assert_eq!(substitute_inline("costs $5 and $10"), "costs $5 and $10");
        assert_eq!(substitute_inline("a $ b $ c"), "a $ b $ c");
        assert_eq!(substitute_inline(r"\$x$ stays"), r"\$x$ stays");
        assert_eq!(substitute_inline("$x$2"), "$x$2");
        assert_eq!(substitute_inline("$$"), "$$");
    }

    #[test]
    fn skips_code_spans() {
        assert_eq!(substitute_inline("`$x$` and $y$"), "`$x$` and `y`");
        assert_eq!(substitute_inline("``a ` $x$``"), "``a ` $x$``");
    }

    #[test]
    fn replaces_display_blocks() {
        let out = substitute_math(&["before", "$$", r"\frac{a}{b}", "$$", "after"]);
        assert_eq!(out, vec!["before", "", "`a/b`", "", "after"]);

        let out = substitute_math(&[r"$$ \sqrt{2} $$"]);
        assert_eq!(out, vec!["", "`√2`", ""]);
    }

    #[test]
    fn keeps_broken_display_blocks() {
        let lines = ["$$", r"\nope", "$$"];
        assert_eq!(substitute_math(&lines), lines);

        let lines = ["$$", "x^2", "no end"];
        assert_eq!(substitute_math(&lines), lines);
    }

    #[test]
    fn ignores_fenced_code() {
        let lines = ["```sh", "echo $HOME$x", "```", "$x$"];
        assert_eq!(substitute_math(&lines), ["```sh", "echo $HOME$x", "```", "`x`"]);
    }
}
