//! Markdown to terminal lines
//!
//! Answers come from a remote service and are treated as untrusted: every
//! control character except the newline is dropped before parsing, so an
//! answer cannot smuggle escape sequences into the terminal. Only a small,
//! chat-sized subset of Markdown is understood; anything else is shown as
//! literal text.

use std::sync::OnceLock;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

use crate::theme::Palette;

const SAFE_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("heading regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("bullet regex"))
}

fn ordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(\d{1,9})[.)]\s+(.*)$").expect("ordered regex"))
}

fn quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s{0,3}>\s?(.*)$").expect("quote regex"))
}

fn rule_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s{0,3}(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").expect("rule regex")
    })
}

/// Strip control characters (keeps `\n`, expands `\t`).
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Plain text, one line per input line. Used for the user's own messages.
pub fn render_plain(text: &str, style: Style) -> Vec<Line<'static>> {
    sanitize(text)
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

/// Render Markdown into styled lines.
pub fn render(text: &str, palette: &Palette) -> Vec<Line<'static>> {
    let clean = sanitize(text);
    let base = Style::default().fg(palette.text);
    let muted = Style::default().fg(palette.muted);
    let code = Style::default().fg(palette.code_fg).bg(palette.code_bg);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut in_fence = false;

    for raw in clean.lines() {
        let trimmed = raw.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(Line::from(Span::styled(format!("  {}", raw), code)));
            continue;
        }
        if raw.trim().is_empty() {
            lines.push(Line::default());
            continue;
        }
        if rule_re().is_match(raw) {
            lines.push(Line::from(Span::styled("─".repeat(24), muted)));
            continue;
        }

        if let Some(caps) = heading_re().captures(raw) {
            let mut style = base.fg(palette.accent).add_modifier(Modifier::BOLD);
            if caps[1].len() == 1 {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            lines.push(Line::from(parse_inline(&caps[2], style, palette)));
        } else if let Some(caps) = bullet_re().captures(raw) {
            let mut spans = vec![Span::styled(
                format!("{}• ", indent(&caps[1])),
                Style::default().fg(palette.accent),
            )];
            spans.extend(parse_inline(&caps[2], base, palette));
            lines.push(Line::from(spans));
        } else if let Some(caps) = ordered_re().captures(raw) {
            let mut spans = vec![Span::styled(
                format!("{}{}. ", indent(&caps[1]), &caps[2]),
                Style::default().fg(palette.accent),
            )];
            spans.extend(parse_inline(&caps[3], base, palette));
            lines.push(Line::from(spans));
        } else if let Some(caps) = quote_re().captures(raw) {
            let quoted = muted.add_modifier(Modifier::ITALIC);
            let mut spans = vec![Span::styled("│ ", muted)];
            spans.extend(parse_inline(&caps[1], quoted, palette));
            lines.push(Line::from(spans));
        } else {
            lines.push(Line::from(parse_inline(raw, base, palette)));
        }
    }

    lines
}

/// Two spaces per nesting level, where a level is two columns of source indent.
fn indent(leading: &str) -> String {
    "  ".repeat(leading.chars().count() / 2)
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    SAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Position of `needle` in `chars` at or after `from`.
fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if needle.is_empty() || chars.len() < needle.len() {
        return None;
    }
    (from..=chars.len() - needle.len()).find(|&i| chars[i..i + needle.len()] == *needle)
}

/// Inline emphasis, code spans and links.
fn parse_inline(text: &str, base: Style, palette: &Palette) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    let flush = |current: &mut String, spans: &mut Vec<Span<'static>>| {
        if !current.is_empty() {
            spans.push(Span::styled(std::mem::take(current), base));
        }
    };

    while i < chars.len() {
        let c = chars[i];

        // **bold**
        if c == '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(end) = find_seq(&chars, i + 2, &['*', '*']) {
                if end > i + 2 {
                    flush(&mut current, &mut spans);
                    let inner: String = chars[i + 2..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::BOLD), palette));
                    i = end + 2;
                    continue;
                }
            }
            current.push_str("**");
            i += 2;
            continue;
        }

        // *italic* or _italic_ (underscores only at word boundaries)
        if c == '*' || (c == '_' && !prev_is_word(&chars, i)) {
            if let Some(end) = find_seq(&chars, i + 1, &[c]) {
                let closes_word = c != '_' || !chars.get(end + 1).is_some_and(|n| n.is_alphanumeric());
                if end > i + 1 && closes_word {
                    flush(&mut current, &mut spans);
                    let inner: String = chars[i + 1..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::ITALIC), palette));
                    i = end + 1;
                    continue;
                }
            }
        }

        // `code`
        if c == '`' {
            if let Some(end) = find_seq(&chars, i + 1, &['`']) {
                flush(&mut current, &mut spans);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(
                    inner,
                    Style::default().fg(palette.code_fg).bg(palette.code_bg),
                ));
                i = end + 1;
                continue;
            }
        }

        // [label](url)
        if c == '[' {
            if let Some(mid) = find_seq(&chars, i + 1, &[']', '(']) {
                if let Some(end) = find_seq(&chars, mid + 2, &[')']) {
                    flush(&mut current, &mut spans);
                    let label: String = chars[i + 1..mid].iter().collect();
                    let url: String = chars[mid + 2..end].iter().collect();
                    push_link(&mut spans, &label, &url, base, palette);
                    i = end + 1;
                    continue;
                }
            }
        }

        current.push(c);
        i += 1;
    }

    flush(&mut current, &mut spans);
    spans
}

fn prev_is_word(chars: &[char], i: usize) -> bool {
    i > 0 && chars[i - 1].is_alphanumeric()
}

fn push_link(spans: &mut Vec<Span<'static>>, label: &str, url: &str, base: Style, palette: &Palette) {
    let url = url.trim();
    let label = if label.trim().is_empty() { url } else { label };
    spans.push(Span::styled(
        label.to_string(),
        base.fg(palette.link).add_modifier(Modifier::UNDERLINED),
    ));

    if is_safe_url(url) && label != url {
        spans.push(Span::styled(
            format!(" ({})", url),
            Style::default().fg(palette.muted),
        ));
    } else if !is_safe_url(url) {
        tracing::debug!(%url, "dropped link target with unsupported scheme");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Theme;
    use crate::theme::palette;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn rendered(md: &str) -> Vec<Line<'static>> {
        render(md, palette(Theme::Light))
    }

    #[test]
    fn test_sanitize_strips_escape_sequences() {
        let clean = sanitize("safe\x1b[2J\x1b]0;pwned\x07 text\r\nnext\tcol\u{9b}");
        assert_eq!(clean, "safe[2J]0;pwned text\nnext    col");
        assert!(!clean.chars().any(|c| c.is_control() && c != '\n'));
    }

    #[test]
    fn test_bold_is_styled() {
        let lines = rendered("This is **important** news");
        assert_eq!(text_of(&lines[0]), "This is important news");
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "important")
            .unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let lines = rendered("**no close");
        assert_eq!(text_of(&lines[0]), "**no close");
    }

    #[test]
    fn test_italic_and_snake_case() {
        let lines = rendered("an *aside* about some_var_name");
        assert_eq!(text_of(&lines[0]), "an aside about some_var_name");
        let italic = lines[0].spans.iter().find(|s| s.content == "aside").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_headings_and_lists() {
        let lines = rendered("# Title\n- first\n  - nested\n2. second");
        assert_eq!(text_of(&lines[0]), "Title");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(text_of(&lines[1]), "• first");
        assert_eq!(text_of(&lines[2]), "  • nested");
        assert_eq!(text_of(&lines[3]), "2. second");
    }

    #[test]
    fn test_heading_keeps_hash_inside_word() {
        let lines = rendered("# C#\n## Closed heading ##\n### F# and C# ###");
        assert_eq!(text_of(&lines[0]), "C#");
        assert_eq!(text_of(&lines[1]), "Closed heading");
        assert_eq!(text_of(&lines[2]), "F# and C#");
    }

    #[test]
    fn test_safe_link_shows_target() {
        let lines = rendered("according to [Yahoo News](https://news.yahoo.com/a)");
        assert_eq!(
            text_of(&lines[0]),
            "according to Yahoo News (https://news.yahoo.com/a)"
        );
        let label = lines[0].spans.iter().find(|s| s.content == "Yahoo News").unwrap();
        assert!(label.style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_unsafe_link_hides_target() {
        let lines = rendered("[click me](javascript:alert(1))");
        let text = text_of(&lines[0]);
        assert!(text.starts_with("click me"));
        assert!(!text.contains("javascript:alert"));
    }

    #[test]
    fn test_code_fence_is_not_parsed() {
        let lines = rendered("```\nlet x = **y**;\n```\nafter");
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "  let x = **y**;");
        assert_eq!(text_of(&lines[1]), "after");
    }

    #[test]
    fn test_inline_code_and_rule() {
        let lines = rendered("run `cargo *test*`\n---");
        assert_eq!(text_of(&lines[0]), "run cargo *test*");
        assert_eq!(text_of(&lines[1]), "─".repeat(24));
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let lines = rendered("one\n\ntwo");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn test_render_plain_does_not_parse() {
        let lines = render_plain("**raw** [x](y)\nline two", Style::default());
        assert_eq!(text_of(&lines[0]), "**raw** [x](y)");
        assert_eq!(lines.len(), 2);
    }
}
