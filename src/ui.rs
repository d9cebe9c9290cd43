use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::markdown;
use crate::state::{Role, Theme};
use crate::theme::{palette, Palette};

const TITLE: &str = "ChaturAI";
const TAGLINE: &str = "Smarter with Context. Powered by RAG.";
const PLACEHOLDER: &str = "Ask about today's tech, biz, or world news...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = palette(app.session.theme());

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    // Main layout: header, conversation, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, palette, frame, header_area);
    render_chat(app, palette, frame, chat_area);
    render_input(app, palette, frame, input_area);
    render_footer(palette, frame, footer_area);
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let toggle = match app.session.theme() {
        Theme::Light => " ^T Toggle Dark Mode ",
        Theme::Dark => " ^T Toggle Light Mode ",
    };

    let [title_area, toggle_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(toggle.chars().count() as u16),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().fg(palette.accent).bold()),
        Span::styled(TAGLINE, Style::default().fg(palette.muted)),
    ]);
    frame.render_widget(
        Paragraph::new(title).style(Style::default().bg(palette.surface)),
        title_area,
    );

    let toggle = Paragraph::new(Span::styled(
        toggle,
        Style::default().fg(palette.text).bg(palette.border),
    ))
    .style(Style::default().bg(palette.surface));
    frame.render_widget(toggle, toggle_area);
}

/// All conversation lines, oldest first, plus the thinking indicator.
fn chat_lines(app: &App, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.messages() {
        match msg.role() {
            Role::User => {
                lines.push(
                    Line::from(Span::styled(
                        "You",
                        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
                    ))
                    .right_aligned(),
                );
                let bubble = Style::default().fg(palette.user_fg).bg(palette.user_bg);
                for line in markdown::render_plain(msg.text(), bubble) {
                    lines.push(line.right_aligned());
                }
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    TITLE,
                    Style::default().fg(palette.bot_label).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown::render(msg.text(), palette));
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_busy() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{} is thinking{}", TITLE, dots),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.background));
    let inner = block.inner(area);

    let text = if app.session.messages().is_empty() && !app.session.is_busy() {
        Text::from(Span::styled(
            "Ask me anything about the latest news.",
            Style::default().fg(palette.muted),
        ))
    } else {
        Text::from(chat_lines(app, palette))
    };

    // Row count comes from the same word wrapper that draws the text
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    let total = chat.line_count(inner.width).min(u16::MAX as usize) as u16;
    app.set_chat_metrics(total, inner.height);

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    let max_scroll = app.max_scroll();
    if max_scroll > 0 {
        let mut state = ScrollbarState::new(max_scroll as usize).position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(palette.muted)),
            area.inner(Margin { vertical: 1, horizontal: 0 }),
            &mut state,
        );
    }
}

fn render_input(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let border = if app.session.is_busy() { palette.border } else { palette.accent };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(palette.surface))
        .title(" Ask ")
        .title(
            Line::from(Span::styled(
                format!(" {} ", app.endpoint),
                Style::default().fg(palette.muted),
            ))
            .right_aligned(),
        );

    let inner_width = area.width.saturating_sub(2) as usize;
    let draft = app.session.draft();
    let (visible_text, cursor_x) = input_window(draft, app.cursor, inner_width);

    let input = if draft.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(palette.muted)))
    } else {
        Paragraph::new(markdown::sanitize(&visible_text)).style(Style::default().fg(palette.text))
    };
    frame.render_widget(input.block(input_block), area);

    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

/// Slice of the draft that fits `width` columns with the cursor in view,
/// and the cursor column inside that slice. Measured in display cells.
fn input_window(draft: &str, cursor: usize, width: usize) -> (String, u16) {
    let widths: Vec<usize> = draft.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Scroll right until the cursor cell fits
    let mut start = 0;
    let mut cursor_col: usize = widths[..cursor].iter().sum();
    while width > 0 && cursor_col >= width && start < cursor {
        cursor_col -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = draft
        .chars()
        .zip(&widths)
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, cursor_col.min(u16::MAX as usize) as u16)
}

const HINTS: [(&str, &str); 4] = [
    (" Enter ", " send "),
    (" ^T ", " theme "),
    (" ↑↓ PgUp PgDn End ", " scroll "),
    (" Esc ", " quit "),
];

fn render_footer(palette: &Palette, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(palette.border).fg(palette.text);
    let label_style = Style::default().fg(palette.muted);

    let credit = Line::from(vec![
        Span::styled("Powered by ", label_style),
        Span::styled(TITLE, Style::default().fg(palette.accent).bold()),
        Span::raw(" "),
    ]);
    let credit_width = credit.width() as u16;

    // Whole hints only; the credit keeps its place on narrow terminals
    let room = area.width.saturating_sub(credit_width) as usize;
    let mut used = 0;
    let mut spans = Vec::new();
    for (key, label) in HINTS {
        used += key.width() + label.width();
        if used > room {
            break;
        }
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(label, label_style));
    }

    let [hints_area, credit_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(credit_width),
    ])
    .areas(area);

    let style = Style::default().bg(palette.surface);
    frame.render_widget(Paragraph::new(Line::from(spans)).style(style), hints_area);
    frame.render_widget(Paragraph::new(credit).style(style), credit_area);
}
