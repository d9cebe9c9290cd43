use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(
    app: &mut App,
    event: AppEvent,
    tx: &mpsc::UnboundedSender<AppEvent>,
) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => {
            app.on_reply(outcome);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &mpsc::UnboundedSender<AppEvent>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Global keys
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('t') if ctrl => app.toggle_theme(),

        KeyCode::Enter => app.submit(tx),

        // Conversation scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),

        // Draft editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let draft = app.session.draft_mut();
                let byte_pos = char_to_byte_index(draft, app.cursor);
                draft.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let cursor = app.cursor;
            let draft = app.session.draft_mut();
            if cursor < draft.chars().count() {
                let byte_pos = char_to_byte_index(draft, cursor);
                draft.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.draft().chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        // End with the cursor already at the end of the draft follows the conversation
        KeyCode::End => {
            let char_count = app.session.draft().chars().count();
            if ctrl || app.cursor >= char_count {
                app.jump_to_bottom();
            }
            app.cursor = char_count;
        }
        KeyCode::Char(c) if !ctrl => {
            let cursor = app.cursor;
            let draft = app.session.draft_mut();
            let byte_pos = char_to_byte_index(draft, cursor);
            draft.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
