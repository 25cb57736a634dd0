use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, View};

const PAGE: isize = 10;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Help overlay intercepts ? and Esc
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    // A notice lasts until the next key
    app.status = None;

    // Shifted letters arrive with SHIFT set on some terminals and not others
    let modifiers = key.modifiers.difference(KeyModifiers::SHIFT);
    match (modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Char('q')) => app.should_quit = true,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => app.should_quit = true,
        (KeyModifiers::NONE, KeyCode::Char('?')) => app.show_help = true,

        // View switching
        (KeyModifiers::NONE, KeyCode::Tab) | (KeyModifiers::NONE, KeyCode::BackTab) => {
            app.toggle_view()
        }
        (KeyModifiers::NONE, KeyCode::Char('1')) => app.view = View::Outline,
        (KeyModifiers::NONE, KeyCode::Char('2')) => app.view = View::Board,

        // Cursor
        (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => app.move_cursor(1),
        (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => app.move_cursor(-1),
        (KeyModifiers::NONE, KeyCode::PageDown) => app.move_cursor(PAGE),
        (KeyModifiers::NONE, KeyCode::PageUp) => app.move_cursor(-PAGE),
        (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => app.jump_to_top(),
        (KeyModifiers::NONE, KeyCode::Char('G') | KeyCode::End) => app.jump_to_bottom(),

        // Expand / collapse
        (KeyModifiers::NONE, KeyCode::Char('h') | KeyCode::Left) => app.collapse_or_parent(),
        (KeyModifiers::NONE, KeyCode::Char('l') | KeyCode::Right) => app.expand(),
        (KeyModifiers::NONE, KeyCode::Char('E')) => app.expand_all(),
        (KeyModifiers::NONE, KeyCode::Char('C')) => app.collapse_all(),

        // Editing
        (KeyModifiers::NONE, KeyCode::Char('a')) => app.begin_add_sibling(),
        (KeyModifiers::NONE, KeyCode::Char('A')) => app.begin_add_child(),
        (KeyModifiers::NONE, KeyCode::Char('r') | KeyCode::Enter) => app.begin_edit(),
        (KeyModifiers::NONE, KeyCode::Char('x')) => app.begin_delete(),

        // Structure
        (KeyModifiers::NONE, KeyCode::Char('>')) => app.indent(),
        (KeyModifiers::NONE, KeyCode::Char('<')) => app.outdent(),
        (KeyModifiers::NONE, KeyCode::Char('K')) => app.move_up(),
        (KeyModifiers::NONE, KeyCode::Char('J')) => app.move_down(),

        _ => {}
    }
}
