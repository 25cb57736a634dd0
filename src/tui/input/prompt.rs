use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_prompt(app: &mut App, key: KeyEvent) {
    let Some(prompt) = app.prompt.as_mut() else {
        app.cancel_prompt();
        return;
    };

    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.cancel_prompt(),
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => app.confirm_prompt(),
        // Enter confirms a title prompt; in the milestone prompt it steps to the next field
        (_, KeyCode::Enter) => {
            if prompt.is_milestone() {
                prompt.focus_next();
            } else {
                app.confirm_prompt();
            }
        }
        (_, KeyCode::Tab) | (_, KeyCode::Down) => prompt.focus_next(),
        (_, KeyCode::BackTab) | (_, KeyCode::Up) => prompt.focus_prev(),
        _ => {
            if let Some(field) = prompt.focused_mut() {
                edit_field(field, key);
            }
        }
    }
}

fn edit_field(field: &mut crate::tui::app::PromptField, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Left) => field.left(),
        (_, KeyCode::Right) => field.right(),
        (_, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => field.home(),
        (_, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => field.end(),
        (_, KeyCode::Backspace) => field.backspace(),
        (_, KeyCode::Delete) => field.delete(),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            field.value.replace_range(..field.cursor, "");
            field.cursor = 0;
        }
        (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            field.insert(c)
        }
        _ => {}
    }
}
