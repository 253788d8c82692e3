use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx).await?,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Analysis(completion) => app.on_analysis(completion),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key, tx),
        InputMode::Editing => handle_editing_mode(app, key).await,
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Edit the file path
        KeyCode::Char('o') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
            app.path_cursor = app.path_input.chars().count();
        }

        // Session actions
        KeyCode::Char('a') | KeyCode::Enter => app.analyze(tx.clone()),
        KeyCode::Char('r') => app.retry(),
        KeyCode::Char('x') => app.reset(),
        KeyCode::Char('e') => app.export(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Report scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => {}
    }
}

async fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.select_path().await;
        }
        KeyCode::Backspace => {
            if app.path_cursor > 0 {
                app.path_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
                app.path_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.path_input.chars().count();
            if app.path_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
                app.path_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.path_cursor = app.path_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.path_input.chars().count();
            app.path_cursor = (app.path_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.path_cursor = 0;
        }
        KeyCode::End => {
            app.path_cursor = app.path_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
            app.path_input.insert(byte_pos, c);
            app.path_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesense_core::Config;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "añb";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 9), s.len());
    }

    #[tokio::test]
    async fn test_typing_edits_path_at_cursor() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new());

        handle_event(&mut app, key(KeyCode::Char('o')), &tx).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "mn.py".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)), &tx).await.unwrap();
        }
        handle_event(&mut app, key(KeyCode::Home), &tx).await.unwrap();
        handle_event(&mut app, key(KeyCode::Right), &tx).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('a')), &tx).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('i')), &tx).await.unwrap();
        assert_eq!(app.path_input, "main.py");

        handle_event(&mut app, key(KeyCode::Backspace), &tx).await.unwrap();
        assert_eq!(app.path_input, "man.py");
        assert_eq!(app.path_cursor, 2);

        handle_event(&mut app, key(KeyCode::Esc), &tx).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new());
        app.input_mode = InputMode::Editing;

        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c, &tx).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_q_in_editing_mode_is_text() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new());
        app.input_mode = InputMode::Editing;

        handle_event(&mut app, key(KeyCode::Char('q')), &tx).await.unwrap();
        assert!(!app.should_quit);
        assert_eq!(app.path_input, "q");
    }
}
