use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tui_input::backend::crossterm::to_input_request;

use crate::app::{App, Mode};
use crate::tui::Page;
use crate::upload::ArtifactKind;

/// Handle key event and update app state
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl-C quits from any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode() {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Prompt => handle_prompt_mode(app, key),
    }
}

/// Handle key event in Normal mode
fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.pages_mut().next_page(),
        KeyCode::BackTab => app.pages_mut().prev_page(),
        KeyCode::Char('q') => app.quit(),
        _ => match app.pages().current() {
            Page::Home => {}
            Page::Setup => handle_setup_page(app, key),
            Page::Run => handle_run_page(app, key),
        },
    }
}

fn handle_setup_page(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.run_setup(),
        KeyCode::Char('m') => app.cycle_model(true),
        KeyCode::Char('M') => app.cycle_model(false),
        KeyCode::Char('t') => app.open_prompt(ArtifactKind::HfToken),
        KeyCode::Char('k') => app.open_prompt(ArtifactKind::Tokenizer),
        KeyCode::Char('c') => app.open_prompt(ArtifactKind::ModelConfig),
        _ => {}
    }
}

fn handle_run_page(app: &mut App, key: KeyEvent) {
    match key.code {
        // Picker focus and selection
        KeyCode::Left => app.focus_prev(),
        KeyCode::Right => app.focus_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Char('R') => app.refresh_configs(),

        // Run control
        KeyCode::Enter => app.start_run(),
        KeyCode::Char('s') => app.stop_run(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.log_view_mut().scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.log_view_mut().scroll_half_page_up();
        }

        // Log scroll
        KeyCode::Char('h') => app.log_view_mut().scroll_left(),
        KeyCode::Char('l') => app.log_view_mut().scroll_right(),
        KeyCode::Char('0') => app.log_view_mut().scroll_to_left(),
        KeyCode::Char('j') => app.log_view_mut().scroll_down(),
        KeyCode::Char('k') => app.log_view_mut().scroll_up(),
        KeyCode::Char('g') => app.log_view_mut().scroll_to_top(),
        KeyCode::Char('G') => app.log_view_mut().scroll_to_bottom(),
        KeyCode::Char('f') => app.log_view_mut().toggle_follow(),

        _ => {}
    }
}

/// Handle key event while typing an upload path
fn handle_prompt_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt(),

        // Delegate to tui-input for text editing (Emacs-like keybindings)
        _ => {
            if let Some(req) = to_input_request(&Event::Key(key)) {
                app.prompt_input(req);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Level;
    use crate::catalog::Picker;
    use crate::command::ProcessRunner;
    use crate::config::Settings;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_app() -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        for relative in ["llama/8b/config-b.yml", "llama/70b/config-c.yml", "mistral/config-m.yml"] {
            let path = dir.path().join("configs").join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let mut settings = Settings::default();
        settings.config_root = dir.path().join("configs");
        settings.bench.log_file = dir.path().join("fmbench.log");
        let app = App::new(settings, Arc::new(ProcessRunner::new()));
        (dir, app)
    }

    fn on_run_page() -> (TempDir, App) {
        let (dir, mut app) = create_app();
        app.pages_mut().select(Page::Run);
        let log: String = (0..20).map(|i| format!("line{}\n", i)).collect();
        app.log_view_mut().set_visible_lines(10);
        app.log_view_mut().replace_content(&log);
        app.log_view_mut().set_follow(false);
        app.log_view_mut().scroll_to_top();
        (dir, app)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_with_ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn input_ctrl_c_quits_from_any_mode() {
        let (_dir, mut app) = create_app();
        app.set_mode(Mode::Prompt);

        handle_key(&mut app, key_with_ctrl('c'));
        assert!(app.should_quit());
    }

    #[test]
    fn input_q_quits_in_normal_mode() {
        let (_dir, mut app) = create_app();

        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn input_tab_cycles_pages() {
        let (_dir, mut app) = create_app();

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.pages().current(), Page::Setup);
        handle_key(&mut app, key(KeyCode::BackTab));
        handle_key(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.pages().current(), Page::Run);
    }

    #[test]
    fn input_run_page_arrows_drive_pickers() {
        let (_dir, mut app) = on_run_page();
        assert_eq!(app.focus(), Picker::Folder);

        handle_key(&mut app, key(KeyCode::Right));
        assert_eq!(app.focus(), Picker::Parameter);
        handle_key(&mut app, key(KeyCode::Down));
        assert_eq!(app.selection().selected_subfolder(), Some("8b"));

        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Up));
        assert_eq!(app.selection().selected_folder(), Some("mistral"));
        assert_eq!(app.selection().selected_subfolder(), None);
    }

    #[test]
    fn input_run_page_scroll_keys() {
        let (_dir, mut app) = on_run_page();

        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.log_view().scroll_offset(), 1);
        handle_key(&mut app, key_with_ctrl('d'));
        assert_eq!(app.log_view().scroll_offset(), 6);
        handle_key(&mut app, key_with_ctrl('u'));
        assert_eq!(app.log_view().scroll_offset(), 1);
        handle_key(&mut app, key(KeyCode::Char('G')));
        assert_eq!(app.log_view().scroll_offset(), 10);
        handle_key(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.log_view().scroll_offset(), 9);
        handle_key(&mut app, key(KeyCode::Char('g')));
        assert_eq!(app.log_view().scroll_offset(), 0);

        handle_key(&mut app, key(KeyCode::Char('l')));
        handle_key(&mut app, key(KeyCode::Char('l')));
        handle_key(&mut app, key(KeyCode::Char('h')));
        assert_eq!(app.log_view().horizontal_scroll(), 1);
        handle_key(&mut app, key(KeyCode::Char('0')));
        assert_eq!(app.log_view().horizontal_scroll(), 0);
    }

    #[test]
    fn input_run_page_f_toggles_follow() {
        let (_dir, mut app) = on_run_page();
        assert!(!app.log_view().follow());

        handle_key(&mut app, key(KeyCode::Char('f')));
        assert!(app.log_view().follow());
        assert_eq!(app.log_view().scroll_offset(), 10);
    }

    #[test]
    fn input_run_page_s_without_run_warns() {
        let (_dir, mut app) = on_run_page();

        handle_key(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.notice().unwrap().level, Level::Warning);
    }

    #[test]
    fn input_run_keys_ignored_on_home_page() {
        let (_dir, mut app) = create_app();

        handle_key(&mut app, key(KeyCode::Down));
        assert_eq!(app.selection().selected_folder(), Some("llama"));
        handle_key(&mut app, key(KeyCode::Char('s')));
        assert!(app.notice().is_none());
    }

    #[test]
    fn input_setup_page_opens_prompt_and_edits_path() {
        let (_dir, mut app) = create_app();
        app.pages_mut().select(Page::Setup);

        handle_key(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.mode(), Mode::Prompt);
        assert_eq!(app.prompt().unwrap().kind, ArtifactKind::Tokenizer);

        for c in "tok.jsonx".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.prompt().unwrap().input.value(), "tok.json");

        // 'q' is text while the prompt is open
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit());

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.prompt().is_none());
    }

    #[test]
    fn input_setup_page_enter_submits_upload() {
        let (dir, mut app) = create_app();
        app.pages_mut().select(Page::Setup);

        handle_key(&mut app, key(KeyCode::Char('c')));
        for c in dir.path().join("missing.json").display().to_string().chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.mode(), Mode::Normal);
        assert_eq!(app.notice().unwrap().level, Level::Error);
    }

    #[test]
    fn input_setup_page_m_cycles_model() {
        let (_dir, mut app) = create_app();
        app.pages_mut().select(Page::Setup);

        handle_key(&mut app, key(KeyCode::Char('m')));
        assert_eq!(app.model(), "Claude");
        handle_key(&mut app, key(KeyCode::Char('M')));
        assert_eq!(app.model(), "LLaMA 3");
    }

    #[test]
    fn input_prompt_ctrl_u_clears_line() {
        let (_dir, mut app) = create_app();
        app.open_prompt(ArtifactKind::HfToken);

        for c in "/tmp/token.txt".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key_with_ctrl('u'));
        assert_eq!(app.prompt().unwrap().input.value(), "");
    }
}
