//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use pointkeeper_core::models::{ACTIVITIES, REWARDS};

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, FormFocus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Text fields swallow everything except navigation out of them
    if app.is_editing_text() {
        handle_text_field_input(app, key);
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => app.switch_tab(Tab::Dashboard),
        KeyCode::Char('2') => app.switch_tab(Tab::Earn),
        KeyCode::Char('3') => app.switch_tab(Tab::Redeem),
        KeyCode::Char('4') => app.switch_tab(Tab::History),
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.status_message = None;
            app.load_current_tab();
        }
        _ => match app.current_tab {
            Tab::Dashboard => handle_dashboard_input(app, key),
            Tab::Earn => handle_earn_input(app, key),
            Tab::Redeem => handle_redeem_input(app, key),
            Tab::History => handle_history_input(app, key),
        },
    }

    Ok(false)
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') => app.switch_tab(Tab::Earn),
        KeyCode::Char('d') => app.switch_tab(Tab::Redeem),
        KeyCode::Char('h') => app.switch_tab(Tab::History),
        _ => {}
    }
}

/// Move a list selection by `delta`, clamped to the list bounds
fn move_selection(selection: &mut usize, delta: isize, len: usize) {
    if len == 0 {
        *selection = 0;
        return;
    }
    let max = len - 1;
    *selection = if delta < 0 {
        selection.saturating_sub(delta.unsigned_abs())
    } else {
        (*selection + delta as usize).min(max)
    };
}

fn handle_earn_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up if app.earn_focus == FormFocus::List => {
            move_selection(&mut app.activity_selection, -1, ACTIVITIES.len());
        }
        KeyCode::Down if app.earn_focus == FormFocus::List => {
            move_selection(&mut app.activity_selection, 1, ACTIVITIES.len());
        }
        KeyCode::Enter => match app.earn_focus {
            FormFocus::List => app.select_activity(),
            FormFocus::Submit => app.submit_earn(),
            FormFocus::Points | FormFocus::Description => {}
        },
        KeyCode::Char('c') => {
            // Custom amount: start from an empty form
            app.earn_form.clear();
            app.earn_focus = FormFocus::Points;
        }
        KeyCode::Tab | KeyCode::Down => app.earn_focus = app.earn_focus.next(),
        KeyCode::Esc => app.earn_focus = FormFocus::List,
        _ => {}
    }
}

fn handle_redeem_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up if app.redeem_focus == FormFocus::List => {
            move_selection(&mut app.reward_selection, -1, REWARDS.len());
        }
        KeyCode::Down if app.redeem_focus == FormFocus::List => {
            move_selection(&mut app.reward_selection, 1, REWARDS.len());
        }
        KeyCode::Enter => match app.redeem_focus {
            FormFocus::List => app.select_reward(),
            FormFocus::Submit => {
                if app.redeem_form.can_submit(app.known_balance()) {
                    app.submit_redeem();
                } else {
                    app.form_error = Some("Insufficient points balance".to_string());
                }
            }
            FormFocus::Points | FormFocus::Description => {}
        },
        KeyCode::Char('c') => {
            app.redeem_form.clear();
            app.redeem_focus = FormFocus::Points;
        }
        KeyCode::Tab | KeyCode::Down => app.redeem_focus = app.redeem_focus.next(),
        KeyCode::Esc => app.redeem_focus = FormFocus::List,
        _ => {}
    }
}

/// Keys while the points or description field of a form has focus
fn handle_text_field_input(app: &mut App, key: KeyEvent) {
    let focus = match app.current_tab {
        Tab::Earn => &mut app.earn_focus,
        Tab::Redeem => &mut app.redeem_focus,
        Tab::Dashboard | Tab::History => return,
    };

    match key.code {
        KeyCode::Esc => *focus = FormFocus::List,
        KeyCode::Tab | KeyCode::Enter | KeyCode::Down => *focus = focus.next(),
        KeyCode::BackTab | KeyCode::Up => {
            *focus = match *focus {
                FormFocus::Description => FormFocus::Points,
                _ => FormFocus::List,
            };
        }
        KeyCode::Backspace => app.pop_form_char(),
        KeyCode::Char(c) => app.push_form_char(c),
        _ => {}
    }
}

fn handle_history_input(app: &mut App, key: KeyEvent) {
    let len = app.filtered_history().len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => move_selection(&mut app.history_selection, -1, len),
        KeyCode::Down | KeyCode::Char('j') => move_selection(&mut app.history_selection, 1, len),
        KeyCode::PageUp => {
            move_selection(&mut app.history_selection, -(PAGE_SCROLL_SIZE as isize), len)
        }
        KeyCode::PageDown => {
            move_selection(&mut app.history_selection, PAGE_SCROLL_SIZE as isize, len)
        }
        KeyCode::Home => app.history_selection = 0,
        KeyCode::End => app.history_selection = len.saturating_sub(1),
        KeyCode::Char('f') | KeyCode::Tab => app.cycle_history_filter(),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            // Move to next field
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            // Move to previous field
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set and the overlay stays up
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.len(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
