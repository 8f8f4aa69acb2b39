pub mod dashboard;
pub mod earn;
pub mod history;
pub mod redeem;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FormFocus, LoadState};
use crate::ui::styles;

/// Placeholder line for data that is not loaded yet, or failed to load.
/// Returns `None` once the data is available.
pub(crate) fn load_state_line<T>(state: &LoadState<T>, what: &str) -> Option<Line<'static>> {
    match state {
        LoadState::Loaded(_) => None,
        LoadState::Idle | LoadState::Loading => Some(Line::from(Span::styled(
            format!("Loading {}...", what),
            styles::muted_style(),
        ))),
        LoadState::Failed(message) => Some(Line::from(vec![
            Span::styled(message.clone(), styles::error_style()),
            Span::styled("  [r] retry", styles::muted_style()),
        ])),
    }
}

/// Fields of an earn or redeem form
pub(crate) struct FormView<'a> {
    pub title: &'a str,
    pub points: &'a str,
    pub description: &'a str,
    pub focus: FormFocus,
    pub submit_label: &'a str,
    /// Submission allowed with the current values
    pub enabled: bool,
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!(" {:<13}[", label), styles::muted_style()),
        Span::styled(format!("{:<24}{}", value, cursor), styles::field_style(focused)),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Shared form panel: points, description, submit button and feedback
pub(crate) fn render_form(frame: &mut Frame, app: &App, area: Rect, form: FormView) {
    let mut lines = vec![
        Line::from(""),
        field_line("Points:", form.points, form.focus == FormFocus::Points),
        field_line("Description:", form.description, form.focus == FormFocus::Description),
        Line::from(""),
    ];

    let submit_focused = form.focus == FormFocus::Submit;
    let label = if app.submitting {
        "Submitting...".to_string()
    } else if submit_focused {
        format!("▶ {} ◀", form.submit_label)
    } else {
        form.submit_label.to_string()
    };
    let button_style = if !form.enabled {
        styles::muted_style()
    } else {
        styles::field_style(submit_focused)
    };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(format!(" {} ", label), button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.form_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }
    if let Some(ref success) = app.form_success {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", success), styles::success_style())));
        lines.push(Line::from(Span::styled(
            " Returning to dashboard...",
            styles::muted_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Tab] next field  [c] custom  [Esc] back to list",
        styles::muted_style(),
    )));

    let focused = form.focus != FormFocus::List;
    let block = Block::default()
        .title(format!(" {} ", form.title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
