use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use pointkeeper_core::forms::MAX_EARN_POINTS;
use pointkeeper_core::models::ACTIVITIES;

use super::{render_form, FormView};
use crate::app::{App, FormFocus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_activities(frame, app, chunks[0]);

    let title = format!("Earn Points (1-{})", MAX_EARN_POINTS);
    render_form(
        frame,
        app,
        chunks[1],
        FormView {
            title: &title,
            points: &app.earn_form.points_input,
            description: &app.earn_form.description,
            focus: app.earn_focus,
            submit_label: "Earn Points",
            enabled: !app.submitting,
        },
    );
}

fn render_activities(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.earn_focus == FormFocus::List;

    let header = Row::new([Cell::from("Activity"), Cell::from("Points")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = ACTIVITIES
        .iter()
        .map(|activity| {
            Row::new(vec![
                Cell::from(activity.name),
                Cell::from(Span::styled(
                    format!("{:>6}", format!("+{}", activity.points)),
                    styles::success_style(),
                )),
            ])
        })
        .collect();

    let widths = [Constraint::Fill(1), Constraint::Length(8)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(" Quick Earn - [Enter] select ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.activity_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
