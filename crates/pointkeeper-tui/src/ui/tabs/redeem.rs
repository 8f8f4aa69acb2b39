use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use pointkeeper_core::models::REWARDS;
use pointkeeper_core::utils::{format_points, truncate_string};

use super::{load_state_line, render_form, FormView};
use crate::app::{App, FormFocus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_rewards(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)])
        .split(chunks[1]);

    render_available(frame, app, right[0]);

    let balance = app.known_balance();
    let title = format!("Redeem Points (max {})", format_points(balance));
    render_form(
        frame,
        app,
        right[1],
        FormView {
            title: &title,
            points: &app.redeem_form.points_input,
            description: &app.redeem_form.description,
            focus: app.redeem_focus,
            submit_label: "Redeem Points",
            enabled: !app.submitting && app.redeem_form.can_submit(balance),
        },
    );
}

fn render_available(frame: &mut Frame, app: &App, area: Rect) {
    let line = load_state_line(&app.balance, "balance").unwrap_or_else(|| {
        Line::from(vec![
            Span::styled(" Available: ", styles::muted_style()),
            Span::styled(format_points(app.known_balance()), styles::balance_style()),
            Span::styled(" points", styles::muted_style()),
        ])
    });

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_rewards(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.redeem_focus == FormFocus::List;
    let balance = app.known_balance();

    let header = Row::new([
        Cell::from("Reward"),
        Cell::from("Points"),
        Cell::from(""),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = REWARDS
        .iter()
        .map(|reward| {
            let status = match reward.shortfall(balance) {
                None => Span::styled("Available", styles::success_style()),
                Some(missing) => Span::styled(
                    format!("Need {}", format_points(missing)),
                    styles::muted_style(),
                ),
            };
            let name_style = if reward.is_affordable(balance) {
                styles::list_item_style()
            } else {
                styles::muted_style()
            };
            Row::new(vec![
                Cell::from(Line::from(vec![
                    Span::styled(reward.name, name_style),
                    Span::styled(
                        format!("  {}", truncate_string(reward.description, 30)),
                        styles::muted_style(),
                    ),
                ])),
                Cell::from(format!("{:>6}", format_points(reward.points))),
                Cell::from(status),
            ])
        })
        .collect();

    let widths = [Constraint::Fill(1), Constraint::Length(8), Constraint::Length(12)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(" Rewards - [Enter] select ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.reward_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
