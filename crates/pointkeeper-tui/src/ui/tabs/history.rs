use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use pointkeeper_core::history::HistoryFilter;
use pointkeeper_core::models::TransactionType;
use pointkeeper_core::utils::{format_points, truncate_string};

use super::load_state_line;
use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Summary
            Constraint::Length(1), // Filter
            Constraint::Min(5),    // Transactions
        ])
        .split(area);

    render_summary(frame, app, chunks[0]);
    render_filter(frame, app, chunks[1]);
    render_transactions(frame, app, chunks[2]);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.history_summary();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let cards = [
        ("Total Earned", format!("+{}", format_points(summary.total_earned)), styles::success_style()),
        ("Total Redeemed", format!("-{}", format_points(summary.total_redeemed)), styles::error_style()),
        ("Transactions", summary.total_count.to_string(), styles::balance_style()),
    ];

    for ((title, value, style), column) in cards.into_iter().zip(columns.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", value), style)))
            .block(block);
        frame.render_widget(paragraph, *column);
    }
}

fn render_filter(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.history_summary();

    let mut spans = vec![Span::styled(" Filter: ", styles::muted_style())];
    for (i, filter) in HistoryFilter::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = styles::tab_style(*filter == app.history_filter);
        spans.push(Span::styled(filter.label(&summary), style));
    }
    spans.push(Span::styled("   [f] change", styles::muted_style()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_transactions(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Transactions - {} ", app.history_filter.name()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if let Some(placeholder) = load_state_line(&app.history, "history") {
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    let transactions = app.filtered_history();

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Description"),
        Cell::from("Type"),
        Cell::from("Points"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = if transactions.is_empty() {
        vec![Row::new(vec![
            Cell::from(Span::styled("No transactions found", styles::muted_style())),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
        ])]
    } else {
        transactions
            .iter()
            .map(|t| {
                let style = styles::transaction_style(t.kind);
                let kind = match t.kind {
                    TransactionType::Earn => "Earned",
                    TransactionType::Redeem => "Redeemed",
                };
                Row::new(vec![
                    Cell::from(t.created_at_display()),
                    Cell::from(truncate_string(&t.description, 40)),
                    Cell::from(Span::styled(kind, style)),
                    Cell::from(Span::styled(
                        format!("{:>8}", format!("{}{}", t.kind.sign(), format_points(t.points))),
                        style,
                    )),
                ])
            })
            .collect()
    };

    let widths = [
        Constraint::Length(24),
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !transactions.is_empty() {
        state.select(Some(app.history_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
