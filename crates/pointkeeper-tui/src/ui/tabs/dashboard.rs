use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use pointkeeper_core::models::{points_to_next_reward, Tier, NEXT_REWARD_THRESHOLD};
use pointkeeper_core::utils::format_points;

use super::load_state_line;
use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Welcome
            Constraint::Length(8), // Balance and tier
            Constraint::Min(5),    // Quick actions
        ])
        .split(area);

    render_welcome(frame, app, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_balance(frame, app, middle[0]);
    render_tier(frame, app, middle[1]);
    render_quick_actions(frame, chunks[2]);
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.user_display_name();
    let greeting = if name.is_empty() {
        "Welcome back!".to_string()
    } else {
        format!("Welcome back, {}!", name)
    };

    let lines = vec![
        Line::from(Span::styled(format!(" {}", greeting), styles::title_style())),
        Line::from(Span::styled(
            " Here's an overview of your loyalty points",
            styles::muted_style(),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_balance(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("")];

    if let Some(placeholder) = load_state_line(&app.balance, "balance") {
        lines.push(placeholder);
    } else {
        let balance = app.known_balance();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format_points(balance), styles::balance_style()),
            Span::styled(" points", styles::muted_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(match points_to_next_reward(balance) {
            Some(remaining) => Line::from(Span::styled(
                format!("  {} points to next reward", format_points(remaining)),
                styles::muted_style(),
            )),
            None => Line::from(Span::styled(
                "  Reward unlocked!",
                styles::success_style(),
            )),
        });
        lines.push(Line::from(Span::styled(
            format!("  Next reward at {}", format_points(NEXT_REWARD_THRESHOLD)),
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Points Balance ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tier(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("")];

    if app.balance.loaded().is_some() {
        let tier = Tier::for_balance(app.known_balance());
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(tier.name(), styles::tier_style(tier)),
            Span::styled(" member", styles::muted_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Silver at 500, Gold at 1,000",
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Membership Tier ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quick_actions(frame: &mut Frame, area: Rect) {
    let action = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  [{}] ", key), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let lines = vec![
        Line::from(""),
        action("e", "Earn points"),
        action("d", "Redeem rewards"),
        action("h", "View history"),
    ];

    let block = Block::default()
        .title(" Quick Actions ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
