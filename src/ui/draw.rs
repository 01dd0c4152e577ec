use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{
    app::{App, PanelSide, RunState},
    output_log, panel,
    theme::Theme,
};
use crate::keybindings::LEGEND;
use crate::services::transfer::Operation;
use crate::utils::format::{format_size, truncate_to_display_width};
use unicode_width::UnicodeWidthStr;

/// Panels take two thirds of the screen, but never less than this.
const MIN_PANEL_HEIGHT: u16 = 10;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let theme = app.theme;
    let area = frame.area();

    // Check if terminal is too large for ratatui buffer
    if (area.width as u32 * area.height as u32) > 65534 {
        let msg = Paragraph::new("Terminal too large. Please resize smaller.")
            .style(theme.normal_style().add_modifier(Modifier::BOLD));
        frame.render_widget(msg, Rect::new(0, 0, area.width.min(80), 1));
        return;
    }

    let panel_height = MIN_PANEL_HEIGHT
        .max(area.height.saturating_mul(2) / 3)
        .min(area.height.saturating_sub(2));

    // Layout: Panels, Output, Legend, Status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(panel_height),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let panel_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(chunks[0]);

    app.panel_rows = panel::visible_rows(panel_chunks[0]).max(1);

    let source_size = app.source.current_item_size(&app.sizes);
    let destination_size = app.destination.current_item_size(&app.sizes);
    let active = app.active_panel;
    panel::draw(
        frame,
        &mut app.source,
        "Source",
        source_size,
        panel_chunks[0],
        active == PanelSide::Source,
        &theme,
    );
    panel::draw(
        frame,
        &mut app.destination,
        "Destination",
        destination_size,
        panel_chunks[1],
        active == PanelSide::Destination,
        &theme,
    );

    if chunks[1].height > 0 {
        output_log::draw(frame, &app.output, chunks[1], &theme);
    }
    draw_legend(frame, app, chunks[2], &theme);
    draw_status_bar(frame, app, chunks[3], &theme);
}

/// `Controls: ↑↓;Navigate | ←→;Switch | ...`, cut at the screen edge.
fn draw_legend(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let kb = &app.keybindings;
    let mut budget = area.width.saturating_sub(1) as usize;
    let mut spans = Vec::new();

    let mut push = |spans: &mut Vec<Span<'static>>, text: &str, style: Style| {
        if budget == 0 {
            return;
        }
        let chunk = truncate_to_display_width(text, budget);
        budget = budget.saturating_sub(chunk.width());
        spans.push(Span::styled(chunk, style));
    };

    push(&mut spans, "Controls: ", theme.legend_key_style());
    for (i, (actions, label)) in LEGEND.iter().enumerate() {
        let key: String = actions.iter().map(|a| kb.first_key(*a)).collect();
        push(&mut spans, &key, theme.legend_key_style());
        push(&mut spans, ";", theme.legend_separator_style());
        push(&mut spans, *label, theme.legend_label_style());
        if i + 1 < LEGEND.len() {
            push(&mut spans, " | ", theme.legend_separator_style());
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let summary = app.selection_summary();
    let size_text = if summary.pending {
        "calculating...".to_string()
    } else {
        format_size(summary.total_bytes)
    };
    let width = area.width as usize;

    if let RunState::Running(run) = &app.run_state {
        let style = match run.operation {
            Operation::Copy => theme.copy_style(),
            Operation::Move => theme.move_style(),
        };
        let banner = format!("{} {} items, {}", run.operation.gerund(), run.item_count, size_text);
        frame.render_widget(
            Paragraph::new(Span::styled(truncate_to_display_width(&banner, width), style)),
            area,
        );
        return;
    }

    let config = app.run_config;
    let op_style = match config.operation {
        Operation::Copy => theme.copy_style(),
        Operation::Move => theme.move_style(),
    };
    let parts = [
        (
            format!("Selected: {} | Total size: {} | ", summary.count, size_text),
            theme.normal_style(),
        ),
        (format!("Op: {} ", config.operation.verb().to_uppercase()), op_style),
        (
            format!("| Out: {} ", config.output_type.label().to_uppercase()),
            theme.output_style(),
        ),
        (
            format!("| Mode: {}", config.run_mode.label().to_uppercase()),
            theme.mode_style(),
        ),
    ];

    let mut remaining = width;
    let mut spans = Vec::new();
    for (text, style) in parts {
        if remaining == 0 {
            break;
        }
        let chunk = truncate_to_display_width(&text, remaining);
        remaining = remaining.saturating_sub(chunk.width());
        spans.push(Span::styled(chunk, style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
