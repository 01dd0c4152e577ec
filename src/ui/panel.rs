use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use super::{
    file_panel::{EntryKind, FilePanel},
    theme::Theme,
};
use crate::utils::format::{format_size, truncate_path_left, truncate_to_display_width};

/// Rows below the listing: one blank spacer and the size footer.
const FOOTER_ROWS: u16 = 2;

/// Listing rows available inside a panel drawn into `area`.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(2 + FOOTER_ROWS) as usize
}

fn size_footer(size: Option<u64>) -> String {
    match size {
        Some(bytes) => format!("Size: {}", format_size(bytes)),
        None => "Size: calculating...".to_string(),
    }
}

/// Draw one pane: `label: path` title, marked/typed entries, and the size of
/// the cursor item on the bottom row.
pub fn draw(
    frame: &mut Frame,
    panel: &mut FilePanel,
    label: &str,
    item_size: Option<u64>,
    area: Rect,
    is_active: bool,
    theme: &Theme,
) {
    let inner_width = area.width.saturating_sub(4) as usize;
    let path_str = panel.path.display().to_string();
    let path_budget = inner_width.saturating_sub(label.len() + 2);
    let title = format!(" {}: {} ", label, truncate_path_left(&path_str, path_budget));

    let block = Block::default()
        .title(title)
        .title_style(if is_active {
            theme.header_style()
        } else {
            theme.normal_style()
        })
        .borders(Borders::ALL)
        .border_style(theme.border_style(is_active));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = visible_rows(area);
    panel.ensure_cursor_visible(rows);

    let width = inner.width as usize;
    let start = panel.scroll_offset;
    for (i, entry) in panel.entries.iter().skip(start).take(rows).enumerate() {
        let index = start + i;
        let marker = if panel.is_selected(entry) { "*" } else { " " };
        let suffix = match entry.kind {
            EntryKind::Parent | EntryKind::Directory => "/",
            EntryKind::Executable => "*",
            EntryKind::File => "",
        };
        let text = format!("{} {}{}", marker, entry.name, suffix);

        let style = if index == panel.cursor && is_active {
            theme.cursor_style()
        } else if marker == "*" {
            theme.marked_style()
        } else if entry.kind.is_directory_like() {
            theme.directory_style()
        } else if entry.kind == EntryKind::Executable {
            theme.executable_style()
        } else {
            theme.file_style()
        };

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(truncate_to_display_width(&text, width), style))),
            Rect::new(inner.x, inner.y + i as u16, inner.width, 1),
        );
    }

    if inner.height > FOOTER_ROWS {
        let footer = truncate_to_display_width(&size_footer(item_size), width.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(Span::styled(footer, theme.size_style())),
            Rect::new(inner.x + 1, inner.y + inner.height - 1, inner.width.saturating_sub(1), 1),
        );
    }

    if panel.entries.len() > rows && rows > 0 {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut state = ScrollbarState::new(panel.entries.len()).position(panel.cursor);
        let scrollbar_area = Rect::new(area.x, inner.y, area.width, rows as u16);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut state);
    }
}
