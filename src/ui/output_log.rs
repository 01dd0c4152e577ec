use std::ops::Range;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use super::theme::Theme;
use crate::utils::format::truncate_to_display_width;

/// Append-only output buffer with a manual scroll position.
///
/// `scroll_offset` counts lines hidden below the visible window, so 0 means
/// the newest line is on screen. The buffer is never trimmed.
#[derive(Debug, Default)]
pub struct OutputLog {
    lines: Vec<String>,
    scroll_offset: usize,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: &str) {
        self.lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }

    /// Positive `delta` scrolls toward older lines.
    pub fn scroll(&mut self, delta: isize) {
        let max = self.lines.len() as isize;
        self.scroll_offset = (self.scroll_offset as isize + delta).clamp(0, max) as usize;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Indices of the lines shown in a window of `height` rows.
    pub fn visible_range(&self, height: usize) -> Range<usize> {
        let end = self.lines.len().saturating_sub(self.scroll_offset);
        let start = end.saturating_sub(height);
        start..end
    }
}

pub fn draw(frame: &mut Frame, log: &OutputLog, area: Rect, theme: &Theme) {
    let title = if log.scroll_offset() > 0 {
        format!(" Output (-{}) ", log.scroll_offset())
    } else {
        " Output ".to_string()
    };
    let block = Block::default()
        .title(title)
        .title_style(theme.header_style())
        .borders(Borders::ALL)
        .border_style(theme.border_style(false));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let width = inner.width as usize;
    let range = log.visible_range(inner.height as usize);
    let lines: Vec<Line> = log.lines()[range]
        .iter()
        .map(|l| Line::from(Span::styled(truncate_to_display_width(l, width), theme.normal_style())))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if log.len() > inner.height as usize {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        let position = log.len().saturating_sub(log.scroll_offset()).saturating_sub(1);
        let mut state = ScrollbarState::new(log.len()).position(position);
        frame.render_stateful_widget(scrollbar, area, &mut state);
    }
}
