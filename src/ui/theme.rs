use ratatui::style::{Color, Modifier, Style};

// ═══════════════════════════════════════════════════════════════════════════════
// Palette
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub fg_inverse: Color,
    pub bg_inverse: Color,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Panel colors (file lists)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct PanelColors {
    pub border: Color,
    pub border_active: Color,
    pub title: Color,
    pub directory_text: Color,
    pub file_text: Color,
    pub executable_text: Color,
    pub marked_text: Color,
    pub size_text: Color,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Run configuration colors (status bar and legend)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct RunColors {
    pub copy: Color,
    pub r#move: Color,
    pub output: Color,
    pub mode: Color,
}

#[derive(Clone, Copy)]
pub struct LegendColors {
    pub key: Color,
    pub label: Color,
    pub separator: Color,
}

#[derive(Clone, Copy)]
pub struct Theme {
    pub palette: Palette,
    pub panel: PanelColors,
    pub run: RunColors,
    pub legend: LegendColors,
}

impl Default for Theme {
    fn default() -> Self {
        Self::terminal()
    }
}

impl Theme {
    /// Plain ANSI colors on the terminal's own background.
    pub fn terminal() -> Self {
        let palette = Palette {
            fg: Color::White,
            fg_inverse: Color::Black,
            bg_inverse: Color::White,
        };

        let panel = PanelColors {
            border: Color::DarkGray,
            border_active: Color::White,
            title: Color::White,
            directory_text: Color::Blue,
            file_text: Color::White,
            executable_text: Color::White,
            marked_text: Color::Yellow,
            size_text: Color::Gray,
        };

        let run = RunColors {
            copy: Color::Green,
            r#move: Color::Red,
            output: Color::Cyan,
            mode: Color::Yellow,
        };

        let legend = LegendColors {
            key: Color::White,
            label: Color::Cyan,
            separator: Color::White,
        };

        Self { palette, panel, run, legend }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Style helpers
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.palette.fg)
    }

    pub fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.palette.fg_inverse)
            .bg(self.palette.bg_inverse)
            .add_modifier(Modifier::BOLD)
    }

    pub fn directory_style(&self) -> Style {
        Style::default().fg(self.panel.directory_text)
    }

    pub fn file_style(&self) -> Style {
        Style::default().fg(self.panel.file_text)
    }

    pub fn executable_style(&self) -> Style {
        Style::default().fg(self.panel.executable_text)
    }

    pub fn marked_style(&self) -> Style {
        Style::default()
            .fg(self.panel.marked_text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.panel.title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.panel.border_active)
        } else {
            Style::default().fg(self.panel.border)
        }
    }

    pub fn size_style(&self) -> Style {
        Style::default().fg(self.panel.size_text)
    }

    pub fn legend_key_style(&self) -> Style {
        Style::default()
            .fg(self.legend.key)
            .add_modifier(Modifier::BOLD)
    }

    pub fn legend_label_style(&self) -> Style {
        Style::default().fg(self.legend.label)
    }

    pub fn legend_separator_style(&self) -> Style {
        Style::default().fg(self.legend.separator)
    }

    pub fn copy_style(&self) -> Style {
        Style::default().fg(self.run.copy)
    }

    pub fn move_style(&self) -> Style {
        Style::default().fg(self.run.r#move)
    }

    pub fn output_style(&self) -> Style {
        Style::default().fg(self.run.output)
    }

    pub fn mode_style(&self) -> Style {
        Style::default().fg(self.run.mode)
    }
}
