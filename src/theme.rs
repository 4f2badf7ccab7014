use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the editor shell
#[derive(Clone, Debug)]
pub struct Theme {
    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the toolbar
    pub filename_color: Color,

    /// Color for the "loaded" confirmation in the toolbar
    pub success_color: Color,

    /// Color for key hints in the toolbar and upload panel
    pub hint_color: Color,

    /// Color for the busy indicator ("Generating...", "Processing...")
    pub busy_color: Color,

    /// Border color of the editor and preview panes
    pub pane_border: Color,

    /// Border color of the pane that receives keystrokes
    pub pane_border_focused: Color,

    /// Foreground color for paragraphs that will be sent as replacements
    pub modified_fg: Color,

    /// Foreground color for paragraphs past the original paragraph count
    pub dropped_fg: Color,

    /// Foreground color for placeholder text ("Nothing to preview")
    pub placeholder_fg: Color,

    /// Foreground color for inline validation errors
    pub error_fg: Color,

    /// Foreground color for alert popups
    pub alert_fg: Color,

    /// Background color for alert popups
    pub alert_bg: Color,

    /// Border color for alert popups
    pub alert_border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            success_color: Color::Green,
            hint_color: Color::DarkGray,
            busy_color: Color::LightCyan,
            pane_border: Color::DarkGray,
            pane_border_focused: Color::Gray,
            modified_fg: Color::LightYellow,
            dropped_fg: Color::LightRed,
            placeholder_fg: Color::DarkGray,
            error_fg: Color::LightRed,
            alert_fg: Color::White,
            alert_bg: Color::Black,
            alert_border: Color::Red,
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    /// Get the style for the filename in the toolbar
    pub fn filename_style(&self) -> Style {
        Style::default()
            .fg(self.filename_color)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success_color)
    }

    pub fn hint_style(&self) -> Style {
        Style::default().fg(self.hint_color)
    }

    pub fn busy_style(&self) -> Style {
        Style::default()
            .fg(self.busy_color)
            .add_modifier(Modifier::BOLD)
    }

    /// Get the border style of a pane
    pub fn pane_border_style(&self, focused: bool) -> Style {
        let color = if focused {
            self.pane_border_focused
        } else {
            self.pane_border
        };
        Style::default().fg(color)
    }

    pub fn modified_style(&self) -> Style {
        Style::default().fg(self.modified_fg)
    }

    pub fn dropped_style(&self) -> Style {
        Style::default()
            .fg(self.dropped_fg)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder_fg)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error_fg)
    }

    /// Get the style for the alert popup body
    pub fn alert_style(&self) -> Style {
        Style::default().fg(self.alert_fg).bg(self.alert_bg)
    }

    /// Get the style for the alert popup border
    pub fn alert_border_style(&self) -> Style {
        Style::default().fg(self.alert_border).bg(self.alert_bg)
    }
}
