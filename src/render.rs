use ratatui::text::{Line, Span};

use crate::editor::TextEditor;
use crate::paragraphs::split_paragraphs;
use crate::text_map::{ParagraphChange, paragraph_changes};
use crate::theme::Theme;

pub const EMPTY_PREVIEW: &str = "Nothing to preview";

/// Scroll offsets of the editor pane, in lines and terminal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorViewport {
    pub scroll_top: usize,
    pub scroll_left: usize,
}

impl EditorViewport {
    /// Scroll the minimum amount that keeps the cursor visible.
    pub fn follow_cursor(&mut self, line: usize, column: usize, height: usize, width: usize) {
        let height = height.max(1);
        let width = width.max(1);
        if line < self.scroll_top {
            self.scroll_top = line;
        } else if line >= self.scroll_top + height {
            self.scroll_top = line + 1 - height;
        }
        if column < self.scroll_left {
            self.scroll_left = column;
        } else if column >= self.scroll_left + width {
            self.scroll_left = column + 1 - width;
        }
    }

    /// Screen offset of the cursor inside the pane, if it is visible.
    pub fn cursor_offset(&self, line: usize, column: usize) -> Option<(u16, u16)> {
        let row = line.checked_sub(self.scroll_top)?;
        let col = column.checked_sub(self.scroll_left)?;
        Some((u16::try_from(col).ok()?, u16::try_from(row).ok()?))
    }
}

pub struct EditorRender {
    pub lines: Vec<Line<'static>>,
    /// Horizontal scroll to hand to the paragraph widget.
    pub scroll_left: u16,
}

/// Visible slice of the editor buffer. Lines are not wrapped; the caller
/// scrolls horizontally instead so the cursor maps to one cell.
pub fn render_editor(editor: &TextEditor, viewport: &EditorViewport, height: usize) -> EditorRender {
    let lines = editor
        .lines()
        .iter()
        .skip(viewport.scroll_top)
        .take(height.max(1))
        .map(|line| Line::from(line.clone()))
        .collect();
    EditorRender {
        lines,
        scroll_left: u16::try_from(viewport.scroll_left).unwrap_or(u16::MAX),
    }
}

/// Preview of the edited text with changed paragraphs highlighted and
/// edits that will not be sent (superseded or trailing) struck through.
pub fn render_preview(original: &str, edited: &str, theme: &Theme) -> Vec<Line<'static>> {
    if edited.is_empty() {
        return vec![Line::from(Span::styled(
            EMPTY_PREVIEW,
            theme.placeholder_style(),
        ))];
    }

    let changes = paragraph_changes(original, edited);
    let mut lines = Vec::new();
    for (idx, (paragraph, change)) in split_paragraphs(edited)
        .into_iter()
        .zip(changes)
        .enumerate()
    {
        if idx > 0 {
            lines.push(Line::default());
        }
        let style = match change {
            ParagraphChange::Unchanged => None,
            ParagraphChange::Modified => Some(theme.modified_style()),
            ParagraphChange::Superseded | ParagraphChange::Dropped => {
                Some(theme.dropped_style())
            }
        };
        for text in paragraph.split('\n') {
            let text = text.trim_end_matches('\r').to_string();
            lines.push(match style {
                Some(style) => Line::from(Span::styled(text, style)),
                None => Line::from(text),
            });
        }
    }
    lines
}
