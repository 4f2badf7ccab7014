//! Plain-text editing buffer behind the editor pane.
//!
//! Text is held as lines without their `\n`; the cursor column counts
//! chars, not bytes. Every mutating or moving method returns whether
//! anything changed, so callers only forward real edits to the session.

use unicode_width::UnicodeWidthChar;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Debug)]
pub struct TextEditor {
    lines: Vec<String>,
    cursor: CursorPosition,
    preferred_column: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Word,
    Punctuation,
}

fn char_class(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Whitespace
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

fn byte_index(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextEditor {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            cursor: CursorPosition::default(),
            preferred_column: None,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    /// Cursor column in terminal cells, counting wide characters twice.
    pub fn cursor_display_column(&self) -> usize {
        self.current_line()
            .chars()
            .take(self.cursor.column)
            .map(|ch| ch.width().unwrap_or(0))
            .sum()
    }

    pub fn set_cursor(&mut self, position: CursorPosition) -> bool {
        let line = position.line.min(self.lines.len() - 1);
        let column = position.column.min(char_len(&self.lines[line]));
        self.move_to(CursorPosition::new(line, column))
    }

    fn current_line(&self) -> &str {
        &self.lines[self.cursor.line]
    }

    fn current_line_len(&self) -> usize {
        char_len(self.current_line())
    }

    fn move_to(&mut self, position: CursorPosition) -> bool {
        self.preferred_column = None;
        if self.cursor == position {
            return false;
        }
        self.cursor = position;
        true
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return self.insert_newline();
        }
        if ch == '\r' {
            return false;
        }
        let column = self.cursor.column;
        let line = &mut self.lines[self.cursor.line];
        let idx = byte_index(line, column);
        line.insert(idx, ch);
        self.cursor.column += 1;
        self.preferred_column = None;
        true
    }

    /// Insert pasted text at the cursor. Carriage returns are dropped.
    pub fn insert_str(&mut self, text: &str) -> bool {
        let mut changed = false;
        for ch in text.chars() {
            changed |= self.insert_char(ch);
        }
        changed
    }

    pub fn insert_newline(&mut self) -> bool {
        let column = self.cursor.column;
        let line = &mut self.lines[self.cursor.line];
        let idx = byte_index(line, column);
        let rest = line.split_off(idx);
        self.lines.insert(self.cursor.line + 1, rest);
        self.cursor = CursorPosition::new(self.cursor.line + 1, 0);
        self.preferred_column = None;
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor.column > 0 {
            let column = self.cursor.column - 1;
            let line = &mut self.lines[self.cursor.line];
            let idx = byte_index(line, column);
            line.remove(idx);
            self.cursor.column = column;
        } else if self.cursor.line > 0 {
            let removed = self.lines.remove(self.cursor.line);
            let previous = self.cursor.line - 1;
            let column = char_len(&self.lines[previous]);
            self.lines[previous].push_str(&removed);
            self.cursor = CursorPosition::new(previous, column);
        } else {
            return false;
        }
        self.preferred_column = None;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor.column < self.current_line_len() {
            let column = self.cursor.column;
            let line = &mut self.lines[self.cursor.line];
            let idx = byte_index(line, column);
            line.remove(idx);
        } else if self.cursor.line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor.line + 1);
            self.lines[self.cursor.line].push_str(&next);
        } else {
            return false;
        }
        self.preferred_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor.column > 0 {
            self.move_to(CursorPosition::new(self.cursor.line, self.cursor.column - 1))
        } else if self.cursor.line > 0 {
            let line = self.cursor.line - 1;
            self.move_to(CursorPosition::new(line, char_len(&self.lines[line])))
        } else {
            false
        }
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor.column < self.current_line_len() {
            self.move_to(CursorPosition::new(self.cursor.line, self.cursor.column + 1))
        } else if self.cursor.line + 1 < self.lines.len() {
            self.move_to(CursorPosition::new(self.cursor.line + 1, 0))
        } else {
            false
        }
    }

    pub fn move_up(&mut self) -> bool {
        self.move_vertical(-1)
    }

    pub fn move_down(&mut self) -> bool {
        self.move_vertical(1)
    }

    pub fn page_up(&mut self, lines: usize) -> bool {
        self.move_vertical(-(lines.max(1) as isize))
    }

    pub fn page_down(&mut self, lines: usize) -> bool {
        self.move_vertical(lines.max(1) as isize)
    }

    fn move_vertical(&mut self, delta: isize) -> bool {
        let last = self.lines.len() - 1;
        let target = self.cursor.line.saturating_add_signed(delta).min(last);
        if target == self.cursor.line {
            return false;
        }
        let desired = self.preferred_column.unwrap_or(self.cursor.column);
        let column = desired.min(char_len(&self.lines[target]));
        self.cursor = CursorPosition::new(target, column);
        self.preferred_column = Some(desired);
        true
    }

    pub fn move_line_start(&mut self) -> bool {
        self.move_to(CursorPosition::new(self.cursor.line, 0))
    }

    pub fn move_line_end(&mut self) -> bool {
        self.move_to(CursorPosition::new(self.cursor.line, self.current_line_len()))
    }

    pub fn move_document_start(&mut self) -> bool {
        self.move_to(CursorPosition::default())
    }

    pub fn move_document_end(&mut self) -> bool {
        let line = self.lines.len() - 1;
        self.move_to(CursorPosition::new(line, char_len(&self.lines[line])))
    }

    /// Jump to the start of the previous word, crossing line breaks.
    pub fn move_word_left(&mut self) -> bool {
        if self.cursor.column == 0 {
            return self.move_left();
        }
        let chars: Vec<char> = self.current_line().chars().collect();
        let mut idx = self.cursor.column.min(chars.len());
        while idx > 0 && char_class(chars[idx - 1]) == CharClass::Whitespace {
            idx -= 1;
        }
        if idx > 0 {
            let class = char_class(chars[idx - 1]);
            while idx > 0 && char_class(chars[idx - 1]) == class {
                idx -= 1;
            }
        }
        self.move_to(CursorPosition::new(self.cursor.line, idx))
    }

    /// Jump past the current word and the whitespace after it.
    pub fn move_word_right(&mut self) -> bool {
        let chars: Vec<char> = self.current_line().chars().collect();
        if self.cursor.column >= chars.len() {
            return self.move_right();
        }
        let mut idx = self.cursor.column;
        let class = char_class(chars[idx]);
        if class != CharClass::Whitespace {
            while idx < chars.len() && char_class(chars[idx]) == class {
                idx += 1;
            }
        }
        while idx < chars.len() && char_class(chars[idx]) == CharClass::Whitespace {
            idx += 1;
        }
        self.move_to(CursorPosition::new(self.cursor.line, idx))
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
