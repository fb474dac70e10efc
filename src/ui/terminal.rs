use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Widget};
use vt100::{Color as VtColor, Parser};

use crate::config::DEFAULT_SCROLLBACK_LINES;

/// The embedded terminal-emulator widget: a vt100 parser plus a dirty-row
/// line cache so redraws of quiet screens stay cheap.
pub struct TerminalState {
    pub parser: Parser,
    pub last_change: Instant,
    cached_lines: Vec<Line<'static>>,
    row_hashes: Vec<u64>,
    cached_height: u16,
    cached_width: u16,
    cache_invalidated: bool,
}

impl TerminalState {
    #[allow(dead_code)]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self::new_with_scrollback(rows, cols, DEFAULT_SCROLLBACK_LINES)
    }

    pub fn new_with_scrollback(rows: u16, cols: u16, scrollback_limit: usize) -> Self {
        Self {
            parser: Parser::new(rows, cols, scrollback_limit.max(1)),
            last_change: Instant::now(),
            cached_lines: Vec::new(),
            row_hashes: Vec::new(),
            cached_height: 0,
            cached_width: 0,
            cache_invalidated: true,
        }
    }

    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.parser.set_size(rows, cols);
        self.touch();
    }

    pub fn process_bytes(&mut self, data: &[u8]) {
        self.parser.process(data);
        self.touch();
    }

    pub fn scroll_by(&mut self, delta_lines: i32) {
        let current = self.parser.screen().scrollback() as i32;
        let target = current.saturating_add(delta_lines).max(0) as usize;
        self.parser.set_scrollback(target);
        self.cache_invalidated = true;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.parser.set_scrollback(0);
        self.cache_invalidated = true;
    }

    fn touch(&mut self) {
        self.last_change = Instant::now();
        self.cache_invalidated = true;
    }

    fn cached_lines(&mut self, height: u16, width: u16) -> &[Line<'static>] {
        if self.cached_height != height || self.cached_width != width {
            self.cached_height = height;
            self.cached_width = width;
            self.cached_lines.resize(height as usize, Line::default());
            self.row_hashes.resize(height as usize, 0);
            self.cache_invalidated = true;
        }
        if self.cache_invalidated {
            let screen = self.parser.screen();
            for row in 0..height {
                let hash = row_hash(screen, row, width);
                let idx = row as usize;
                if self.row_hashes[idx] != hash {
                    self.cached_lines[idx] = build_line(screen, row, width);
                    self.row_hashes[idx] = hash;
                }
            }
            self.cache_invalidated = false;
        }
        &self.cached_lines
    }
}

fn map_color(c: VtColor) -> Color {
    match c {
        VtColor::Default => Color::Reset,
        VtColor::Idx(n) => Color::Indexed(n),
        VtColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

pub fn draw_terminal(
    area: Rect,
    state: &mut TerminalState,
    title: &str,
    title_color: Color,
    frame: &mut ratatui::Frame<'_>,
) {
    let block = Block::default()
        .borders(Borders::TOP)
        .title(title.to_string())
        .fg(title_color);
    frame.render_widget(&block, area);

    let inner = block.inner(area);
    let screen = state.parser.screen();
    let (cur_row, cur_col) = screen.cursor_position();
    let hide_cursor = screen.hide_cursor();
    let lines = state.cached_lines(inner.height, inner.width);

    frame.render_widget(TerminalWidget { lines }, inner);

    if !hide_cursor {
        frame.set_cursor_position((inner.x + cur_col, inner.y + cur_row));
    }
}

struct TerminalWidget<'a> {
    lines: &'a [Line<'static>],
}

impl Widget for TerminalWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = area.height.min(self.lines.len() as u16);
        for row in 0..height {
            buf.set_line(area.x, area.y + row, &self.lines[row as usize], area.width);
        }
    }
}

fn row_hash(screen: &vt100::Screen, row: u16, width: u16) -> u64 {
    let mut hasher = DefaultHasher::new();
    for col in 0..width {
        match screen.cell(row, col) {
            Some(cell) => {
                hash_color(&mut hasher, cell.fgcolor());
                hash_color(&mut hasher, cell.bgcolor());
                hasher.write_u8(cell.bold() as u8);
                hasher.write_u8(cell.italic() as u8);
                hasher.write_u8(cell.underline() as u8);
                hasher.write_u8(cell.inverse() as u8);
                let contents = cell.contents();
                hasher.write_usize(contents.len());
                hasher.write(contents.as_bytes());
            }
            None => hasher.write_u8(0),
        }
    }
    hasher.finish()
}

fn hash_color(hasher: &mut DefaultHasher, color: VtColor) {
    match color {
        VtColor::Default => hasher.write_u8(0),
        VtColor::Idx(n) => {
            hasher.write_u8(1);
            hasher.write_u8(n);
        }
        VtColor::Rgb(r, g, b) => {
            hasher.write_u8(2);
            hasher.write_u8(r);
            hasher.write_u8(g);
            hasher.write_u8(b);
        }
    }
}

fn build_line(screen: &vt100::Screen, row: u16, width: u16) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_style = Style::default();
    let mut current_text = String::new();

    let mut flush = |text: &mut String, style: Style, spans: &mut Vec<Span<'static>>| {
        if !text.is_empty() {
            spans.push(Span::styled(std::mem::take(text), style));
        }
    };

    for col in 0..width {
        let (style, contents) = match screen.cell(row, col) {
            Some(cell) => {
                // Wide chars occupy two cells; render the glyph once.
                if cell.is_wide_continuation() {
                    continue;
                }
                let mut style = Style::default()
                    .fg(map_color(cell.fgcolor()))
                    .bg(map_color(cell.bgcolor()));
                if cell.bold() {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if cell.italic() {
                    style = style.add_modifier(Modifier::ITALIC);
                }
                if cell.underline() {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                if cell.inverse() {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let contents = cell.contents();
                let text = if contents.is_empty() {
                    " ".to_string()
                } else {
                    contents.to_string()
                };
                (style, text)
            }
            None => (Style::default(), " ".to_string()),
        };

        if style != current_style {
            flush(&mut current_text, current_style, &mut spans);
            current_style = style;
        }
        current_text.push_str(&contents);
    }
    flush(&mut current_text, current_style, &mut spans);

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_bytes_updates_screen() {
        let mut state = TerminalState::new_with_scrollback(5, 20, 50);
        state.process_bytes(b"hi there");
        assert!(state.parser.screen().contents().contains("hi there"));
    }

    #[test]
    fn test_cache_follows_resize() {
        let mut state = TerminalState::new_with_scrollback(5, 20, 50);
        state.process_bytes(b"abc");
        let _ = state.cached_lines(5, 20);
        state.resize(10, 40);
        let lines = state.cached_lines(10, 40);
        assert_eq!(lines.len(), 10);
    }
}
