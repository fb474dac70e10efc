use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use crate::directory::Features;
use crate::navigator::{BrowserFocus, FileBrowser};
use crate::protocol::FileEntry;

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn entry_line(entry: &FileEntry, selected: bool) -> ListItem<'static> {
    let name = if entry.is_dir {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    };
    let size = if entry.is_dir {
        String::new()
    } else {
        format!("  ({:.2} KB)", entry.size as f64 / 1024.0)
    };
    let style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else if entry.is_dir {
        Style::default().fg(Color::Blue)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(vec![
        Span::styled(name, style),
        Span::styled(size, Style::default().fg(Color::DarkGray)),
    ]))
}

/// File browser popup over the active session's terminal.
pub fn draw_file_browser(
    area: Rect,
    browser: &mut FileBrowser,
    features: Features,
    frame: &mut ratatui::Frame<'_>,
) {
    let popup = centered_rect(area, 80, 80);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Remote Files ")
        .fg(Color::Cyan);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let path_focused = browser.focus == BrowserFocus::PathEdit;
    browser.path_input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if path_focused {
                Color::Cyan
            } else {
                Color::DarkGray
            }))
            .title("Path"),
    );
    frame.render_widget(&browser.path_input, rows[0]);

    let items: Vec<ListItem> = if browser.entries.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "(empty)",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        browser
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_line(entry, index == browser.selected))
            .collect()
    };
    frame.render_widget(List::new(items), rows[1]);

    let mut hints = String::from("Enter: Open   Left: Up   r: Refresh   /: Path");
    if features.file_browser {
        hints.push_str("   u: Upload");
    }
    if features.download {
        hints.push_str("   d: Download");
    }
    hints.push_str("   Esc: Close");
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hints,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ))),
        rows[2],
    );

    if browser.focus == BrowserFocus::UploadPrompt {
        draw_upload_prompt(area, browser, frame);
    }
}

fn draw_upload_prompt(area: Rect, browser: &mut FileBrowser, frame: &mut ratatui::Frame<'_>) {
    let popup_w = area.width.saturating_sub(10).clamp(40, 80);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(popup_w)) / 2,
        y: area.y + area.height / 2,
        width: popup_w,
        height: 5u16.min(area.height),
    };
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Upload File ")
        .fg(Color::Yellow);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(inner);

    browser.upload_input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title("Local path"),
    );
    frame.render_widget(&browser.upload_input, rows[0]);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Enter: Upload   Esc: Cancel",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ))),
        rows[1],
    );
}
