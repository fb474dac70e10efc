use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use tui_textarea::TextArea;

use crate::directory::{ConnectionProfile, NewConnection};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FocusField {
    Name,
    Host,
    User,
    Password,
    Key,
}

/// Form for creating a directory profile. Credentials are posted once and
/// never displayed again.
pub struct ConnectionForm {
    pub name: TextArea<'static>,
    pub host: TextArea<'static>,
    pub user: TextArea<'static>,
    pub password: TextArea<'static>,
    pub key: TextArea<'static>,
    pub focus: FocusField,
}

impl ConnectionForm {
    pub fn new() -> Self {
        let field = |placeholder: &str, mask: bool| {
            let mut textarea = TextArea::default();
            textarea.set_placeholder_text(placeholder);
            textarea.set_cursor_line_style(Style::default());
            if mask {
                textarea.set_mask_char('*');
            }
            textarea
        };
        Self {
            name: field("Display name", false),
            host: field("Hostname or IP (port optional)", false),
            user: field("Remote username", false),
            password: field("Password (or leave empty and paste a key)", true),
            key: field("Private key (PEM), optional", false),
            focus: FocusField::Name,
        }
    }

    pub fn next(&mut self) {
        self.focus = match self.focus {
            FocusField::Name => FocusField::Host,
            FocusField::Host => FocusField::User,
            FocusField::User => FocusField::Password,
            FocusField::Password => FocusField::Key,
            FocusField::Key => FocusField::Name,
        };
    }

    pub fn prev(&mut self) {
        self.focus = match self.focus {
            FocusField::Name => FocusField::Key,
            FocusField::Host => FocusField::Name,
            FocusField::User => FocusField::Host,
            FocusField::Password => FocusField::User,
            FocusField::Key => FocusField::Password,
        };
    }

    pub fn focused_textarea_mut(&mut self) -> &mut TextArea<'static> {
        match self.focus {
            FocusField::Name => &mut self.name,
            FocusField::Host => &mut self.host,
            FocusField::User => &mut self.user,
            FocusField::Password => &mut self.password,
            FocusField::Key => &mut self.key,
        }
    }

    fn value(textarea: &TextArea<'static>) -> String {
        textarea.lines().join("\n")
    }

    pub fn to_new_connection(&self) -> NewConnection {
        NewConnection {
            name: Self::value(&self.name).trim().to_string(),
            host: Self::value(&self.host).trim().to_string(),
            user: Self::value(&self.user).trim().to_string(),
            password: Self::value(&self.password),
            key: Self::value(&self.key),
        }
    }
}

pub fn draw_connection_list(
    area: Rect,
    profiles: &[ConnectionProfile],
    selected: usize,
    frame: &mut ratatui::Frame<'_>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let items: Vec<ListItem> = if profiles.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No connections yet. Press 'n' to add one.",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        profiles
            .iter()
            .enumerate()
            .map(|(index, profile)| {
                let style = if index == selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(profile.label(), style)))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Connections ")
            .fg(Color::Cyan),
    );
    frame.render_widget(list, chunks[0]);

    let hints = Paragraph::new(Line::from(Span::styled(
        "Enter: Connect   n: New   d: Delete   r: Reload   Esc: Back to tabs   q: Quit",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    )));
    frame.render_widget(hints, chunks[1]);
}

pub fn draw_connection_form_popup(
    area: Rect,
    form: &mut ConnectionForm,
    frame: &mut ratatui::Frame<'_>,
) {
    let popup_w = area.width.saturating_sub(8).clamp(40, 90);
    let popup_h = 17u16.min(area.height.saturating_sub(2));
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(popup_w)) / 2,
        y: area.y + (area.height.saturating_sub(popup_h)) / 2,
        width: popup_w,
        height: popup_h,
    };

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" New Connection ")
        .fg(Color::Cyan);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let fields: [(&str, &mut TextArea<'static>, FocusField); 5] = [
        ("Name", &mut form.name, FocusField::Name),
        ("Host", &mut form.host, FocusField::Host),
        ("User", &mut form.user, FocusField::User),
        ("Password", &mut form.password, FocusField::Password),
        ("Key", &mut form.key, FocusField::Key),
    ];
    for (index, (label, textarea, field)) in fields.into_iter().enumerate() {
        let focused = form.focus == field;
        let border_color = if focused { Color::Cyan } else { Color::DarkGray };
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(label),
        );
        frame.render_widget(&*textarea, rows[index]);
    }

    let hints = Paragraph::new(Line::from(Span::styled(
        "Tab: Next field   Enter: Save   Esc: Cancel",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    )));
    frame.render_widget(hints, rows[5]);
}
