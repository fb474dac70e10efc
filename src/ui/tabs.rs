use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::manager::SessionManager;
use crate::session::SocketState;

/// One-row tab bar over the terminal area.
pub fn draw_tab_bar(area: Rect, manager: &SessionManager, frame: &mut ratatui::Frame<'_>) {
    let active = manager.active_id();
    let mut spans: Vec<Span> = Vec::new();

    for (index, session) in manager.sessions().iter().enumerate() {
        let marker = match session.socket_state {
            SocketState::Connecting => "~",
            SocketState::Open => "",
            SocketState::Closed | SocketState::Failed => "!",
        };
        let label = format!(" {}:{}{} ", index + 1, session.profile.name, marker);
        let style = if Some(session.id) == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if session.socket_state == SocketState::Failed {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(
        " Alt+1..9 switch  Alt+N new  Alt+W close  Alt+F files",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
