use super::util::short_address;
use crate::{
    app::{Action, AppContext, AppResult, AppView, wallet::ConnectionState},
    components::Component,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug)]
pub struct TopBar {
    title: String,
    status: Option<String>,
    frame: usize,
}

impl Default for TopBar {
    fn default() -> Self {
        Self {
            title: "evm-account-tui".to_string(),
            status: None,
            frame: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TopCommand {
    ShowStatus(String),
}

impl TopBar {
    /// Text of the connect affordance: who is connected, or an invitation to connect.
    pub fn connect_label(connection: &ConnectionState) -> String {
        if connection.is_connecting() {
            return "Connecting…".to_string();
        }
        match connection.connection() {
            Some(connection) => connection
                .identity
                .display_name
                .clone()
                .unwrap_or_else(|| short_address(&connection.identity.address)),
            None => "Connect wallet".to_string(),
        }
    }
}

impl Component for TopBar {
    type Command = TopCommand;

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            TopCommand::ShowStatus(message) => self.status = Some(message.clone()),
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let connection = &ctx.state.connection;
        let block = Block::bordered().title(
            Line::from(format!("[1] {}", self.title)).style(Style::default().add_modifier(Modifier::BOLD)),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(32)])
            .split(inner);

        let status = self
            .status
            .clone()
            .unwrap_or_else(|| format!("Reading via {}", ctx.state.read_provider.endpoint()));
        frame.render_widget(
            Paragraph::new(Line::from(status)).style(Style::default().fg(Color::Gray)),
            columns[0],
        );

        let label = Self::connect_label(connection);
        let button = if connection.is_connecting() {
            Span::styled(
                format!("{} {label}", SPINNER[self.frame % SPINNER.len()]),
                Style::default().fg(Color::Yellow),
            )
        } else if connection.connection().is_some() {
            Span::styled(
                format!("● {label}"),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!("[ {label} ]"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(button)).alignment(Alignment::Right),
            columns[1],
        );
    }

    fn tick(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        if ctx.state.connection.is_connecting() {
            self.frame = self.frame.wrapping_add(1);
        }
        Ok(None)
    }
}
