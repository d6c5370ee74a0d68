use crate::{
    app::{Action, AppContext, AppResult, AppView},
    components::Component,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Paragraph},
};

const PLACEHOLDER: &str = "Enter Ethereum address or ENS name";

#[derive(Debug, Clone)]
pub enum InputCommand {
    InputChar(char),
    InsertText(String),
    Backspace,
    Clear,
}

/// Free-text field for the account under inspection.
#[derive(Debug, Default)]
pub struct AddressInput;

impl AddressInput {
    fn edited(current: &str, command: &InputCommand) -> String {
        let mut text = current.to_string();
        match command {
            InputCommand::InputChar(c) => text.push(*c),
            InputCommand::InsertText(pasted) => {
                text.extend(pasted.chars().filter(|ch| !matches!(ch, '\r' | '\n')))
            }
            InputCommand::Backspace => {
                text.pop();
            }
            InputCommand::Clear => text.clear(),
        }
        text
    }
}

impl Component for AddressInput {
    type Command = InputCommand;

    fn key_command(&self, key: KeyEvent) -> Option<Self::Command> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Backspace) => Some(InputCommand::Backspace),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(InputCommand::Clear),
            (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
                Some(InputCommand::InputChar(c))
            }
            _ => None,
        }
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        let current = ctx.state.session.raw_text();
        let next = Self::edited(current, command);
        if next == current {
            return Ok(None);
        }
        Ok(Some(Action::InputChanged(next)))
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let session = &ctx.state.session;
        let entry = if session.raw_text().is_empty() {
            Line::from(vec![
                Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
                Span::styled("▌", Style::default().fg(Color::LightCyan)),
            ])
        } else {
            Line::from(vec![
                Span::styled(
                    session.raw_text().to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled("▌", Style::default().fg(Color::LightCyan)),
            ])
        };

        let detail = match (session.is_resolving(), session.resolved_address()) {
            (true, _) => Line::from(Span::styled("Resolving…", Style::default().fg(Color::Yellow))),
            (false, Some(address)) => Line::from(vec![
                Span::styled("→ ", Style::default().fg(Color::Gray)),
                Span::styled(address.to_checksum(), Style::default().fg(Color::Green)),
            ]),
            (false, None) => Line::default(),
        };

        let widget = Paragraph::new(Text::from(vec![entry, detail])).block(
            Block::bordered().title(
                Line::from("[2] Account").style(Style::default().add_modifier(Modifier::BOLD)),
            ),
        );
        frame.render_widget(widget, area);
    }
}
