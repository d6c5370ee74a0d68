use crate::{
    app::{
        Action, AppContext, AppResult, AppView, Message,
        config::{SettingKey, Settings},
        wallet::WalletEnvironment,
    },
    components::Component,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::cmp::min;

#[derive(Debug, Clone)]
pub enum SettingsFormCommand {
    FocusNextField,
    FocusPreviousField,
    InputChar(char),
    InsertText(String),
    Backspace,
    Submit,
    Cancel,
    ClearField,
    ResetDefaults,
}

/// Edits the endpoints in [`Settings`] and persists them.
#[derive(Debug, Default)]
pub struct SettingsModal {
    values: [String; 3],
    focused: usize,
    message: Option<String>,
}

impl SettingsModal {
    pub fn new() -> Self {
        Self::default()
    }

    fn load_values(&mut self, settings: &Settings) {
        for (slot, key) in self.values.iter_mut().zip(SettingKey::ALL) {
            *slot = settings.get(key).unwrap_or_default().to_string();
        }
    }

    fn selected_value(&mut self) -> &mut String {
        &mut self.values[self.focused]
    }

    fn cycle_field(&mut self, forward: bool) {
        let len = self.values.len();
        self.focused = if forward {
            (self.focused + 1) % len
        } else {
            (self.focused + len - 1) % len
        };
    }

    /// The form as settings. Fails when the mandatory read RPC is blank.
    fn to_settings(&self, base: &Settings) -> Result<Settings, &'static str> {
        if self.values[0].trim().is_empty() {
            return Err("Read RPC URL is required");
        }
        let mut settings = base.clone();
        for (key, value) in SettingKey::ALL.into_iter().zip(&self.values) {
            settings.set(key, value);
        }
        Ok(settings)
    }

    fn save(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        let settings = match self.to_settings(&ctx.state.settings) {
            Ok(settings) => settings,
            Err(message) => {
                self.message = Some(message.to_string());
                return Ok(None);
            }
        };
        ctx.storage.settings().save(&settings)?;
        tracing::info!(?settings, "settings saved");
        Ok(Some(Self::apply(settings, ctx)))
    }

    fn reset(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        ctx.storage.settings().clear()?;
        let settings = Settings::default().with_overrides(|name| std::env::var(name).ok());
        self.load_values(&settings);
        Ok(Some(Self::apply(settings, ctx)))
    }

    /// Adopts new settings and re-detects wallet endpoints in the background.
    fn apply(settings: Settings, ctx: &mut AppContext<'_>) -> Action {
        let detect_with = settings.clone();
        ctx.commands.spawn_async(move || async move {
            Message::WalletsDetected(WalletEnvironment::detect(&detect_with).await)
        });
        ctx.state.settings = settings;
        Action::SettingsSaved
    }

    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let width = min(width, area.width);
        let height = min(height, area.height);
        Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        }
    }

    fn field_line(&self, index: usize, key: SettingKey) -> Line<'static> {
        let value = &self.values[index];
        let is_focused = self.focused == index;
        let shown = match (value.trim().is_empty(), key) {
            (true, SettingKey::RpcUrl) => "<required>".to_string(),
            (true, _) => "<not set>".to_string(),
            (false, _) => value.clone(),
        };
        let value_style = if is_focused {
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD)
        } else if value.trim().is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };

        let mut spans = vec![
            Span::styled(
                format!("{}: ", key.title()),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ),
            Span::styled(shown, value_style),
        ];
        if is_focused {
            spans.push(Span::styled(
                " ▌",
                Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    }
}

impl Component for SettingsModal {
    type Command = SettingsFormCommand;

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        self.load_values(&ctx.state.settings);
        Ok(())
    }

    fn key_command(&self, event: KeyEvent) -> Option<Self::Command> {
        match (event.modifiers, event.code) {
            (_, KeyCode::Esc) => Some(SettingsFormCommand::Cancel),
            (KeyModifiers::NONE, KeyCode::Tab) | (KeyModifiers::NONE, KeyCode::Down) => {
                Some(SettingsFormCommand::FocusNextField)
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab)
            | (KeyModifiers::SHIFT, KeyCode::Tab)
            | (KeyModifiers::NONE, KeyCode::Up) => Some(SettingsFormCommand::FocusPreviousField),
            (_, KeyCode::Enter) => Some(SettingsFormCommand::Submit),
            (_, KeyCode::Backspace) => Some(SettingsFormCommand::Backspace),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(SettingsFormCommand::ClearField),
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                Some(SettingsFormCommand::ResetDefaults)
            }
            (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
                Some(SettingsFormCommand::InputChar(c))
            }
            _ => None,
        }
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        self.message = None;
        match command {
            SettingsFormCommand::FocusNextField => self.cycle_field(true),
            SettingsFormCommand::FocusPreviousField => self.cycle_field(false),
            SettingsFormCommand::InputChar(c) => self.selected_value().push(*c),
            SettingsFormCommand::InsertText(text) => {
                let cleaned: String = text
                    .chars()
                    .filter(|ch| !matches!(ch, '\r' | '\n'))
                    .collect();
                self.selected_value().push_str(&cleaned);
            }
            SettingsFormCommand::Backspace => {
                self.selected_value().pop();
            }
            SettingsFormCommand::ClearField => self.selected_value().clear(),
            SettingsFormCommand::Submit => return self.save(ctx),
            SettingsFormCommand::ResetDefaults => return self.reset(ctx),
            SettingsFormCommand::Cancel => return Ok(Some(Action::CloseModal)),
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, _ctx: &AppView<'_>) {
        let modal_area = Self::centered_rect(76, 15, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .title(Span::styled(
                "Settings",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Text::raw(
                "Endpoints for name resolution and wallet access. Environment variables win.",
            ))
            .alignment(Alignment::Center),
            chunks[0],
        );

        for (index, key) in SettingKey::ALL.into_iter().enumerate() {
            frame.render_widget(Paragraph::new(self.field_line(index, key)), chunks[index + 1]);
        }

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Rotate fields with Tab • Clear with Ctrl+U • Reset with Ctrl+R",
                Style::default().fg(Color::Gray),
            ))),
            chunks[4],
        );

        let status = match self.message.as_ref() {
            Some(message) => Span::styled(message.clone(), Style::default().fg(Color::Yellow)),
            None => Span::styled(
                "Submit with Enter. Cancel with Esc.",
                Style::default().fg(Color::Gray),
            ),
        };
        frame.render_widget(Paragraph::new(status), chunks[5]);
    }
}
