use crate::{
    app::{Action, AppContext, AppResult, AppView},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

#[derive(Debug, Default)]
pub struct BottomBar;

impl Component for BottomBar {
    type Command = ();

    fn update(
        &mut self,
        _command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let mut spans = vec![Span::raw(
            "Esc Quit • Ctrl+W Connect • Ctrl+S Settings • Ctrl+U Clear input",
        )];
        if !ctx.state.settings.has_wallet() {
            spans.push(Span::styled(
                "  (no wallet endpoint configured)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        let widget = Paragraph::new(Line::from(spans)).block(
            Block::bordered()
                .title(Line::from("[4] Keymap").style(Style::default().add_modifier(Modifier::BOLD))),
        );
        frame.render_widget(widget, area);
    }
}
