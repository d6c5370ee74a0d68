use super::util::short_address;
use crate::{
    app::{Action, AppContext, AppResult, AppView, ApprovalsProps},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Wrap},
};

/// Host for the approvals listing. Shows which account is inspected and
/// whether the connected signer may act on it.
#[derive(Debug, Default)]
pub struct ApprovalsPanel;

impl ApprovalsPanel {
    fn lines(props: &ApprovalsProps) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Account   ", label),
                Span::raw(props.resolved_address.to_checksum()),
            ]),
            Line::from(vec![
                Span::styled("Network   ", label),
                Span::raw(props.read_provider.endpoint().to_string()),
            ]),
        ];

        let signer = match props.signer_address.filter(|_| props.signer.is_some()) {
            Some(address) if props.can_act() => Span::styled(
                format!("{} (owner, can revoke)", short_address(&address)),
                Style::default().fg(Color::Green),
            ),
            Some(address) => Span::styled(
                format!("{} (read-only, not this account)", short_address(&address)),
                Style::default().fg(Color::Yellow),
            ),
            None => Span::styled(
                "not connected (read-only)",
                Style::default().fg(Color::DarkGray),
            ),
        };
        lines.push(Line::from(vec![Span::styled("Signer    ", label), signer]));
        lines
    }
}

impl Component for ApprovalsPanel {
    type Command = ();

    fn update(
        &mut self,
        _command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let block = Block::bordered()
            .title(Line::from("[3] Approvals").style(Style::default().add_modifier(Modifier::BOLD)));
        let body = match ctx.state.approvals_props() {
            Some(props) => Text::from(Self::lines(&props)),
            None => Text::default(),
        };
        frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }).block(block), area);
    }
}
