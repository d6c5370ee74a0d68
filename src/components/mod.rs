use crate::app::{Action, AppContext, AppResult, AppView};
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

/// Trait implemented by all UI components (panes, modals, etc.).
pub trait Component {
    /// Component-local action type. Returned actions will be lifted into the global [`Action`].
    type Command;

    /// Perform setup logic such as copying current settings into a form.
    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    /// Map a key press to a component command, if the component handles keys.
    fn key_command(&self, _key: KeyEvent) -> Option<Self::Command> {
        None
    }

    /// Handle a component-local command and optionally bubble up a global action.
    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>>;

    /// Render the component into the provided [`Rect`].
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>);

    /// Called on every tick to perform periodic work (e.g., animation).
    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
