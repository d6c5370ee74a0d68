pub mod address;
pub mod config;
pub mod ens;
pub mod session;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

use crate::{
    components::Component,
    storage::Storage,
    ui::{
        approvals::ApprovalsPanel,
        bottom_bar::BottomBar,
        input::{AddressInput, InputCommand},
        modal::settings::{SettingsFormCommand, SettingsModal},
        top::{TopBar, TopCommand},
    },
};
use address::ChecksummedAddress;
use config::Settings;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ens::{ReadProvider, resolve};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use session::{InputSession, ResolutionTicket};
use std::{sync::Arc, sync::mpsc, time::Duration};
use tokio::runtime::{Handle, Runtime};
use wallet::{ConnectMode, Connection, ConnectionState, Signer, WalletEnvironment};

pub type AppResult<T> = color_eyre::Result<T>;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Central application type that orchestrates state and delegates to UI components.
pub struct App {
    running: bool,
    pub state: AppState,
    pub storage: Storage,
    top_bar: TopBar,
    address_input: AddressInput,
    approvals: ApprovalsPanel,
    bottom_bar: BottomBar,
    settings_modal: Option<SettingsModal>,
    runtime: Runtime,
    message_rx: mpsc::Receiver<Message>,
    message_tx: mpsc::Sender<Message>,
}

impl App {
    pub fn new(mut storage: Storage) -> AppResult<Self> {
        let settings = Settings::load(&storage)?;
        let runtime = Runtime::new()?;
        let read_provider = runtime.block_on(wallet::init_read_provider(&settings))?;
        let wallets = runtime.block_on(WalletEnvironment::detect(&settings));
        tracing::info!(?wallets, "wallet endpoints detected");

        let mut state = AppState::new(settings, read_provider, wallets);
        let mut top_bar = TopBar::default();
        let mut address_input = AddressInput::default();
        let mut approvals = ApprovalsPanel::default();
        let mut bottom_bar = BottomBar::default();
        let (message_tx, message_rx) = mpsc::channel();

        {
            let mut ctx = AppContext {
                state: &mut state,
                storage: &mut storage,
                commands: CommandBus::new(message_tx.clone(), runtime.handle().clone()),
            };
            top_bar.init(&mut ctx)?;
            address_input.init(&mut ctx)?;
            approvals.init(&mut ctx)?;
            bottom_bar.init(&mut ctx)?;
        }

        let mut app = Self {
            running: false,
            state,
            storage,
            top_bar,
            address_input,
            approvals,
            bottom_bar,
            settings_modal: None,
            runtime,
            message_rx,
            message_tx,
        };
        if !app.state.wallets.is_empty() {
            app.start_connect(ConnectMode::Silent);
        }
        Ok(app)
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.running = true;
        while self.running {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let view = AppView { state: &self.state };

        self.top_bar.render(frame, layout[0], &view);
        self.address_input.render(frame, layout[1], &view);
        self.approvals.render(frame, layout[2], &view);
        self.bottom_bar.render(frame, layout[3], &view);
        if let Some(modal) = self.settings_modal.as_mut() {
            modal.render(frame, frame.area(), &view);
        }
    }

    fn handle_events(&mut self) -> AppResult<()> {
        if !event::poll(TICK_RATE)? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key)?,
            Event::Paste(text) => {
                if self.settings_modal.is_some() {
                    self.settings_command(SettingsFormCommand::InsertText(text))?;
                } else {
                    self.input_command(InputCommand::InsertText(text))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if let Some(modal) = self.settings_modal.as_ref() {
            if let Some(command) = modal.key_command(key) {
                self.settings_command(command)?;
            }
            return Ok(());
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                self.dispatch(Action::Quit)?
            }
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => self.dispatch(Action::Connect)?,
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => self.dispatch(Action::OpenSettings)?,
            _ => {
                if let Some(command) = self.address_input.key_command(key) {
                    self.input_command(command)?;
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> AppResult<()> {
        match action {
            Action::Quit => self.running = false,
            Action::InputChanged(text) => self.start_resolution(text),
            Action::Connect => {
                if self.state.connection.is_connecting() {
                    tracing::debug!("connect already in flight");
                } else {
                    self.start_connect(ConnectMode::Requested);
                }
            }
            Action::OpenSettings => {
                let mut modal = SettingsModal::new();
                let mut ctx = self.context();
                modal.init(&mut ctx)?;
                self.settings_modal = Some(modal);
            }
            Action::CloseModal => self.settings_modal = None,
            Action::SettingsSaved => {
                self.settings_modal = None;
                self.top_bar_command(TopCommand::ShowStatus(
                    "Settings saved. A new read RPC applies on restart".into(),
                ))?;
            }
        }
        Ok(())
    }

    fn context(&mut self) -> AppContext<'_> {
        AppContext {
            state: &mut self.state,
            storage: &mut self.storage,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone()),
        }
    }

    fn input_command(&mut self, command: InputCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
            storage: &mut self.storage,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone()),
        };
        if let Some(action) = self.address_input.update(&command, &mut ctx)? {
            self.dispatch(action)?;
        }
        Ok(())
    }

    fn top_bar_command(&mut self, command: TopCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
            storage: &mut self.storage,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone()),
        };
        if let Some(action) = self.top_bar.update(&command, &mut ctx)? {
            self.dispatch(action)?;
        }
        Ok(())
    }

    fn settings_command(&mut self, command: SettingsFormCommand) -> AppResult<()> {
        let Some(modal) = self.settings_modal.as_mut() else {
            return Ok(());
        };
        let mut ctx = AppContext {
            state: &mut self.state,
            storage: &mut self.storage,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone()),
        };
        if let Some(action) = modal.update(&command, &mut ctx)? {
            self.dispatch(action)?;
        }
        Ok(())
    }

    fn command_bus(&self) -> CommandBus {
        CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone())
    }

    fn start_resolution(&mut self, text: String) {
        let ticket = self.state.session.on_text_changed(text);
        let provider = self.state.read_provider.clone();
        self.command_bus().spawn_async(move || async move {
            let address = resolve(&ticket.text, provider.as_ref()).await;
            Message::Resolved { ticket, address }
        });
    }

    fn start_connect(&mut self, mode: ConnectMode) {
        self.state.connection.begin();
        let wallets = self.state.wallets.clone();
        let provider = self.state.read_provider.clone();
        self.command_bus().spawn_async(move || async move {
            let connection = wallet::connect_signer(mode, &wallets, provider.as_ref()).await;
            Message::ConnectFinished { mode, connection }
        });
    }

    fn tick(&mut self) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
            storage: &mut self.storage,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime.handle().clone()),
        };
        if let Some(action) = self.top_bar.tick(&mut ctx)? {
            self.dispatch(action)?;
        }
        self.drain_messages()
    }

    fn drain_messages(&mut self) -> AppResult<()> {
        while let Ok(message) = self.message_rx.try_recv() {
            match message {
                Message::Resolved { ticket, address } => {
                    if self.state.session.apply_resolution(&ticket, address) {
                        tracing::debug!(input = %ticket.text, ?address, "input resolved");
                    }
                }
                Message::ConnectFinished { mode, connection } => {
                    if let Some(connection) = connection.as_ref() {
                        self.state.session.seed_from_identity(&connection.identity);
                        self.top_bar_command(TopCommand::ShowStatus(format!(
                            "Connected as {}",
                            connection.identity.label()
                        )))?;
                    } else {
                        tracing::debug!(?mode, "no signer; connection state unchanged");
                    }
                    self.state.connection.finish(connection);
                }
                Message::WalletsDetected(wallets) => {
                    tracing::info!(?wallets, "wallet endpoints refreshed");
                    self.state.wallets = wallets;
                }
            }
        }
        Ok(())
    }
}

/// State shared across components.
pub struct AppState {
    pub settings: Settings,
    pub read_provider: Arc<dyn ReadProvider>,
    pub wallets: WalletEnvironment,
    pub connection: ConnectionState,
    pub session: InputSession,
}

impl AppState {
    pub fn new(
        settings: Settings,
        read_provider: Arc<dyn ReadProvider>,
        wallets: WalletEnvironment,
    ) -> Self {
        Self {
            settings,
            read_provider,
            wallets,
            connection: ConnectionState::default(),
            session: InputSession::default(),
        }
    }

    /// Inputs for the approvals panel; absent until the input resolves.
    pub fn approvals_props(&self) -> Option<ApprovalsProps> {
        let resolved_address = self.session.resolved_address()?;
        let connection = self.connection.connection();
        Some(ApprovalsProps {
            read_provider: self.read_provider.clone(),
            signer: connection.map(|c| c.signer.clone()),
            signer_address: connection.map(|c| c.identity.address),
            resolved_address,
        })
    }
}

/// What the downstream approvals listing receives.
#[derive(Clone)]
pub struct ApprovalsProps {
    pub read_provider: Arc<dyn ReadProvider>,
    pub signer: Option<Signer>,
    pub signer_address: Option<ChecksummedAddress>,
    pub resolved_address: ChecksummedAddress,
}

impl ApprovalsProps {
    /// Whether the connected signer owns the account being inspected.
    pub fn can_act(&self) -> bool {
        self.signer.is_some() && self.signer_address == Some(self.resolved_address)
    }
}

/// Mutable context passed to components while handling logic.
pub struct AppContext<'a> {
    pub state: &'a mut AppState,
    pub storage: &'a mut Storage,
    pub commands: CommandBus,
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub state: &'a AppState,
}

#[derive(Clone)]
pub struct CommandBus {
    sender: mpsc::Sender<Message>,
    handle: Handle,
}

impl CommandBus {
    pub fn new(sender: mpsc::Sender<Message>, handle: Handle) -> Self {
        Self { sender, handle }
    }

    pub fn spawn_async<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Message> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let message = task().await;
            let _ = sender.send(message);
        });
    }
}

pub enum Message {
    Resolved {
        ticket: ResolutionTicket,
        address: Option<ChecksummedAddress>,
    },
    ConnectFinished {
        mode: ConnectMode,
        connection: Option<Connection>,
    },
    WalletsDetected(WalletEnvironment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    InputChanged(String),
    Connect,
    OpenSettings,
    CloseModal,
    SettingsSaved,
}
