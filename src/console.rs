//! Terminal panel.
//!
//! DESIGN
//! ======
//! A line-oriented stand-in for the browser panel. It runs a relay in-process
//! with a [`ChannelHost`] and drives a [`PanelView`] from three sources:
//! - stdin lines → [`ConsoleCommand`] → panel requests
//! - relay output → view updates → printed lines
//! - the countdown ticker, only while a countdown runs
//!
//! Logs go to stderr, the panel itself to stdout.

use std::io;
use std::ops::ControlFlow;

use frames::{PanelEvent, PanelRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Interval;
use tracing::{info, warn};

use crate::config::Endpoints;
use crate::host::ChannelHost;
use crate::panel::PanelView;
use crate::panel::chat_log::render_line;
use crate::panel::countdown;
use crate::panel::race::RaceBoard;
use crate::relay::{Relay, RelayHandle};

const HELP: &str = "\
commands:
  <text>          send a chat message
  /switch <url>   move chat to another endpoint
  /start          start the race after a countdown
  /stop           stop the race
  /change         change the race
  /lock           toggle the drawer lock
  /show, /hide    mark the panel visible or hidden
  /help           show this help
  /quit           leave";

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Say(String),
    Switch(String),
    Start,
    Stop,
    Change,
    Lock,
    Show,
    Hide,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
#[must_use]
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(ConsoleCommand::Say(line.to_owned()));
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
    let command = match name {
        "switch" => ConsoleCommand::Switch(arg.to_owned()),
        "start" => ConsoleCommand::Start,
        "stop" => ConsoleCommand::Stop,
        "change" => ConsoleCommand::Change,
        "lock" => ConsoleCommand::Lock,
        "show" => ConsoleCommand::Show,
        "hide" => ConsoleCommand::Hide,
        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => ConsoleCommand::Unknown(other.to_owned()),
    };
    Some(command)
}

// =============================================================================
// RENDERING
// =============================================================================

/// Board summary followed by one line per player, leader starred.
#[must_use]
pub fn race_lines(board: &RaceBoard) -> Vec<String> {
    let status = if board.started() { "running" } else { "waiting" };
    let mut lines = vec![format!(
        "race {status}, {} spectators",
        board.spectators()
    )];
    lines.extend(board.rows().iter().map(|row| {
        let marker = if row.leading { '*' } else { ' ' };
        format!("{marker} {:<16} {:>6.0}px", row.name, row.offset_px)
    }));
    lines
}

/// Lines to print after `event` has been applied to `view`.
#[must_use]
pub fn render_event(view: &PanelView, event: &PanelEvent) -> Vec<String> {
    match event {
        PanelEvent::WsMessage { .. } => view.chat.latest().map(render_line).into_iter().collect(),
        PanelEvent::Karirs { .. } => race_lines(&view.race),
        PanelEvent::Badge { value, tooltip } if *value > 0 => vec![format!("({tooltip})")],
        PanelEvent::Badge { .. } => Vec::new(),
        PanelEvent::ClearChat => vec!["-- chat cleared --".to_owned()],
        PanelEvent::Connection { feed, state, url } => vec![format!("[{feed}] {state} {url}")],
        PanelEvent::DeliveryFailed { .. } => view
            .last_failure()
            .map(|failure| format!("! {failure}"))
            .into_iter()
            .collect(),
    }
}

// =============================================================================
// CONSOLE
// =============================================================================

pub struct Console {
    view: PanelView,
    handle: RelayHandle,
    ticker: Option<Interval>,
}

impl Console {
    #[must_use]
    pub fn new(handle: RelayHandle) -> Self {
        Self {
            view: PanelView::default(),
            handle,
            ticker: None,
        }
    }

    #[must_use]
    pub fn view(&self) -> &PanelView {
        &self.view
    }

    #[must_use]
    pub fn countdown_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Run one command. `Break` ends the console.
    pub async fn execute(&mut self, command: ConsoleCommand) -> ControlFlow<(), Vec<String>> {
        let mut lines = Vec::new();
        let request = match command {
            ConsoleCommand::Say(text) => self.view.submit_text(&text),
            ConsoleCommand::Switch(url) => {
                let request = self.view.select_endpoint(&url);
                if request.is_none() {
                    lines.push("usage: /switch <url>".to_owned());
                }
                request
            }
            ConsoleCommand::Start => {
                if self.view.countdown.is_running() {
                    lines.push("countdown already running".to_owned());
                } else if self.view.press_start() {
                    self.ticker = Some(countdown::ticker());
                } else {
                    lines.push("start is not available while the race runs".to_owned());
                }
                None
            }
            ConsoleCommand::Stop => {
                self.ticker = None;
                Some(self.view.press_stop())
            }
            ConsoleCommand::Change => Some(self.view.press_change()),
            ConsoleCommand::Lock => {
                let state = if self.view.toggle_drawer_lock() {
                    "unlocked"
                } else {
                    "locked"
                };
                lines.push(format!("drawer {state}"));
                None
            }
            ConsoleCommand::Show => Some(PanelRequest::Visibility { visible: true }),
            ConsoleCommand::Hide => Some(PanelRequest::Visibility { visible: false }),
            ConsoleCommand::Help => {
                lines.extend(HELP.lines().map(str::to_owned));
                None
            }
            ConsoleCommand::Quit => return ControlFlow::Break(()),
            ConsoleCommand::Unknown(name) => {
                lines.push(format!("unknown command /{name}, try /help"));
                None
            }
        };

        if let Some(request) = request {
            self.submit(request).await?;
        }
        ControlFlow::Continue(lines)
    }

    /// Fold relay output into the view.
    pub fn on_event(&mut self, event: &PanelEvent) -> Vec<String> {
        if let Err(e) = self.view.apply(event) {
            warn!(error = %e, "console: unreadable relay message");
            return Vec::new();
        }
        if !self.view.countdown.is_running() {
            self.ticker = None;
        }
        render_event(&self.view, event)
    }

    /// Advance the countdown by one second.
    pub async fn on_tick(&mut self) -> ControlFlow<(), Vec<String>> {
        let fired = self.view.tick_countdown();
        let lines = self
            .view
            .countdown
            .display()
            .map(str::to_owned)
            .into_iter()
            .collect();

        if let Some(request) = fired {
            self.ticker = None;
            self.submit(request).await?;
        }
        ControlFlow::Continue(lines)
    }

    async fn submit(&self, request: PanelRequest) -> ControlFlow<()> {
        match self.handle.submit(request).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                warn!(error = %e, "console: relay unavailable");
                ControlFlow::Break(())
            }
        }
    }

    async fn next_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

/// Run the terminal panel until `/quit`, end of input, or the relay stops.
///
/// # Errors
///
/// Returns any error reading stdin.
pub async fn run_console(endpoints: Endpoints) -> io::Result<()> {
    info!(chat = %endpoints.chat, game = %endpoints.game, "console: started");
    let (host, mut events) = ChannelHost::new();
    let relay = Relay::new(host, endpoints);
    let handle = relay.handle();
    let relay_task = tokio::spawn(relay.run());

    let mut console = Console::new(handle.clone());
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    let result = loop {
        let step = tokio::select! {
            line = input.next_line() => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => console.execute(command).await,
                    None => ControlFlow::Continue(Vec::new()),
                },
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            },
            event = events.recv() => match event {
                Some(event) => ControlFlow::Continue(console.on_event(&event)),
                None => ControlFlow::Break(()),
            },
            () = console.next_tick() => console.on_tick().await,
        };

        match step {
            ControlFlow::Continue(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            ControlFlow::Break(()) => break Ok(()),
        }
    };

    handle.shutdown().await;
    if let Err(e) = relay_task.await {
        warn!(error = %e, "console: relay task failed");
    }
    info!("console: stopped");
    result
}

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;
