use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{
    io::{BufReader, Lines, Stdin},
    sync::mpsc,
    time::sleep,
};
use tracing::{debug, info};
use tycoon_core::{
    GameSession, Ledger, LedgerError, SaveManager, TransferEvent, TransferSender, UpgradeReceipt,
};

use crate::{
    command::{Command, COMMANDS},
    console,
};

const COMMAND_PROMPT: &str = "\nEnter command: ";

pub type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Load the saved game, or ask for a username and start a new one.
pub async fn open_session(saves: SaveManager, input: &mut Input) -> Result<GameSession> {
    let ledger = match saves.load()? {
        Some(ledger) => {
            console::info(format!(
                "Loaded saved game progress for player '{}'.",
                ledger.username()
            ));
            ledger
        }
        None => {
            let username = prompt_username(input).await?;
            console::info(format!("Welcome, {username}! Starting a new game."));
            info!("starting new game for '{username}'");
            Ledger::new_game(username)
        }
    };
    Ok(GameSession::new(ledger, saves))
}

async fn prompt_username(input: &mut Input) -> Result<String> {
    loop {
        console::prompt("Enter a username to start a new game: ")?;
        let line = input
            .next_line()
            .await
            .context("failed to read username")?
            .context("no username entered")?;
        let username = line.trim();
        // ':' separates sender from amount on the wire.
        if username.contains(':') {
            console::warning("Usernames cannot contain ':'.");
            continue;
        }
        return Ok(username.to_string());
    }
}

/// Interactive command loop.
pub struct TycoonApp {
    session: GameSession,
    sender: TransferSender,
    events: mpsc::UnboundedReceiver<TransferEvent>,
    input: Input,
    wait: Duration,
}

impl TycoonApp {
    pub fn new(
        session: GameSession,
        sender: TransferSender,
        events: mpsc::UnboundedReceiver<TransferEvent>,
        input: Input,
        wait: Duration,
    ) -> Self {
        Self {
            session,
            sender,
            events,
            input,
            wait,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        console::info(format!(
            "Welcome to Tycoon, {}!",
            self.session.username()
        ));
        console::info(format!("Commands: {COMMANDS}"));

        loop {
            let Some(line) = self.read_line(COMMAND_PROMPT).await? else {
                console::info("\nExiting Tycoon. Thanks for playing!");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            let flow = match line.parse::<Command>() {
                Ok(command) => {
                    debug!("dispatching {command:?}");
                    self.dispatch(command).await?
                }
                Err(err) => {
                    console::warning(err);
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Prompt and wait for a line, printing transfer events as they arrive.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        console::prompt(prompt)?;
        loop {
            tokio::select! {
                line = self.input.next_line() => {
                    return line.context("failed to read from stdin");
                }
                Some(event) = self.events.recv() => {
                    console::transfer_event(&event);
                    console::prompt(prompt.trim_start())?;
                }
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Status => console::status(&self.session.status()),
            Command::Collect => self.collect(),
            Command::Upgrade(position) => self.upgrade(position),
            Command::Wait => {
                console::info(format!("Waiting... ({} seconds)", self.wait.as_secs()));
                sleep(self.wait).await;
                self.collect();
            }
            Command::Save => self.save(),
            Command::Send { host, amount } => match self.sender.send(&host, amount).await {
                Ok(receipt) => console::sent(&receipt),
                Err(err) => console::failure(&err),
            },
            Command::Exit => {
                let answer = self
                    .read_line("Do you want to save before exiting? (yes/no): ")
                    .await?
                    .unwrap_or_default();
                if confirms_save(&answer) {
                    self.save();
                }
                console::info("Exiting Tycoon. Thanks for playing!");
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn collect(&self) {
        console::collected(&self.session.collect());
    }

    fn upgrade(&self, position: usize) {
        let result = self
            .session
            .with_ledger(|ledger| upgrade_at_position(ledger, position));
        match result {
            Ok(receipt) => console::upgraded(&receipt),
            Err(err) => console::warning(err),
        }
    }

    fn save(&self) {
        match self.session.save() {
            Ok(()) => console::success("Game progress saved."),
            Err(err) => console::failure(err.as_ref()),
        }
    }
}

/// Upgrade the business at the 1-based `position` shown by `status`.
fn upgrade_at_position(
    ledger: &mut Ledger,
    position: usize,
) -> Result<UpgradeReceipt, LedgerError> {
    match position.checked_sub(1) {
        Some(index) => ledger.upgrade_business(index),
        None => Err(LedgerError::InvalidBusiness {
            position,
            count: ledger.businesses().len(),
        }),
    }
}

/// Only an explicit "yes" saves on exit.
fn confirms_save(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_positions_are_one_based() -> Result<()> {
        let mut ledger = Ledger::new_game("alice");
        let receipt = upgrade_at_position(&mut ledger, 1)?;
        assert_eq!(receipt.name, "Lemonade Stand");
        assert_eq!(receipt.level, 2);
        assert_eq!(ledger.businesses()[0].level(), 2);
        assert_eq!(ledger.businesses()[1].level(), 1);
        Ok(())
    }

    #[test]
    fn out_of_range_positions_are_invalid_businesses() {
        let mut ledger = Ledger::new_game("alice");
        let count = ledger.businesses().len();

        for position in [0, count + 1] {
            assert_eq!(
                upgrade_at_position(&mut ledger, position),
                Err(LedgerError::InvalidBusiness { position, count })
            );
        }
        assert_eq!(ledger.balance(), 100.0);
    }

    #[test]
    fn only_yes_saves_on_exit() {
        assert!(confirms_save("yes"));
        assert!(confirms_save("  YES\n"));
        assert!(!confirms_save("y"));
        assert!(!confirms_save("no"));
        assert!(!confirms_save(""));
    }
}
