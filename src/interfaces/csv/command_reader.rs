use crate::application::command::Command;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Transfer,
}

/// One row of a command file: `type, account, destination, amount`.
///
/// For `create` rows `account` is the new id and `amount` the initial balance; for
/// `transfer` rows `account` is the source.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub account: i64,
    pub destination: Option<i64>,
    pub amount: Option<String>,
}

impl TryFrom<CommandRecord> for Command {
    type Error = LedgerError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let amount = record.amount.unwrap_or_default();
        match record.r#type {
            CommandType::Create => Ok(Command::CreateAccount {
                account_id: record.account,
                initial_balance: amount,
            }),
            CommandType::Transfer => {
                let destination_id = record.destination.ok_or_else(|| {
                    LedgerError::Validation("transfer requires a destination account".to_string())
                })?;
                Ok(Command::Transfer {
                    source_id: record.account,
                    destination_id,
                    amount,
                })
            }
        }
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and converts commands, so large files are
    /// streamed rather than loaded.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(Command::try_from))
    }
}
