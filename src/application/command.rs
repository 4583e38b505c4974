use crate::application::context::AppContext;
use crate::error::Result;
use std::fmt;

/// A request entering the core, already split into fields by the interface layer.
///
/// Ids and amounts are still raw here; the services validate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateAccount {
        account_id: i64,
        initial_balance: String,
    },
    Transfer {
        source_id: i64,
        destination_id: i64,
        amount: String,
    },
}

impl Command {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        match self {
            Command::CreateAccount {
                account_id,
                initial_balance,
            } => {
                ctx.accounts
                    .create_account(account_id, &initial_balance)
                    .await?;
            }
            Command::Transfer {
                source_id,
                destination_id,
                amount,
            } => {
                ctx.transactions
                    .submit_transfer(source_id, destination_id, &amount)
                    .await?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateAccount {
                account_id,
                initial_balance,
            } => write!(f, "create {account_id} {initial_balance}"),
            Command::Transfer {
                source_id,
                destination_id,
                amount,
            } => write!(f, "transfer {source_id}->{destination_id} {amount}"),
        }
    }
}
