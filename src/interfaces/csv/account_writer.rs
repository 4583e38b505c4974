use crate::domain::account::Account;
use crate::domain::transaction::TransferRecord;
use crate::error::Result;
use std::io::Write;

/// Writes accounts as CSV with header `account_id,balance`.
///
/// The header is written even when there are no accounts.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: impl IntoIterator<Item = Account>) -> Result<()> {
        self.writer.write_record(["account_id", "balance"])?;
        for account in accounts {
            self.writer.serialize(&account)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the transfer log as CSV with header
/// `id,source_account_id,destination_account_id,amount,created_at`.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(sink),
        }
    }

    pub fn write_transfers(
        &mut self,
        transfers: impl IntoIterator<Item = TransferRecord>,
    ) -> Result<()> {
        self.writer.write_record([
            "id",
            "source_account_id",
            "destination_account_id",
            "amount",
            "created_at",
        ])?;
        for record in transfers {
            self.writer.write_record([
                record.id.to_string(),
                record.source_account_id.to_string(),
                record.destination_account_id.to_string(),
                record.amount.to_string(),
                record.created_at.to_rfc3339(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
