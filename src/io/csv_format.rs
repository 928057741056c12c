//! CSV format handling for command records and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CommandRecord structure for deserialization
//! - Conversion from CSV records to domain commands
//! - Balance and history report serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Balance, HistoryRecord, PointError, TransactionType, UserId};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, user, amount.
/// The amount stays a string here so that a malformed amount can be reported
/// with the row it came from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommandRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: UserId,
    pub amount: Option<String>,
}

/// A parsed command ready to be submitted to the service
///
/// The amount is any integer; the service decides whether it is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: TransactionType,
    pub user_id: UserId,
    pub amount: i64,
}

/// Convert a CommandRecord to a Command
///
/// Only checks that the row is well formed: a known type and an integer
/// amount. Zero and negative amounts pass through on purpose.
pub fn convert_csv_record(record: CommandRecord) -> Result<Command, String> {
    let kind = match record.kind.to_lowercase().as_str() {
        "charge" => TransactionType::Charge,
        "use" => TransactionType::Use,
        _ => {
            return Err(format!(
                "Invalid command type '{}' for user {}",
                record.kind, record.user
            ))
        }
    };

    let amount = match record.amount {
        Some(amount) if !amount.trim().is_empty() => {
            amount.trim().parse::<i64>().map_err(|_| {
                format!(
                    "Invalid amount '{}' for {} command of user {}",
                    amount, kind, record.user
                )
            })?
        }
        _ => {
            return Err(format!(
                "{} command for user {} requires an amount",
                kind, record.user
            ))
        }
    };

    Ok(Command {
        kind,
        user_id: record.user,
        amount,
    })
}

/// Write balances in CSV format with columns: user, amount
///
/// Balances are sorted by user ID for deterministic output.
pub fn write_balances_csv(balances: &[Balance], output: &mut dyn Write) -> Result<(), PointError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "amount"])?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|balance| balance.user_id);

    for balance in sorted {
        writer.write_record(&[balance.user_id.to_string(), balance.amount.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write history records in CSV format with columns: user, type, amount
///
/// Records are sorted by user, then by history id, which is each user's
/// insertion order. Ids and timestamps are left out so the report does not
/// depend on how different users' commands interleaved.
pub fn write_histories_csv(
    records: &[HistoryRecord],
    output: &mut dyn Write,
) -> Result<(), PointError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "type", "amount"])?;

    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| (record.user_id, record.id));

    for record in sorted {
        writer.write_record(&[
            record.user_id.to_string(),
            record.kind.to_string(),
            record.amount.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
