//! Error types for the point engine
//!
//! This module defines all error types that can occur while serving balance
//! operations or replaying a command file.
//!
//! # Error Categories
//!
//! - **Rejections**: invalid amount, insufficient balance, overflow. The
//!   request was refused and nothing changed.
//! - **Unit of work failures**: store errors and aborted units of work,
//!   surfaced unchanged to the caller.
//! - **File I/O and CSV errors**: only produced by the replay driver.

use super::history::UserId;
use thiserror::Error;

/// Main error type for the point engine
///
/// Calling layers match on the variant to choose an outcome; see
/// [`PointError::is_rejection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// Amount is zero or negative
    ///
    /// Raised before any store access or queueing.
    #[error("Invalid amount {amount}: must be a positive integer")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// A use requested more points than the user holds
    ///
    /// Raised after the balance read, before any write.
    #[error(
        "Insufficient balance for user {user_id}: balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        user_id: UserId,
        balance: u64,
        requested: u64,
    },

    /// The new balance would not fit in the balance type
    #[error("Arithmetic overflow in {operation} for user {user_id}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        user_id: UserId,
    },

    /// A balance or history store failed
    #[error("Store failure: {message}")]
    Store {
        /// Description of the store failure
        message: String,
    },

    /// A unit of work never produced a result
    ///
    /// Either it panicked or its queue worker went away.
    #[error("Unit of work for user {user_id} aborted: {reason}")]
    WorkAborted { user_id: UserId, reason: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing or writing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

// Conversion from io::Error to PointError
impl From<std::io::Error> for PointError {
    fn from(error: std::io::Error) -> Self {
        PointError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to PointError
impl From<csv::Error> for PointError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PointError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl PointError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: i64) -> Self {
        PointError::InvalidAmount { amount }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user_id: UserId, balance: u64, requested: u64) -> Self {
        PointError::InsufficientBalance {
            user_id,
            balance,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user_id: UserId) -> Self {
        PointError::ArithmeticOverflow {
            operation: operation.to_string(),
            user_id,
        }
    }

    /// Create a Store error
    pub fn store(message: impl Into<String>) -> Self {
        PointError::Store {
            message: message.into(),
        }
    }

    /// Create a WorkAborted error
    pub fn work_aborted(user_id: UserId, reason: &str) -> Self {
        PointError::WorkAborted {
            user_id,
            reason: reason.to_string(),
        }
    }

    /// Whether the request was refused by a domain rule
    ///
    /// Rejections leave balance and history untouched and map to a client
    /// error at the transport layer. Everything else is an unexpected failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PointError::InvalidAmount { .. }
                | PointError::InsufficientBalance { .. }
                | PointError::ArithmeticOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(
        PointError::InvalidAmount { amount: -5 },
        "Invalid amount -5: must be a positive integer"
    )]
    #[case::insufficient_balance(
        PointError::InsufficientBalance { user_id: 1, balance: 7000, requested: 99999 },
        "Insufficient balance for user 1: balance 7000, requested 99999"
    )]
    #[case::arithmetic_overflow(
        PointError::ArithmeticOverflow { operation: "charge".to_string(), user_id: 3 },
        "Arithmetic overflow in charge for user 3"
    )]
    #[case::store(
        PointError::Store { message: "history unavailable".to_string() },
        "Store failure: history unavailable"
    )]
    #[case::work_aborted(
        PointError::WorkAborted { user_id: 9, reason: "unit of work panicked".to_string() },
        "Unit of work for user 9 aborted: unit of work panicked"
    )]
    #[case::io_error(
        PointError::IoError { message: "Permission denied".to_string() },
        "I/O error: Permission denied"
    )]
    #[case::parse_error_with_line(
        PointError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        PointError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    fn test_error_display(#[case] error: PointError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_amount(PointError::invalid_amount(0), PointError::InvalidAmount { amount: 0 })]
    #[case::insufficient_balance(
        PointError::insufficient_balance(1, 400, 500),
        PointError::InsufficientBalance { user_id: 1, balance: 400, requested: 500 }
    )]
    #[case::arithmetic_overflow(
        PointError::arithmetic_overflow("charge", 2),
        PointError::ArithmeticOverflow { operation: "charge".to_string(), user_id: 2 }
    )]
    #[case::store(
        PointError::store("down"),
        PointError::Store { message: "down".to_string() }
    )]
    #[case::work_aborted(
        PointError::work_aborted(4, "worker gone"),
        PointError::WorkAborted { user_id: 4, reason: "worker gone".to_string() }
    )]
    fn test_helper_functions(#[case] result: PointError, #[case] expected: PointError) {
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case::invalid_amount(PointError::invalid_amount(-1), true)]
    #[case::insufficient_balance(PointError::insufficient_balance(1, 0, 1), true)]
    #[case::overflow(PointError::arithmetic_overflow("charge", 1), true)]
    #[case::store(PointError::store("down"), false)]
    #[case::aborted(PointError::work_aborted(1, "panicked"), false)]
    fn test_is_rejection(#[case] error: PointError, #[case] expected: bool) {
        assert_eq!(error.is_rejection(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: PointError = io_error.into();
        assert!(matches!(error, PointError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }

    #[test]
    fn test_csv_error_conversion_keeps_line() {
        let mut reader = csv::Reader::from_reader("user,amount\n1,ten\n".as_bytes());
        let csv_error = reader
            .deserialize::<(u64, u64)>()
            .next()
            .unwrap()
            .unwrap_err();

        let error: PointError = csv_error.into();

        match &error {
            PointError::ParseError { line, message } => {
                assert_eq!(*line, Some(2));
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().starts_with("CSV parse error at line 2: "));
    }
}
