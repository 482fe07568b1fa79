use thiserror::Error;

#[derive(Error, Debug)]
pub enum CostFlowError {
    #[error("Invalid installment row #{row}: {details}")]
    InvalidInstallment { row: usize, details: String },

    #[error("Payment #{row} is dated before payment #{prev_row}")]
    DateOrder { row: usize, prev_row: usize },

    #[error("Installment total {total} differs from contract amount {contract} by more than {tolerance}")]
    UnbalancedSchedule {
        total: f64,
        contract: f64,
        tolerance: f64,
    },

    #[error("Schedule item {0} is already paid and cannot advance further")]
    TerminalStatus(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CostFlowError>;
