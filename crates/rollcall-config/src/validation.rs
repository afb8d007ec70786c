//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid cutover month {0}: must be 1-12")]
    InvalidCutoverMonth(u32),

    #[error("Invalid transfer credit {0}: must not be negative")]
    NegativeTransferCredit(i32),

    #[error("Matric code '{code}': {message}")]
    InvalidMatricCode { code: String, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(month) = config.calendar.cutover_month {
        if !(1..=12).contains(&month) {
            errors.push(ValidationError::InvalidCutoverMonth(month));
        }
    }

    if let Some(credit) = config.calendar.transfer_credit_years {
        if credit < 0 {
            errors.push(ValidationError::NegativeTransferCredit(credit));
        }
    }

    for (code, name) in &config.matric.codes {
        if code.is_empty() {
            errors.push(ValidationError::InvalidMatricCode {
                code: code.clone(),
                message: "code cannot be empty".into(),
            });
        }
        if name.trim().is_empty() {
            errors.push(ValidationError::InvalidMatricCode {
                code: code.clone(),
                message: "department name cannot be empty".into(),
            });
        }
    }

    errors
}
