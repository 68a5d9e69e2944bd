//! Configuration validation
//!
//! Rules:
//! - at least one sink
//! - every sink name maps to a known destination
//! - source path non-empty
//! - queue capacity >= 1
//! - rate_limit >= 1, burst >= 1, failure_rate finite and within [0, 1]

use contracts::{ContractError, Encoding, FanoutConfig};
use validator::Validate;

/// Validate a parsed configuration.
///
/// Returns the first error encountered.
pub fn validate(config: &FanoutConfig) -> Result<(), ContractError> {
    validate_source(config)?;
    validate_queue(config)?;
    validate_sinks(config)?;
    Ok(())
}

fn validate_source(config: &FanoutConfig) -> Result<(), ContractError> {
    config
        .source
        .validate()
        .map_err(|e| ContractError::config_validation("source.path", e.to_string()))
}

fn validate_queue(config: &FanoutConfig) -> Result<(), ContractError> {
    config
        .queue
        .validate()
        .map_err(|e| ContractError::config_validation("queue.capacity", e.to_string()))
}

fn validate_sinks(config: &FanoutConfig) -> Result<(), ContractError> {
    if config.sinks.is_empty() {
        return Err(ContractError::config_validation(
            "sinks",
            "at least one sink must be configured",
        ));
    }

    for (name, settings) in &config.sinks {
        // Unknown names must fail here, not during dispatch
        Encoding::for_destination(name)?;

        // NaN slips through range checks
        if settings.failure_rate.is_some_and(|rate| !rate.is_finite()) {
            return Err(ContractError::config_validation(
                format!("sinks.{name}.failure_rate"),
                "failure_rate must be a finite number",
            ));
        }

        settings
            .validate()
            .map_err(|e| ContractError::config_validation(format!("sinks.{name}"), e.to_string()))?;
    }
    Ok(())
}
