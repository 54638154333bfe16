//! Backtest request validation, run by callers before the engine.

use crate::domain::backtest::BacktestRequest;
use crate::domain::error::PortmixError;
use crate::ports::data_port::DataPort;

/// Largest accepted distance between the weight sum and 100.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.1;

pub fn validate_request(
    request: &BacktestRequest,
    data_port: &dyn DataPort,
) -> Result<(), PortmixError> {
    validate_mix_present(request)?;
    validate_weight_range(request)?;
    validate_weight_sum(request)?;
    validate_date_range(request)?;
    validate_benchmark(request, data_port)?;
    Ok(())
}

fn validate_mix_present(request: &BacktestRequest) -> Result<(), PortmixError> {
    if request.portfolio_mix.is_empty() {
        return Err(PortmixError::invalid_request("No portfolios selected"));
    }
    Ok(())
}

fn validate_weight_range(request: &BacktestRequest) -> Result<(), PortmixError> {
    for entry in &request.portfolio_mix {
        if !(0.0..=100.0).contains(&entry.weight) {
            return Err(PortmixError::invalid_request(format!(
                "Weight for portfolio {} must be between 0 and 100, got {}",
                entry.portfolio_id,
                percent_text(entry.weight)
            )));
        }
    }
    Ok(())
}

fn validate_weight_sum(request: &BacktestRequest) -> Result<(), PortmixError> {
    let total = request.total_weight();
    if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(PortmixError::invalid_request(format!(
            "Portfolio weights must sum to 100%, got {}%",
            percent_text(total)
        )));
    }
    Ok(())
}

fn validate_date_range(request: &BacktestRequest) -> Result<(), PortmixError> {
    if request.start_date > request.end_date {
        return Err(PortmixError::invalid_request(format!(
            "start_date {} is after end_date {}",
            request.start_date, request.end_date
        )));
    }
    Ok(())
}

fn validate_benchmark(
    request: &BacktestRequest,
    data_port: &dyn DataPort,
) -> Result<(), PortmixError> {
    match data_port.get_benchmark(request.benchmark_id)? {
        Some(_) => Ok(()),
        None => Err(PortmixError::invalid_request("Invalid benchmark selected")),
    }
}

/// Whole numbers keep one decimal place: `90.0`, `99.5`.
fn percent_text(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
