//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PortmixError;
use std::path::Path;

/// Port for writing backtest results.
pub trait ReportPort {
    /// Renders the result without writing it anywhere.
    fn render(&self, result: &BacktestResult) -> Result<String, PortmixError>;

    /// Writes the rendered result to `output_path`, or to stdout when `None`.
    fn write(&self, result: &BacktestResult, output_path: Option<&Path>) -> Result<(), PortmixError> {
        let rendered = self.render(result)?;
        match output_path {
            Some(path) => std::fs::write(path, rendered)?,
            None => println!("{rendered}"),
        }
        Ok(())
    }
}
