//! JSON report adapter implementing ReportPort.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PortmixError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl ReportPort for JsonReportAdapter {
    fn render(&self, result: &BacktestResult) -> Result<String, PortmixError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        Ok(rendered)
    }
}
