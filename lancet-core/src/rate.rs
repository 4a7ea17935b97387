use crate::{StatsError, ThroughputReport, MICROS_PER_SEC};

impl ThroughputReport {
    /// Completed requests per second over the measurement window.
    pub fn requests_per_sec(&self) -> Result<f64, StatsError> {
        self.per_sec(self.req_count)
    }

    /// Received bytes per second.
    pub fn rx_bandwidth(&self) -> Result<f64, StatsError> {
        self.per_sec(self.rx_bytes)
    }

    /// Transmitted bytes per second.
    pub fn tx_bandwidth(&self) -> Result<f64, StatsError> {
        self.per_sec(self.tx_bytes)
    }

    fn per_sec(&self, value: u64) -> Result<f64, StatsError> {
        match self.duration_micros() {
            0 => Err(StatsError::ZeroDuration),
            micros => Ok(MICROS_PER_SEC * value as f64 / micros as f64),
        }
    }
}
