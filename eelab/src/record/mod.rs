//! Hand-off of calculation summaries to an external append-only log.
//!
//! The engine never reads records back. A [`CalculationSink`] receives one
//! [`CalculationRecord`] per call; [`TracingSink`] forwards them as
//! `tracing` events and `Vec<CalculationRecord>` collects them in memory.

use crate::signal::{Bandwidth, WaveShape, Waveform};
use eelab_core::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

/// Summary of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationRecord {
    /// Operation name, e.g. `signal_generator`.
    pub operation: String,
    /// Raw inputs.
    pub inputs: Value,
    /// Outputs worth keeping.
    pub outputs: Value,
    /// Soft-failure notes.
    pub warnings: Vec<String>,
}

/// Results that can be summarised for the calculation log.
pub trait Recordable {
    /// Build the log record.
    ///
    /// # Errors
    /// The result could not be serialized.
    fn to_record(&self) -> Result<CalculationRecord>;
}

/// Destination for calculation records.
pub trait CalculationSink {
    /// Append one record.
    ///
    /// # Errors
    /// The sink could not accept the record.
    fn record(&mut self, record: CalculationRecord) -> Result<()>;
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::ExecInvariantViolation {
        reason: e.to_string(),
    })
}

impl Recordable for Waveform {
    fn to_record(&self) -> Result<CalculationRecord> {
        let warnings = match self.signal_type {
            WaveShape::Unknown => vec![String::from("unknown signal type; generated silence")],
            _ => Vec::new(),
        };
        Ok(CalculationRecord {
            operation: "signal_generator".into(),
            inputs: json!({
                "signal_type": self.signal_type.as_str(),
                "frequency": self.frequency,
                "amplitude": self.amplitude,
            }),
            outputs: json!({
                "rms": self.rms,
                "peak_to_peak": self.peak_to_peak,
            }),
            warnings,
        })
    }
}

impl Recordable for Bandwidth {
    fn to_record(&self) -> Result<CalculationRecord> {
        Ok(CalculationRecord {
            operation: "bandwidth_analysis".into(),
            inputs: json!({
                "sample_rate": self.sample_rate,
                "threshold_db": self.threshold_db,
            }),
            outputs: to_json(self)?,
            warnings: Vec::new(),
        })
    }
}

/// Sink that emits each record as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl CalculationSink for TracingSink {
    fn record(&mut self, record: CalculationRecord) -> Result<()> {
        tracing::info!(
            operation = %record.operation,
            inputs = %record.inputs,
            outputs = %record.outputs,
            warnings = ?record.warnings,
            "calculation"
        );
        Ok(())
    }
}

impl CalculationSink for Vec<CalculationRecord> {
    fn record(&mut self, record: CalculationRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Summarise `result` and hand it to `sink`.
///
/// # Errors
/// Serialization or sink failure.
pub fn log_calculation<R, S>(result: &R, sink: &mut S) -> Result<()>
where
    R: Recordable + ?Sized,
    S: CalculationSink + ?Sized,
{
    sink.record(result.to_record()?)
}
