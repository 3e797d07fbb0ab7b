/// CSV telemetry and JSON report export.
pub mod export;
