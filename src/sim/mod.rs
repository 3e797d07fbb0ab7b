/// Virtual-time scheduler for one-shot and repeating timers.
pub mod clock;
pub mod controller;
pub mod engine;
/// Grid state machine, drain and consumer servicing.
pub mod grid;
pub mod kpi;
pub mod ledger;
pub mod notify;
/// Storm, calm, drought and flood obstacles.
pub mod obstacle;
pub mod types;
