//! Pure domain logic: KPI aggregation and demand forecasting. No I/O here;
//! callers fetch rows through the `db` layer and pass them in.

pub mod demand;
pub mod forecast;
pub mod kpi;

pub use forecast::{AccuracyMetrics, Forecast, ForecastAlgorithm, backtest, forecast};
pub use kpi::{KpiSummary, compute_kpis};
