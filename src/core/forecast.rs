//! Demand forecasting over a monthly sales history.
//!
//! Three interchangeable estimators plus a holdout backtest. All functions
//! are pure and deterministic; callers fetch the history themselves.

use crate::errors::{Error, Result};
use std::f64::consts::PI;

/// Months per seasonal cycle.
const SEASON_PERIOD: usize = 12;
/// Two-sided 95% normal quantile, used for the confidence band.
const BAND_Z: f64 = 1.96;
/// Fraction of the history a backtest trains on.
const BACKTEST_TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastAlgorithm {
    /// Exponentially weighted moving average over a short rolling window.
    WeightedAverage,
    /// Least-squares fit on a linear trend plus annual sine and cosine terms.
    SeasonalRegression,
    /// Linear trend with the last observed cycle of residuals replayed on top.
    TrendSeasonal,
}

/// Point forecasts with a 95% band. `lower` is floored at zero because
/// demand cannot go negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub points: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error; zero actuals contribute with a
    /// denominator of 1 instead of dividing by zero.
    pub mape: f64,
}

/// Projects `horizon` future values from `history` using the chosen
/// algorithm.
///
/// # Errors
///
/// `Error::Validation` if the history is empty or the horizon is 0.
pub fn forecast(
    algorithm: ForecastAlgorithm,
    history: &[f64],
    horizon: usize,
) -> Result<Forecast> {
    if history.is_empty() {
        return Err(Error::Validation(
            "forecast history must not be empty".to_string(),
        ));
    }
    if horizon == 0 {
        return Err(Error::Validation(
            "forecast horizon must be at least 1".to_string(),
        ));
    }
    let raw = match algorithm {
        ForecastAlgorithm::WeightedAverage => weighted_average(history, horizon),
        ForecastAlgorithm::SeasonalRegression => seasonal_regression(history, horizon),
        ForecastAlgorithm::TrendSeasonal => trend_seasonal(history, horizon),
    };
    Ok(floor_lower_band(raw))
}

/// Holds out the last ~20% of the history (at least one point), forecasts
/// the held-out span from the rest, and reports the error metrics.
///
/// # Errors
///
/// `Error::Validation` if the history has fewer than two points.
pub fn backtest(algorithm: ForecastAlgorithm, history: &[f64]) -> Result<AccuracyMetrics> {
    if history.len() < 2 {
        return Err(Error::Validation(
            "backtest needs at least two history points".to_string(),
        ));
    }
    let train_len = ((history.len() as f64 * BACKTEST_TRAIN_FRACTION).floor() as usize)
        .clamp(1, history.len() - 1);
    let (train, holdout) = history.split_at(train_len);
    let predicted = forecast(algorithm, train, holdout.len())?.points;

    let n = holdout.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;
    for (actual, pred) in holdout.iter().zip(&predicted) {
        let err = actual - pred;
        abs_sum += err.abs();
        sq_sum += err * err;
        let denom = if *actual == 0.0 { 1.0 } else { actual.abs() };
        pct_sum += (err / denom).abs();
    }
    Ok(AccuracyMetrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        mape: 100.0 * pct_sum / n,
    })
}

fn floor_lower_band(mut f: Forecast) -> Forecast {
    for lower in &mut f.lower {
        if *lower < 0.0 {
            *lower = 0.0;
        }
    }
    f
}

/// Population standard deviation; a single point yields 0.
fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `count` evenly spaced values from `start` to `end`, endpoints included.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

fn weighted_average(history: &[f64], horizon: usize) -> Forecast {
    let window_len = history.len().min(3);
    let weights: Vec<f64> = linspace(-1.0, 0.0, window_len)
        .into_iter()
        .map(f64::exp)
        .collect();
    let weight_sum: f64 = weights.iter().sum();

    // Each prediction rolls into the window for the next one.
    let mut window: Vec<f64> = history[history.len() - window_len..].to_vec();
    let mut points = Vec::with_capacity(horizon);
    let mut lower = Vec::with_capacity(horizon);
    let mut upper = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let prediction = window
            .iter()
            .zip(&weights)
            .map(|(v, w)| v * w)
            .sum::<f64>()
            / weight_sum;
        let band = BAND_Z * stddev(&window);
        points.push(prediction);
        lower.push(prediction - band);
        upper.push(prediction + band);
        window.remove(0);
        window.push(prediction);
    }
    Forecast {
        points,
        lower,
        upper,
    }
}

fn seasonal_regression(history: &[f64], horizon: usize) -> Forecast {
    let n = history.len();
    let features = |t: f64| {
        let angle = 2.0 * PI * t / SEASON_PERIOD as f64;
        [1.0, t, angle.sin(), angle.cos()]
    };

    // Normal equations for the 4-parameter model.
    let mut ata = [[0.0f64; 4]; 4];
    let mut aty = [0.0f64; 4];
    for (t, y) in history.iter().enumerate() {
        let row = features(t as f64);
        for i in 0..4 {
            aty[i] += row[i] * y;
            for j in 0..4 {
                ata[i][j] += row[i] * row[j];
            }
        }
    }
    let coeffs = solve_4x4(ata, aty);

    let predict = |t: f64| {
        let row = features(t);
        row.iter().zip(&coeffs).map(|(x, c)| x * c).sum::<f64>()
    };

    let residuals: Vec<f64> = history
        .iter()
        .enumerate()
        .map(|(t, y)| y - predict(t as f64))
        .collect();
    let band = BAND_Z * stddev(&residuals);

    let points: Vec<f64> = (0..horizon).map(|i| predict((n + i) as f64)).collect();
    let lower = points.iter().map(|p| p - band).collect();
    let upper = points.iter().map(|p| p + band).collect();
    Forecast {
        points,
        lower,
        upper,
    }
}

fn trend_seasonal(history: &[f64], horizon: usize) -> Forecast {
    let n = history.len();
    let (slope, intercept) = linear_fit(history);

    let period = n.min(SEASON_PERIOD);
    // Seasonal pattern: detrended values of the last observed cycle.
    let pattern: Vec<f64> = (n - period..n)
        .map(|t| history[t] - (intercept + slope * t as f64))
        .collect();
    let band = BAND_Z * stddev(&history[n - period..]);

    let points: Vec<f64> = (0..horizon)
        .map(|i| intercept + slope * (n + i) as f64 + pattern[i % period])
        .collect();
    let lower = points.iter().map(|p| p - band).collect();
    let upper = points.iter().map(|p| p + band).collect();
    Forecast {
        points,
        lower,
        upper,
    }
}

/// Ordinary least squares on `t = 0..n`. A single point yields a flat line.
fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (t, y) in values.iter().enumerate() {
        let dt = t as f64 - t_mean;
        cov += dt * (y - y_mean);
        var += dt * dt;
    }
    if var == 0.0 {
        (0.0, y_mean)
    } else {
        (cov / var, y_mean - (cov / var) * t_mean)
    }
}

/// Gaussian elimination with partial pivoting. A tiny ridge keeps short or
/// degenerate histories solvable.
fn solve_4x4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> [f64; 4] {
    for i in 0..4 {
        a[i][i] += 1e-9;
    }
    for col in 0..4 {
        let mut pivot = col;
        for row in col + 1..4 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0f64; 4];
    for col in (0..4).rev() {
        let mut sum = b[col];
        for k in col + 1..4 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    x
}
