//! History normalization: raw provider bars into chart-ready payloads.
//!
//! Both transforms are total. Gaps never shorten the output, so the parallel
//! arrays in each payload always have equal length.
use crate::{Bar, IntradayChart, PeriodChart};

/// Round to two decimal places. Halves of a cent go to the even cent.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn clean_close(close: Option<f64>) -> f64 {
    match close {
        Some(c) if c.is_finite() => round_to_cents(c),
        _ => 0.0,
    }
}

fn clean_volume(volume: Option<f64>) -> i64 {
    match volume {
        Some(v) if v.is_finite() => v as i64,
        _ => 0,
    }
}

/// Daily series: `YYYY-MM-DD` dates with closes rounded to cents.
pub fn normalize_period(bars: &[Bar]) -> PeriodChart {
    let mut chart = PeriodChart {
        dates: Vec::with_capacity(bars.len()),
        prices: Vec::with_capacity(bars.len()),
    };
    for bar in bars {
        chart.dates.push(bar.timestamp.format("%Y-%m-%d").to_string());
        chart.prices.push(clean_close(bar.close));
    }
    chart
}

/// Intraday series: `HH:MM` times in the bar's own offset.
///
/// The date is dropped, so callers must pass bars from a single trading day.
pub fn normalize_intraday(bars: &[Bar]) -> IntradayChart {
    let mut chart = IntradayChart {
        timestamps: Vec::with_capacity(bars.len()),
        prices: Vec::with_capacity(bars.len()),
        volume: Vec::with_capacity(bars.len()),
    };
    for bar in bars {
        chart.timestamps.push(bar.timestamp.format("%H:%M").to_string());
        chart.prices.push(clean_close(bar.close));
        chart.volume.push(clean_volume(bar.volume));
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn bar(day: u32, hour: u32, minute: u32, close: Option<f64>, volume: Option<f64>) -> Bar {
        Bar {
            timestamp: ist().with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap(),
            close,
            volume,
        }
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(1.234), 1.23);
        assert_eq!(round_to_cents(1.236), 1.24);
        assert_eq!(round_to_cents(0.0), 0.0);
        assert_eq!(round_to_cents(-2.5051), -2.51);
    }

    #[test]
    fn test_half_cent_closes_round_to_even() {
        assert_eq!(round_to_cents(1501.125), 1501.12);
        assert_eq!(round_to_cents(1501.375), 1501.38);
        assert_eq!(round_to_cents(0.125), 0.12);

        let chart = normalize_period(&[bar(4, 9, 15, Some(1501.125), None)]);
        assert_eq!(chart.prices, vec![1501.12]);
    }

    #[test]
    fn test_period_formats_dates_and_rounds() {
        let bars = vec![
            bar(4, 9, 15, Some(1510.456), None),
            bar(5, 9, 15, Some(1498.0), None),
            bar(6, 9, 15, Some(1502.999), None),
        ];
        let chart = normalize_period(&bars);
        assert_eq!(chart.dates, vec!["2024-03-04", "2024-03-05", "2024-03-06"]);
        assert_eq!(chart.prices, vec![1510.46, 1498.0, 1503.0]);
    }

    #[test]
    fn test_period_fills_gaps_with_zero() {
        let bars = vec![
            bar(4, 9, 15, Some(10.0), None),
            bar(5, 9, 15, None, None),
            bar(6, 9, 15, Some(f64::NAN), None),
            bar(7, 9, 15, Some(11.0), None),
        ];
        let chart = normalize_period(&bars);
        assert_eq!(chart.dates.len(), chart.prices.len());
        assert_eq!(chart.prices, vec![10.0, 0.0, 0.0, 11.0]);
    }

    #[test]
    fn test_intraday_formats_local_time() {
        let bars = vec![
            bar(8, 9, 15, Some(100.004), Some(1200.0)),
            bar(8, 9, 20, Some(100.5), Some(900.0)),
        ];
        let chart = normalize_intraday(&bars);
        assert_eq!(chart.timestamps, vec!["09:15", "09:20"]);
        assert_eq!(chart.prices, vec![100.0, 100.5]);
        assert_eq!(chart.volume, vec![1200, 900]);
    }

    #[test]
    fn test_intraday_missing_values_become_zero() {
        let bars = vec![
            bar(8, 9, 15, None, None),
            bar(8, 9, 20, Some(f64::NAN), Some(f64::NAN)),
            bar(8, 9, 25, Some(101.0), Some(350.7)),
        ];
        let chart = normalize_intraday(&bars);
        assert_eq!(chart.prices, vec![0.0, 0.0, 101.0]);
        assert_eq!(chart.volume, vec![0, 0, 350]);
    }

    #[test]
    fn test_length_parity_holds() {
        for len in [0usize, 1, 7, 75] {
            let bars: Vec<Bar> = (0..len)
                .map(|i| {
                    let close = if i % 3 == 0 { None } else { Some(i as f64 * 1.111) };
                    let volume = if i % 4 == 0 { None } else { Some(i as f64) };
                    Bar {
                        timestamp: ist()
                            .with_ymd_and_hms(2024, 3, 8, 9, 15, 0)
                            .unwrap()
                            + chrono::Duration::minutes(5 * i as i64),
                        close,
                        volume,
                    }
                })
                .collect();

            let period = normalize_period(&bars);
            assert_eq!(period.dates.len(), len);
            assert_eq!(period.prices.len(), len);

            let intraday = normalize_intraday(&bars);
            assert_eq!(intraday.timestamps.len(), len);
            assert_eq!(intraday.prices.len(), len);
            assert_eq!(intraday.volume.len(), len);
        }
    }
}
