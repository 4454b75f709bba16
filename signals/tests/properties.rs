use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use market::{PriceBar, PriceSeries};
use signals::{
    Divergence, DivergenceDetector, DivergenceParams, OscillatorSeries, PriceSource,
    RsiCalculator, RsiParams, Smoothing,
};

fn series_from_prices(prices: &[f64]) -> PriceSeries {
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PriceBar {
            time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3_600, 0).unwrap(),
            open: p,
            high: p,
            low: p,
            close: p,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

fn series_from_ohlc(bars: &[(f64, f64, f64, f64)]) -> PriceSeries {
    let bars = bars
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar {
            time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3_600, 0).unwrap(),
            open,
            high,
            low,
            close,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

fn smoothing() -> impl Strategy<Value = Smoothing> {
    prop_oneof![Just(Smoothing::Wilder), Just(Smoothing::Simple)]
}

fn source() -> impl Strategy<Value = PriceSource> {
    prop_oneof![Just(PriceSource::Ohlc4), Just(PriceSource::Close)]
}

fn ohlc_bar() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.5f64..2_000.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..1.0).prop_map(|(mid, up, down, t)| {
        let high = mid + up;
        let low = (mid - down).max(0.0);
        let open = low + (high - low) * t;
        (open, high, low, mid.clamp(low, high))
    })
}

proptest! {
    #[test]
    fn defined_values_stay_in_range(
        bars in prop::collection::vec(ohlc_bar(), 1..150),
        period in 1usize..30,
        smoothing in smoothing(),
        source in source(),
    ) {
        let series = series_from_ohlc(&bars);
        let calc = RsiCalculator::new(RsiParams { period, source, smoothing });

        if let Some(reading) = calc.compute(&series) {
            prop_assert_eq!(reading.series.len(), series.len());
            prop_assert!((0.0..=100.0).contains(&reading.current));
            for v in reading.series.defined() {
                prop_assert!((0.0..=100.0).contains(&v), "value {} out of range", v);
            }
        }
    }

    #[test]
    fn short_series_never_warm_up(
        period in 1usize..40,
        prices in prop::collection::vec(1.0f64..500.0, 1..40),
        smoothing in smoothing(),
    ) {
        prop_assume!(prices.len() < period + 1);
        let calc = RsiCalculator::new(RsiParams { period, smoothing, ..RsiParams::default() });

        prop_assert!(calc.compute(&series_from_prices(&prices)).is_none());
    }

    #[test]
    fn long_enough_series_always_warm_up(
        period in 1usize..30,
        extra in 0usize..50,
        start in 1.0f64..1_000.0,
        smoothing in smoothing(),
    ) {
        let prices: Vec<f64> = (0..period + 1 + extra).map(|i| start + (i % 7) as f64).collect();
        let calc = RsiCalculator::new(RsiParams { period, smoothing, ..RsiParams::default() });

        let reading = calc.compute(&series_from_prices(&prices));
        prop_assert!(reading.is_some());
        let reading = reading.unwrap();
        prop_assert!(reading.series.values()[..period].iter().all(Option::is_none));
        prop_assert!(reading.series.values()[period..].iter().all(Option::is_some));
    }

    #[test]
    fn strictly_rising_prices_saturate_high(
        start in 1.0f64..1_000.0,
        steps in prop::collection::vec(0.01f64..10.0, 11..100),
        smoothing in smoothing(),
    ) {
        let prices: Vec<f64> = steps
            .iter()
            .scan(start, |p, s| { *p += s; Some(*p) })
            .collect();
        let calc = RsiCalculator::new(RsiParams { period: 10, smoothing, ..RsiParams::default() });

        let reading = calc.compute(&series_from_prices(&prices)).unwrap();
        prop_assert_eq!(reading.current, 100.0);
    }

    #[test]
    fn strictly_falling_prices_saturate_low(
        steps in prop::collection::vec(0.01f64..10.0, 11..100),
        smoothing in smoothing(),
    ) {
        let prices: Vec<f64> = steps
            .iter()
            .scan(5_000.0, |p, s| { *p -= s; Some(*p) })
            .collect();
        let calc = RsiCalculator::new(RsiParams { period: 10, smoothing, ..RsiParams::default() });

        let reading = calc.compute(&series_from_prices(&prices)).unwrap();
        prop_assert_eq!(reading.current, 0.0);
    }

    #[test]
    fn lookback_guard_holds_for_any_oscillator(
        prices in prop::collection::vec(1.0f64..500.0, 1..30),
        osc in prop::collection::vec(0.0f64..100.0, 30),
    ) {
        let series = series_from_prices(&prices);
        let osc = OscillatorSeries::from(osc[..prices.len()].to_vec());
        let detector = DivergenceDetector::new(DivergenceParams { lookback: 30, peak_distance: 3 });

        prop_assert_eq!(detector.detect(&series, Some(&osc)), Divergence::None);
    }

    #[test]
    fn detection_is_deterministic(
        bars in prop::collection::vec(ohlc_bar(), 30..80),
        osc in prop::collection::vec(0.0f64..100.0, 80),
        distance in 1usize..6,
    ) {
        let series = series_from_ohlc(&bars);
        let osc = OscillatorSeries::from(osc[..bars.len()].to_vec());
        let detector = DivergenceDetector::new(DivergenceParams { lookback: 30, peak_distance: distance });

        let first = detector.detect(&series, Some(&osc));
        for _ in 0..3 {
            prop_assert_eq!(detector.detect(&series, Some(&osc)), first);
        }
    }
}

#[test]
fn fifteen_rising_closes_read_100_without_divergence() {
    let prices: Vec<f64> = (100..115).map(f64::from).collect();
    let series = series_from_prices(&prices);

    let reading = RsiCalculator::new(RsiParams {
        period: 10,
        source: PriceSource::Close,
        smoothing: Smoothing::Wilder,
    })
    .compute(&series)
    .unwrap();

    assert!((reading.current - 100.0).abs() < 1e-9);

    let detector = DivergenceDetector::new(DivergenceParams {
        lookback: 15,
        peak_distance: 3,
    });
    assert_eq!(
        detector.detect(&series, Some(&reading.series)),
        Divergence::None
    );
    assert!(signals::peaks::find_peaks(&series.highs(), 3).len() < 2);
}

#[test]
fn rising_highs_with_fading_momentum_read_bearish() {
    let bars: Vec<_> = (0..30)
        .map(|i| match i {
            5 => (100.0, 110.0, 99.0, 100.0),
            25 => (100.0, 115.0, 99.0, 100.0),
            _ => (100.0, 101.0, 99.0, 100.0),
        })
        .collect();
    let mut osc = vec![50.0; 30];
    osc[5] = 70.0;
    osc[25] = 60.0;

    let detector = DivergenceDetector::new(DivergenceParams::default());
    assert_eq!(
        detector.detect(&series_from_ohlc(&bars), Some(&OscillatorSeries::from(osc))),
        Divergence::Bearish
    );
}

#[test]
fn falling_lows_with_rising_momentum_read_bullish() {
    let bars: Vec<_> = (0..30)
        .map(|i| match i {
            5 => (100.0, 101.0, 90.0, 100.0),
            25 => (100.0, 101.0, 85.0, 100.0),
            _ => (100.0, 101.0, 99.0, 100.0),
        })
        .collect();
    let mut osc = vec![50.0; 30];
    osc[5] = 25.0;
    osc[25] = 35.0;

    let detector = DivergenceDetector::new(DivergenceParams::default());
    assert_eq!(
        detector.detect(&series_from_ohlc(&bars), Some(&OscillatorSeries::from(osc))),
        Divergence::Bullish
    );
}

#[test]
fn missing_series_produces_no_reading_and_no_divergence() {
    let series: Option<PriceSeries> = None;
    let calc = RsiCalculator::default();

    let reading = series.as_ref().and_then(|s| calc.compute(s));
    assert!(reading.is_none());

    let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i % 4) as f64).collect();
    let detector = DivergenceDetector::default();
    assert_eq!(
        detector.detect(&series_from_prices(&prices), None),
        Divergence::None
    );
}

#[test]
fn zero_average_loss_reads_exactly_100() {
    // Losses only in the first bar, then a flat run long enough for the
    // simple window to contain no losses at all.
    let mut prices = vec![105.0, 100.0];
    prices.extend(std::iter::repeat_n(100.0, 12));

    let reading = RsiCalculator::new(RsiParams {
        period: 10,
        source: PriceSource::Close,
        smoothing: Smoothing::Simple,
    })
    .compute(&series_from_prices(&prices))
    .unwrap();

    assert_eq!(reading.current, 100.0);
}
