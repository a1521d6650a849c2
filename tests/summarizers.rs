use anyhow::Result;
use ironseries::summarizers::*;

fn run(function: SummaryFunction, values: &[f64]) -> f64 {
    let mut s = function.summarizer();
    for v in values {
        s.accumulate(*v);
    }
    s.finish()
}

#[test]
fn basic_summaries() {
    let v = [4.0, 1.0, 3.0, 2.0];
    assert_eq!(run(SummaryFunction::Sum, &v), 10.0);
    assert_eq!(run(SummaryFunction::Avg, &v), 2.5);
    assert_eq!(run(SummaryFunction::Min, &v), 1.0);
    assert_eq!(run(SummaryFunction::Max, &v), 4.0);
    assert_eq!(run(SummaryFunction::Last, &v), 2.0);
}

#[test]
fn stddev_is_population() {
    let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert!((run(SummaryFunction::StdDev, &v) - 2.0).abs() < 1e-9);
    assert_eq!(run(SummaryFunction::StdDev, &[42.0]), 0.0);
}

#[test]
fn percentile_interpolates_between_ranks() -> Result<()> {
    let v = [10.0, 40.0, 20.0, 30.0];
    assert_eq!(run(SummaryFunction::percentile(0.0)?, &v), 10.0);
    assert_eq!(run(SummaryFunction::percentile(100.0)?, &v), 40.0);
    assert_eq!(run(SummaryFunction::percentile(50.0)?, &v), 25.0);
    // rank 0.9 * 3 = 2.7 -> 30 + 0.7 * 10
    assert!((run(SummaryFunction::percentile(90.0)?, &v) - 37.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn percentile_ignores_input_order() -> Result<()> {
    let p = SummaryFunction::percentile(75.0)?;
    assert_eq!(run(p, &[5.0, 1.0, 3.0, 2.0, 4.0]), run(p, &[1.0, 2.0, 3.0, 4.0, 5.0]));
    Ok(())
}

#[test]
fn reset_clears_state() {
    let mut s = SummaryFunction::Avg.summarizer();
    s.accumulate(100.0);
    assert!(s.has_data());
    s.reset();
    assert!(!s.has_data());
    s.accumulate(2.0);
    assert_eq!(s.finish(), 2.0);
}

#[test]
fn empty_finish_is_nan() {
    for f in [SummaryFunction::Sum, SummaryFunction::Min, SummaryFunction::StdDev] {
        let s = f.summarizer();
        assert!(!s.has_data());
        assert!(s.finish().is_nan());
    }
}

#[test]
fn parse_names() -> Result<()> {
    assert_eq!(SummaryFunction::parse("sum")?, SummaryFunction::Sum);
    assert_eq!(SummaryFunction::parse("AVG")?, SummaryFunction::Avg);
    assert_eq!(SummaryFunction::parse("mean")?, SummaryFunction::Avg);
    assert_eq!(SummaryFunction::parse("stdev")?, SummaryFunction::StdDev);
    assert_eq!(SummaryFunction::parse("p99.5")?, SummaryFunction::percentile(99.5)?);
    assert_eq!(SummaryFunction::parse("median")?, SummaryFunction::percentile(50.0)?);
    assert_eq!(SummaryFunction::parse("p95")?.to_string(), "p95");

    assert!(SummaryFunction::parse("p101").is_err());
    assert!(SummaryFunction::parse("count").is_err());
    assert!(SummaryFunction::parse("p").is_err());
    Ok(())
}
