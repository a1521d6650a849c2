use anyhow::Result;
use ironseries::stage::binary::{find_matching, labels_match};
use ironseries::testing::*;
use ironseries::{
    ArithmeticOp, ArithmeticStage, BinaryProjection, Error, Labels, Sample, Stage, TimeSeries,
    UnionStage,
};

fn arith(op: ArithmeticOp, labels: &[&str], keep_nans: bool) -> Result<ArithmeticStage> {
    let labels = labels.iter().map(|s| (*s).to_string()).collect();
    Ok(ArithmeticStage::new(op, "right", labels, keep_nans)?)
}

fn host(h: &str, points: &[(i64, f64)]) -> Result<TimeSeries> {
    Ok(SeriesBuilder::new(10).label("host", h).points(points.iter().copied()).build()?)
}

#[test]
fn single_right_series_is_broadcast() -> Result<()> {
    let left = vec![host("a", &[(0, 10.0), (10, 20.0)])?, host("b", &[(0, 1.0), (10, 2.0)])?];
    let right =
        vec![SeriesBuilder::new(10).label("kind", "total").points([(0, 2.0), (10, 4.0)]).build()?];

    let out = arith(ArithmeticOp::Divide, &[], false)?.process(Some(left), Some(right))?;
    assert_eq!(out.len(), 2);
    assert_label_values(&out, "host", &["a", "b"]);
    assert_samples_eq(out[0].samples(), &[(0, 5.0), (10, 5.0)]);
    assert_samples_eq(out[1].samples(), &[(0, 0.5), (10, 0.5)]);
    Ok(())
}

#[test]
fn matching_on_label_keys() -> Result<()> {
    let left = vec![
        SeriesBuilder::new(10).label("host", "a").label("dc", "x").point(0, 5.0).build()?,
        SeriesBuilder::new(10).label("host", "b").label("dc", "y").point(0, 7.0).build()?,
        SeriesBuilder::new(10).label("host", "c").label("dc", "z").point(0, 9.0).build()?,
    ];
    let right = vec![
        SeriesBuilder::new(10).label("host", "b").point(0, 1.0).build()?,
        SeriesBuilder::new(10).label("host", "a").point(0, 2.0).build()?,
    ];

    let out = arith(ArithmeticOp::Subtract, &["host"], false)?.process(Some(left), Some(right))?;
    // host=c has no match and is dropped
    assert_label_values(&out, "host", &["a", "b"]);
    assert_samples_eq(out[0].samples(), &[(0, 3.0)]);
    assert_samples_eq(out[1].samples(), &[(0, 6.0)]);
    assert_eq!(out[0].labels().get("dc"), Some("x"));
    Ok(())
}

#[test]
fn empty_keys_require_full_label_equality() -> Result<()> {
    let left = vec![host("a", &[(0, 1.0)])?];
    let right = vec![
        SeriesBuilder::new(10).label("host", "a").label("extra", "1").point(0, 1.0).build()?,
        SeriesBuilder::new(10).label("host", "z").point(0, 1.0).build()?,
    ];
    let out = arith(ArithmeticOp::Add, &[], false)?.process(Some(left.clone()), Some(right))?;
    assert!(out.is_empty());

    let right = vec![host("a", &[(0, 4.0)])?, host("z", &[(0, 1.0)])?];
    let out = arith(ArithmeticOp::Add, &[], false)?.process(Some(left), Some(right))?;
    assert_samples_eq(out[0].samples(), &[(0, 5.0)]);
    Ok(())
}

#[test]
fn missing_key_never_matches() {
    let left = Labels::from_pairs([("host", "a")]);
    let right = Labels::from_pairs([("host", "a"), ("dc", "x")]);
    let keys = vec!["host".to_string(), "dc".to_string()];
    assert!(!labels_match(&left, &right, &keys));
    assert!(!labels_match(&right, &left, &keys));
    assert!(labels_match(&left, &right, &keys[..1]));
}

#[test]
fn find_matching_keeps_input_order() -> Result<()> {
    let right = vec![host("a", &[(0, 1.0)])?, host("b", &[(0, 2.0)])?, host("a", &[(10, 3.0)])?];
    let target = Labels::from_pairs([("host", "a")]);
    let found = find_matching(&right, &target, &["host".to_string()]);
    assert_eq!(found.len(), 2);
    assert_samples_eq(found[0].samples(), &[(0, 1.0)]);
    assert_samples_eq(found[1].samples(), &[(10, 3.0)]);
    Ok(())
}

#[test]
fn several_matches_are_summed_before_combining() -> Result<()> {
    let left =
        vec![SeriesBuilder::new(10).label("dc", "x").points([(0, 100.0), (10, 100.0)]).build()?];
    let right = vec![
        SeriesBuilder::new(10)
            .label("dc", "x")
            .label("host", "a")
            .points([(0, 1.0), (10, 2.0)])
            .build()?,
        SeriesBuilder::new(10).label("dc", "x").label("host", "b").points([(0, 3.0)]).build()?,
        SeriesBuilder::new(10).label("dc", "y").points([(0, 1000.0)]).build()?,
    ];

    let out = arith(ArithmeticOp::Subtract, &["dc"], false)?.process(Some(left), Some(right))?;
    assert_eq!(out.len(), 1);
    assert_samples_eq(out[0].samples(), &[(0, 96.0), (10, 98.0)]);
    Ok(())
}

#[test]
fn unmatched_timestamps_dropped_or_nan() -> Result<()> {
    let left = vec![host("a", &[(0, 1.0), (10, 2.0), (30, 3.0)])?];
    let right = vec![host("a", &[(10, 5.0), (20, 6.0), (30, 7.0)])?];

    let multiply = arith(ArithmeticOp::Multiply, &[], false)?;
    let dropped = multiply.process(Some(left.clone()), Some(right.clone()))?;
    assert_samples_eq(dropped[0].samples(), &[(10, 10.0), (30, 21.0)]);

    let kept = arith(ArithmeticOp::Multiply, &[], true)?.process(Some(left), Some(right))?;
    assert_samples_eq(kept[0].samples(), &[(0, f64::NAN), (10, 10.0), (20, f64::NAN), (30, 21.0)]);
    Ok(())
}

#[test]
fn aligned_timestamps_are_symmetric() -> Result<()> {
    let a = host("a", &[(0, 1.0), (20, 2.0), (40, 3.0), (50, 4.0)])?;
    let b = host("a", &[(10, 1.0), (20, 1.0), (50, 1.0)])?;
    let stage = arith(ArithmeticOp::Add, &[], false)?;

    let ab = stage.align_and_process(&a, &b).ok_or_else(|| anyhow::anyhow!("expected output"))?;
    let ba = stage.align_and_process(&b, &a).ok_or_else(|| anyhow::anyhow!("expected output"))?;
    assert_timestamps(&ab, &[20, 50]);
    assert_timestamps(&ba, &[20, 50]);
    Ok(())
}

#[test]
fn output_bounds_cover_both_inputs() -> Result<()> {
    let left =
        SeriesBuilder::new(10).label("host", "a").points([(20, 1.0)]).bounds(10, 40).build()?;
    let right =
        SeriesBuilder::new(10).label("host", "a").points([(20, 1.0)]).bounds(0, 30).build()?;
    let out = arith(ArithmeticOp::Add, &[], false)?
        .align_and_process(&left, &right)
        .ok_or_else(|| anyhow::anyhow!("expected output"))?;
    assert_eq!(out.min_timestamp(), 0);
    assert_eq!(out.max_timestamp(), 40);
    assert_eq!(out.step(), 10);
    Ok(())
}

#[test]
fn disjoint_series_produce_nothing() -> Result<()> {
    let left = vec![host("a", &[(0, 1.0)])?];
    let right = vec![host("a", &[(10, 1.0)])?];
    let out = arith(ArithmeticOp::Add, &[], false)?.process(Some(left), Some(right))?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn divide_by_zero_is_nan() -> Result<()> {
    let left = vec![host("a", &[(0, 1.0), (10, 0.0)])?];
    let right = vec![host("a", &[(0, 0.0), (10, 0.0)])?];
    let out = arith(ArithmeticOp::Divide, &[], false)?.process(Some(left), Some(right))?;
    assert_samples_eq(out[0].samples(), &[(0, f64::NAN), (10, f64::NAN)]);
    Ok(())
}

#[test]
fn absent_operand_is_an_error_but_empty_is_not() -> Result<()> {
    let stage = arith(ArithmeticOp::Add, &[], false)?;
    let some = vec![host("a", &[(0, 1.0)])?];

    let err = stage.process(None, Some(some.clone())).err();
    assert_eq!(err, Some(Error::NullInput("arithmetic stage received null left input".into())));
    let err = stage.process(Some(some.clone()), None).err();
    assert_eq!(err, Some(Error::NullInput("arithmetic stage received null right input".into())));

    assert!(stage.process(Some(Vec::new()), Some(some.clone()))?.is_empty());
    assert!(stage.process(Some(some), Some(Vec::new()))?.is_empty());
    Ok(())
}

#[test]
fn binary_stage_rejects_unary_processing() -> Result<()> {
    let stage: Stage = arith(ArithmeticOp::Add, &[], false)?.into();
    let err = stage.process(vec![named_series("a")?]).err();
    assert_eq!(
        err,
        Some(Error::Unsupported("Binary pipeline stage 'arithmetic' requires two inputs".into()))
    );
    assert!(stage.is_coordinator_only());
    assert_eq!(stage.right_op_reference(), Some("right"));
    Ok(())
}

#[test]
fn union_concatenates_with_duplicates() -> Result<()> {
    let stage = UnionStage::new("other")?;
    let left = vec![named_series("a")?, named_series("b")?];
    let right = vec![named_series("b")?, named_series("c")?];

    let out = stage.process(Some(left), Some(right))?;
    assert_label_values(&out, "name", &["a", "b", "b", "c"]);

    assert!(matches!(stage.process(None, Some(Vec::new())), Err(Error::NullInput(_))));
    Ok(())
}

#[test]
fn operator_names() -> Result<()> {
    assert_eq!(ArithmeticOp::parse("+")?, ArithmeticOp::Add);
    assert_eq!(ArithmeticOp::parse("diff")?, ArithmeticOp::Subtract);
    assert_eq!(ArithmeticOp::parse("Multiply")?, ArithmeticOp::Multiply);
    assert_eq!(ArithmeticOp::parse("/")?, ArithmeticOp::Divide);
    assert!(ArithmeticOp::parse("modulo").is_err());
    assert_eq!(ArithmeticOp::Divide.to_string(), "divide");
    Ok(())
}

/// Ratio of left to right that tags its output.
struct Ratio {
    keys: Vec<String>,
}

impl BinaryProjection for Ratio {
    fn name(&self) -> &'static str {
        "ratio"
    }

    fn label_keys(&self) -> &[String] {
        &self.keys
    }

    fn keep_nans(&self) -> bool {
        false
    }

    fn process_samples(&self, left: Option<&Sample>, right: Option<&Sample>) -> Option<Sample> {
        let (l, r) = (left?, right?);
        Some(Sample::new(l.timestamp, l.value / r.value))
    }

    fn merge_matching_series(&self, matches: Vec<&TimeSeries>) -> Option<TimeSeries> {
        matches.first().map(|s| (*s).clone())
    }

    fn transform_labels(&self, labels: &Labels) -> Labels {
        labels.with("op", "ratio")
    }
}

#[test]
fn projections_can_rewrite_output_labels() -> Result<()> {
    let ratio = Ratio { keys: vec!["host".into()] };
    let left = vec![host("a", &[(0, 6.0)])?, host("b", &[(0, 8.0)])?];
    let right = vec![host("b", &[(0, 2.0)])?, host("a", &[(0, 3.0)])?];

    let out = ratio.process(Some(left.clone()), Some(right))?;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].labels(), &Labels::from_pairs([("host", "a"), ("op", "ratio")]));
    assert_samples_eq(out[0].samples(), &[(0, 2.0)]);
    assert_samples_eq(out[1].samples(), &[(0, 4.0)]);
    assert_eq!(left[0].labels().get("op"), None);

    // built-in arithmetic keeps labels untouched
    let plain = arith(ArithmeticOp::Divide, &["host"], false)?;
    let right = vec![host("a", &[(0, 3.0)])?, host("b", &[(0, 2.0)])?];
    let out = plain.process(Some(left), Some(right))?;
    assert_eq!(out[0].labels(), &Labels::from_pairs([("host", "a")]));
    Ok(())
}
