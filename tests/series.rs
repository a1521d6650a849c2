use anyhow::Result;
use ironseries::{Error, Labels, Sample, TimeSeries};
use std::collections::BTreeMap;

fn samples(points: &[(i64, f64)]) -> Vec<Sample> {
    points.iter().map(|&(ts, v)| Sample::new(ts, v)).collect()
}

#[test]
fn new_validates_step_bounds_and_order() {
    let labels = Labels::empty();
    assert_eq!(
        TimeSeries::new(Vec::new(), labels.clone(), 0, 10, 0, None).err(),
        Some(Error::InvalidArgument("Series step must be positive, got: 0".into()))
    );
    assert_eq!(
        TimeSeries::new(Vec::new(), labels.clone(), 10, 0, 5, None).err(),
        Some(Error::InvalidArgument("Series min timestamp (10) is after max timestamp (0)".into()))
    );
    let duplicate = samples(&[(10, 1.0), (10, 2.0)]);
    assert!(TimeSeries::new(duplicate, labels.clone(), 0, 20, 10, None).is_err());
    let descending = samples(&[(20, 1.0), (10, 2.0)]);
    assert!(TimeSeries::new(descending, labels.clone(), 0, 20, 10, None).is_err());
    assert_eq!(
        TimeSeries::new(samples(&[(0, 1.0), (30, 2.0)]), labels, 0, 20, 10, None).err(),
        Some(Error::InvalidArgument(
            "Series samples [0, 30] fall outside declared range [0, 20]".into()
        ))
    );
}

#[test]
fn from_samples_takes_bounds_from_the_data() -> Result<()> {
    let labels = Labels::from_pairs([("k", "v")]);
    let s = TimeSeries::from_samples(samples(&[(10, 1.0), (40, 2.0)]), labels, 10)?;
    assert_eq!(s.min_timestamp(), 10);
    assert_eq!(s.max_timestamp(), 40);
    assert_eq!(s.len(), 2);
    assert_eq!(s.alias(), None);

    let empty = TimeSeries::from_samples(Vec::new(), Labels::empty(), 10)?;
    assert!(empty.is_empty());
    assert_eq!((empty.min_timestamp(), empty.max_timestamp()), (0, 0));
    Ok(())
}

#[test]
fn with_alias_keeps_everything_else() -> Result<()> {
    let s = TimeSeries::from_samples(samples(&[(0, 1.0)]), Labels::from_pairs([("k", "v")]), 10)?;
    let aliased = s.clone().with_alias("cpu");
    assert_eq!(aliased.alias(), Some("cpu"));
    assert_eq!(aliased.samples(), s.samples());
    assert_eq!(aliased.labels(), s.labels());
    assert_ne!(aliased, s);
    Ok(())
}

#[test]
fn labels_constructors_agree() {
    let map: BTreeMap<String, String> = [("host", "a"), ("dc", "x")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let from_map = Labels::from_map(map);
    let from_pairs = Labels::from_pairs([("dc", "x"), ("host", "a")]);
    assert_eq!(from_map, from_pairs);
    assert_eq!(from_map.len(), 2);
    assert!(Labels::empty().is_empty());
    assert_eq!(from_map.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["dc", "host"]);
}

#[test]
fn with_returns_a_new_set() {
    let base = Labels::from_pairs([("host", "a")]);
    let added = base.with("dc", "x");
    let replaced = base.with("host", "b");

    assert_eq!(base.get("dc"), None);
    assert_eq!(base.get("host"), Some("a"));
    assert_eq!(added, Labels::from_pairs([("host", "a"), ("dc", "x")]));
    assert_eq!(replaced.get("host"), Some("b"));
    assert_eq!(replaced.len(), 1);
}

#[test]
fn labels_display_sorted_by_key() {
    assert_eq!(Labels::from_pairs([("host", "a"), ("dc", "x")]).to_string(), "{dc=x, host=a}");
    assert_eq!(Labels::empty().to_string(), "{}");
}
