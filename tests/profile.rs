#![cfg(feature = "profiling")]

use ironseries::profile::*;
use serde_json::{Map, Value, json};

fn debug(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

fn unfold(description: &str, nanos: u64, info: Value) -> ProfileResult {
    ProfileResult {
        query_name: UNFOLD_AGGREGATION_TYPE.to_string(),
        description: description.to_string(),
        time_nanos: nanos,
        debug: debug(info),
    }
}

#[test]
fn totals_sum_every_counted_aggregation() {
    let shards = vec![
        ProfileShardResult {
            shard_id: "0".into(),
            aggregations: vec![
                unfold(
                    "cpu",
                    100,
                    json!({"stages": "head", "total_chunks": 3, "total_samples": 40}),
                ),
                unfold("mem", 50, json!({"total_chunks": 1, "live_doc_count": 2})),
            ],
        },
        ProfileShardResult {
            shard_id: "1".into(),
            aggregations: vec![unfold(
                "cpu",
                25,
                json!({"total_chunks": 2, "closed_sample_count": 9}),
            )],
        },
    ];

    let report = ProfileReport::from_shards(&shards);
    assert_eq!(report.shards.len(), 2);
    assert_eq!(report.totals.get(TOTAL_CHUNKS), 6);
    assert_eq!(report.totals.get(TOTAL_SAMPLES), 40);
    assert_eq!(report.totals.get(LIVE_DOC_COUNT), 2);
    assert_eq!(report.totals.get(CLOSED_SAMPLE_COUNT), 9);
    assert_eq!(report.totals.total_time_nanos, 175);
    assert_eq!(report.totals.stages, None);
}

#[test]
fn other_query_types_and_empty_debug_are_skipped() {
    let shards = vec![
        ProfileShardResult {
            shard_id: "0".into(),
            aggregations: vec![ProfileResult {
                query_name: "terms".into(),
                description: "x".into(),
                time_nanos: 1,
                debug: debug(json!({"total_chunks": 100})),
            }],
        },
        ProfileShardResult {
            shard_id: "1".into(),
            aggregations: vec![unfold("cpu", 1, json!({}))],
        },
        ProfileShardResult {
            shard_id: "2".into(),
            aggregations: vec![unfold("cpu", 1, json!({"total_chunks": 1}))],
        },
    ];

    let report = ProfileReport::from_shards(&shards);
    assert_eq!(report.shards.len(), 1);
    assert_eq!(report.shards[0].shard_id, "2");
    assert_eq!(report.totals.get(TOTAL_CHUNKS), 1);
}

#[test]
fn non_numeric_counters_count_as_zero() {
    let shards = vec![ProfileShardResult {
        shard_id: "0".into(),
        aggregations: vec![unfold(
            "cpu",
            1,
            json!({"total_chunks": "many", "total_samples": 2.9, "live_chunk_count": null}),
        )],
    }];
    let report = ProfileReport::from_shards(&shards);
    assert_eq!(report.totals.get(TOTAL_CHUNKS), 0);
    assert_eq!(report.totals.get(TOTAL_SAMPLES), 2);
    assert_eq!(report.totals.get(LIVE_CHUNK_COUNT), 0);
    assert_eq!(report.totals.get("not_a_counter"), 0);
}

#[test]
fn missing_or_blank_stages_fall_back() {
    let shards = vec![ProfileShardResult {
        shard_id: "0".into(),
        aggregations: vec![
            unfold("a", 1, json!({"total_chunks": 1})),
            unfold("b", 1, json!({"stages": ""})),
            unfold("c", 1, json!({"stages": 5})),
            unfold("d", 1, json!({"stages": "summarize,head"})),
        ],
    }];
    let report = ProfileReport::from_shards(&shards);
    let stages: Vec<Option<&str>> =
        report.shards[0].aggregations.iter().map(|a| a.stages.as_deref()).collect();
    assert_eq!(
        stages,
        vec![
            Some(DEFAULT_STAGES),
            Some(DEFAULT_STAGES),
            Some(DEFAULT_STAGES),
            Some("summarize,head"),
        ]
    );
}

#[test]
fn json_shape() {
    let shards = vec![ProfileShardResult {
        shard_id: "7".into(),
        aggregations: vec![unfold("cpu", 1, json!({"stages": "head", "total_chunks": 3}))],
    }];
    let rendered = ProfileReport::from_shards(&shards).to_json();

    let totals = &rendered["profile"]["totals"]["debug_info"];
    assert_eq!(totals[TOTAL_CHUNKS], json!(3));
    assert_eq!(totals[CLOSED_DOC_COUNT], json!(0));
    assert!(totals.get(STAGES).is_none());

    let shard = &rendered["profile"]["shards"][0];
    assert_eq!(shard["shard_id"], json!("7"));
    assert_eq!(shard["aggregations"][0]["debug_info"][STAGES], json!("head"));
}

#[test]
fn empty_report_renders_empty_profile() {
    let report = ProfileReport::from_shards(&[]);
    assert!(report.is_empty());
    assert_eq!(report.to_json(), json!({"profile": {}}));
}

#[test]
fn totals_saturate_instead_of_overflowing() {
    let shards = vec![
        ProfileShardResult {
            shard_id: "0".into(),
            aggregations: vec![unfold(
                "cpu",
                u64::MAX,
                json!({"total_chunks": i64::MAX, "total_samples": i64::MAX}),
            )],
        },
        ProfileShardResult {
            shard_id: "1".into(),
            aggregations: vec![unfold(
                "cpu",
                1,
                json!({"total_chunks": 1, "total_samples": i64::MAX}),
            )],
        },
    ];
    let report = ProfileReport::from_shards(&shards);
    assert_eq!(report.totals.get(TOTAL_CHUNKS), i64::MAX);
    assert_eq!(report.totals.get(TOTAL_SAMPLES), i64::MAX);
    assert_eq!(report.totals.total_time_nanos, u64::MAX);
}

#[test]
fn debug_info_fields_keep_a_fixed_order() {
    let shards = vec![ProfileShardResult {
        shard_id: "0".into(),
        aggregations: vec![unfold(
            "cpu",
            1,
            json!({"closed_doc_count": 1, "stages": "head", "total_chunks": 2}),
        )],
    }];
    let rendered = ProfileReport::from_shards(&shards).to_json();
    let info = rendered["profile"]["shards"][0]["aggregations"][0]["debug_info"]
        .as_object()
        .cloned()
        .unwrap_or_default();
    let keys: Vec<&str> = info.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            STAGES,
            TOTAL_CHUNKS,
            TOTAL_SAMPLES,
            TOTAL_INPUT_SERIES,
            TOTAL_OUTPUT_SERIES,
            LIVE_CHUNK_COUNT,
            CLOSED_CHUNK_COUNT,
            LIVE_DOC_COUNT,
            CLOSED_DOC_COUNT,
            LIVE_SAMPLE_COUNT,
            CLOSED_SAMPLE_COUNT,
        ]
    );
}
