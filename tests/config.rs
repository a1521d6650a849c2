use anyhow::Result;
use ironseries::{ExecConfig, ExecMode};
use std::io::Write;

#[test]
fn defaults() {
    let cfg = ExecConfig::default();
    assert_eq!(cfg.mode, ExecMode::Parallel { threads: None });
    assert!(!cfg.profile);
    assert!(cfg.effective_threads() >= 1);
    assert_eq!(ExecConfig::sequential().effective_threads(), 1);
}

#[test]
fn parses_json() -> Result<()> {
    let cfg = ExecConfig::from_json_str(
        r#"{"mode": {"type": "parallel", "threads": 4}, "profile": true}"#,
    )?;
    assert_eq!(cfg.mode, ExecMode::Parallel { threads: Some(4) });
    assert_eq!(cfg.effective_threads(), 4);
    assert!(cfg.profile);

    let seq = ExecConfig::from_json_str(r#"{"mode": {"type": "sequential"}}"#)?;
    assert_eq!(seq, ExecConfig::sequential());

    assert_eq!(ExecConfig::from_json_str("{}")?, ExecConfig::default());
    Ok(())
}

#[test]
fn rejects_bad_config() {
    assert!(ExecConfig::from_json_str(r#"{"mode": {"type": "parallel", "threads": 0}}"#).is_err());
    assert!(ExecConfig::from_json_str(r#"{"mode": {"type": "gpu"}}"#).is_err());
    assert!(ExecConfig::from_json_str("not json").is_err());
}

#[test]
fn loads_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"mode": {{"type": "sequential"}}, "profile": true}}"#)?;

    let cfg = ExecConfig::from_json_file(file.path())?;
    assert_eq!(cfg, ExecConfig::sequential().with_profile(true));

    let err = ExecConfig::from_json_file(file.path().with_extension("missing"))
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.starts_with("reading config"));
    Ok(())
}
