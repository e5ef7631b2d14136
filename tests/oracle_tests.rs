//! Oracle stage failure handling: retries, timeouts, malformed output, cancellation.

mod support;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use support::scenario::{listings, oracle_edge, run};
use tangle::adapter::outbound::oracle::LlmOracle;
use tangle::application::oracle::RelationshipFinder;
use tangle::application::{AnalysisConfig, Pipeline};
use tangle::domain::MarketRecord;
use tangle::error::{Error, OracleError};
use tangle::testkit::config::analysis_config;
use tangle::testkit::domain::binary_market;
use tangle::testkit::llm::MockLlm;
use tangle::testkit::oracle::ScriptedOracle;

fn markets(ids: &[&str]) -> Vec<MarketRecord> {
    ids.iter().map(|id| binary_market(id, dec!(0.5))).collect()
}

#[tokio::test]
async fn transient_failure_recovers_on_retry() {
    let oracle = Arc::new(ScriptedOracle::new().with_script(
        "a",
        vec![
            Err(Error::Connection("reset by peer".into())),
            Ok(vec![oracle_edge("a", "b", "complement", 0.9)]),
        ],
    ));
    let finder = RelationshipFinder::new(oracle.clone());

    let outcome = finder
        .find_relationships(&markets(&["a", "b"]), &analysis_config(), &CancellationToken::new())
        .await;

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.edges.len(), 1);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn exhausted_retries_report_attempts_and_last_error() {
    let config = AnalysisConfig {
        max_retries: 1,
        ..analysis_config()
    };
    let oracle = Arc::new(ScriptedOracle::new().with_script(
        "a",
        vec![
            Err(Error::Connection("reset by peer".into())),
            Err(Error::Parse("not json".into())),
        ],
    ));
    let finder = RelationshipFinder::new(oracle.clone());

    let outcome = finder
        .find_relationships(&markets(&["a", "b"]), &config, &CancellationToken::new())
        .await;

    assert!(outcome.edges.is_empty());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].attempts, 2);
    assert_eq!(
        outcome.failures[0].error,
        OracleError::Malformed("not json".into())
    );
}

#[tokio::test]
async fn slow_oracle_times_out() {
    let config = AnalysisConfig {
        batch_timeout_ms: 20,
        max_retries: 0,
        ..analysis_config()
    };
    let oracle = Arc::new(ScriptedOracle::new().with_delay(Duration::from_millis(500)));
    let finder = RelationshipFinder::new(oracle);

    let outcome = finder
        .find_relationships(&markets(&["a", "b"]), &config, &CancellationToken::new())
        .await;

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(
        outcome.failures[0].error,
        OracleError::Timeout { timeout_ms: 20 }
    );
}

#[tokio::test]
async fn malformed_llm_output_fails_batch_not_run() {
    let llm = Arc::new(MockLlm::new("I could not find any relationships."));
    let oracle = Arc::new(LlmOracle::new(llm.clone()));

    let report = run(oracle, analysis_config(), listings(&[("a", 0.62), ("b", 0.46)])).await;

    assert!(report.signals.is_empty());
    assert_eq!(report.skipped.failed_batches, 1);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("malformed oracle response")));
    // first attempt plus default retries
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn llm_references_map_back_to_market_ids() {
    let llm = Arc::new(MockLlm::new(
        r#"Here is my analysis:
```json
{"relationships": [
  {"a": "M1", "b": "M2", "type": "complement", "confidence": 0.9, "reasoning": "same race, opposite sides"},
  {"a": "M1", "b": "M7", "type": "equivalent", "confidence": 0.9}
]}
```"#,
    ));
    let oracle = Arc::new(LlmOracle::new(llm.clone()));

    let report = run(
        oracle,
        analysis_config(),
        listings(&[("alpha", 0.62), ("beta", 0.46)]),
    )
    .await;

    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].group_id().to_string(), "alpha|beta");
    assert_eq!(report.signals[0].materiality, dec!(0.072));
    assert_eq!(report.skipped.dropped_oracle_edges, 1);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("M1: Will alpha happen?"));
}

#[tokio::test]
async fn in_flight_batches_never_exceed_the_limit() {
    let oracle = Arc::new(ScriptedOracle::new().with_delay(Duration::from_millis(20)));
    let config = AnalysisConfig {
        oracle_batch_size: 2,
        max_in_flight_batches: 3,
        ..analysis_config()
    };
    let ids: Vec<String> = (0..24).map(|i| format!("m{i:02}")).collect();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    let finder = RelationshipFinder::new(oracle.clone());

    let outcome = finder
        .find_relationships(&markets(&ids), &config, &CancellationToken::new())
        .await;

    assert_eq!(outcome.batches, 12);
    assert_eq!(oracle.calls(), 12);
    assert!(oracle.peak_in_flight() <= 3, "peak {}", oracle.peak_in_flight());
    assert!(oracle.peak_in_flight() >= 2);
}

#[tokio::test]
async fn one_bad_tuple_keeps_the_rest_of_the_batch() {
    let llm = Arc::new(MockLlm::new(
        r#"{"relationships": [
  {"a": "M1", "b": "M2", "type": "complement", "confidence": 0.9},
  {"a": "M1", "b": "M2", "type": "equivalent", "confidence": "high"}
]}"#,
    ));
    let oracle = Arc::new(LlmOracle::new(llm.clone()));

    let report = run(oracle, analysis_config(), listings(&[("a", 0.62), ("b", 0.46)])).await;

    assert_eq!(report.skipped.failed_batches, 0);
    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].kind, tangle::domain::RelationKind::Complement);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn precancelled_run_skips_every_batch() {
    let oracle = Arc::new(ScriptedOracle::new());
    let config = AnalysisConfig {
        oracle_batch_size: 2,
        ..analysis_config()
    };
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Pipeline::new(oracle.clone(), config)
        .run(listings(&[("a", 0.5), ("b", 0.5), ("c", 0.5), ("d", 0.5)]), &cancel)
        .await
        .unwrap();

    assert!(report.was_cancelled());
    assert_eq!(report.skipped.cancelled_batches, 2);
    assert_eq!(oracle.calls(), 0);
    assert!(report.signals.is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_batches() {
    let oracle = Arc::new(ScriptedOracle::new().with_delay(Duration::from_secs(30)));
    let config = AnalysisConfig {
        batch_timeout_ms: 60_000,
        ..analysis_config()
    };
    let finder = RelationshipFinder::new(oracle);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        finder.find_relationships(&markets(&["a", "b"]), &config, &cancel),
    )
    .await
    .expect("cancellation should end the stage promptly");

    assert_eq!(outcome.cancelled_batches, 1);
    assert!(outcome.failures.is_empty());
}
