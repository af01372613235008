/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! End-to-end routing scenarios over the full broker → processor → broker
//! path.

mod support;

use rule_router::{
    Broker, BrokerManager, BrokerRole, InProcBroker, IngressListener, Processor,
    ProcessorOptions, Rule,
};
use std::sync::Arc;
use support::RecordingBroker;

fn parse_rules(json: &str) -> Vec<Rule> {
    serde_json::from_str(json).expect("test rules should parse")
}

struct Fixture {
    source: Arc<InProcBroker>,
    target: Arc<RecordingBroker>,
    processor: Arc<Processor>,
}

/// One connected source broker, one recording target, processor wired
/// through the manager and subscribed to the given patterns.
async fn fixture(options: ProcessorOptions, rules_json: &str, patterns: &[&str]) -> Fixture {
    support::init_logging();

    let source = Arc::new(InProcBroker::connected("edge", BrokerRole::Source));
    let target = Arc::new(RecordingBroker::target("cloud"));

    let manager = Arc::new(BrokerManager::new());
    manager.add_broker(source.clone()).unwrap();
    manager.add_broker(target.clone()).unwrap();

    let rules = parse_rules(rules_json);
    manager.check_rule_targets(&rules).unwrap();

    let processor = Arc::new(Processor::with_publisher(options, Some(manager.clone() as _)));
    processor.load_rules(rules).unwrap();

    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    let listener = Arc::new(IngressListener::new(processor.clone(), "edge"));
    manager.subscribe_sources(&patterns, listener).await.unwrap();

    Fixture {
        source,
        target,
        processor,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn simple_match_publishes_rendered_action() {
    let fixture = fixture(
        ProcessorOptions::default(),
        r#"[
            { "topic": "sensors/temperature",
              "conditions": {
                  "operator": "and",
                  "items": [ { "field": "temperature", "operator": "gt", "value": 30 } ]
              },
              "action": { "topic": "alerts/temp", "payload": "{\"alert\":${temperature}}" } }
        ]"#,
        &["sensors/temperature"],
    )
    .await;

    fixture
        .source
        .publish("sensors/temperature", br#"{"temperature":32.5}"#, 0, false)
        .await
        .unwrap();
    fixture
        .source
        .publish("sensors/temperature", br#"{"temperature":20}"#, 0, false)
        .await
        .unwrap();

    fixture.processor.close();

    let published = fixture.target.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "alerts/temp");
    assert_eq!(published[0].1, "{\"alert\":32.5}");

    let stats = fixture.processor.stats();
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn single_level_wildcard_matches_exactly_one_segment() {
    let processor = Processor::new(ProcessorOptions::default());
    processor
        .load_rules(parse_rules(
            r#"[ { "topic": "sensors/+/temperature",
                   "action": { "topic": "alerts", "payload": "hit" } } ]"#,
        ))
        .unwrap();

    let hit = processor
        .process("sensors/room1/temperature", b"{}")
        .await
        .unwrap();
    assert_eq!(hit.len(), 1);

    let wrong_leaf = processor.process("sensors/room1/humidity", b"{}").await.unwrap();
    assert!(wrong_leaf.is_empty());

    let too_deep = processor
        .process("sensors/room1/floor2/temperature", b"{}")
        .await
        .unwrap();
    assert!(too_deep.is_empty());

    processor.close();
}

#[tokio::test]
async fn multi_level_wildcard_matches_any_deeper_topic() {
    let processor = Processor::new(ProcessorOptions::default());
    processor
        .load_rules(parse_rules(
            r#"[ { "topic": "sensors/#",
                   "action": { "topic": "alerts", "payload": "hit" } } ]"#,
        ))
        .unwrap();

    assert_eq!(processor.process("sensors/a", b"{}").await.unwrap().len(), 1);
    assert_eq!(processor.process("sensors/a/b/c", b"{}").await.unwrap().len(), 1);
    assert!(processor.process("sensors", b"{}").await.unwrap().is_empty());

    processor.close();
}

#[tokio::test]
async fn nested_condition_groups_route_the_documented_example() {
    let processor = Processor::new(ProcessorOptions::default());
    processor
        .load_rules(parse_rules(
            r#"[
                { "topic": "stations/weather",
                  "conditions": {
                      "operator": "and",
                      "items": [ { "field": "status", "operator": "eq", "value": "active" } ],
                      "groups": [ {
                          "operator": "or",
                          "items": [ { "field": "temp", "operator": "gt", "value": 32 } ],
                          "groups": [ {
                              "operator": "and",
                              "items": [
                                  { "field": "humidity", "operator": "gt", "value": 85 },
                                  { "field": "pressure", "operator": "lt", "value": 990 }
                              ]
                          } ]
                      } ]
                  },
                  "action": { "topic": "alerts/storm", "payload": "storm" } }
            ]"#,
        ))
        .unwrap();

    let matching = processor
        .process(
            "stations/weather",
            br#"{"status":"active","temp":25,"humidity":90,"pressure":980}"#,
        )
        .await
        .unwrap();
    assert_eq!(matching.len(), 1);

    let no_branch = processor
        .process(
            "stations/weather",
            br#"{"status":"active","temp":25,"humidity":90,"pressure":1005}"#,
        )
        .await
        .unwrap();
    assert!(no_branch.is_empty());

    processor.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_topic_variable_skips_only_the_failing_rule() {
    let fixture = fixture(
        ProcessorOptions::default(),
        r#"[
            { "topic": "sensors/boiler",
              "action": { "topic": "alerts/${device_id}", "payload": "specific" } },
            { "topic": "sensors/+",
              "action": { "topic": "alerts/generic", "payload": "generic" } }
        ]"#,
        &["sensors/#"],
    )
    .await;

    fixture
        .source
        .publish("sensors/boiler", br#"{"temperature":99}"#, 0, false)
        .await
        .unwrap();

    fixture.processor.close();

    // The unresolvable topic template published nothing; the sibling rule
    // for the same message still ran, and the error counter is untouched.
    let published = fixture.target.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "alerts/generic");

    let stats = fixture.processor.stats();
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_submissions_drain_with_exact_counts() {
    let fixture = fixture(
        ProcessorOptions {
            workers: 4,
            queue_size: 64,
            batch_size: 16,
        },
        r#"[
            { "topic": "load/test",
              "action": { "topic": "out/${n}", "payload": "${n}" } }
        ]"#,
        &["load/test"],
    )
    .await;

    let mut producers = Vec::new();
    for chunk in 0..10 {
        let processor = fixture.processor.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..100 {
                let payload = format!("{{\"n\":{}}}", chunk * 100 + i);
                processor
                    .submit(Some("edge"), "load/test", payload.as_bytes())
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    fixture.processor.close();

    let stats = fixture.processor.stats();
    assert_eq!(stats.processed, 1000);
    assert_eq!(stats.matched, 1000);
    assert_eq!(stats.errors, 0);
    assert_eq!(fixture.target.published_count(), 1000);
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_failures_count_errors_without_stopping_the_drain() {
    support::init_logging();

    let manager = Arc::new(BrokerManager::new());
    let target = Arc::new(RecordingBroker::failing_target("cloud"));
    manager.add_broker(target.clone()).unwrap();

    let processor = Arc::new(Processor::with_publisher(
        ProcessorOptions {
            workers: 2,
            queue_size: 8,
            batch_size: 1,
        },
        Some(manager as _),
    ));
    processor
        .load_rules(parse_rules(
            r#"[ { "topic": "sensors/a", "action": { "topic": "out", "payload": "x" } } ]"#,
        ))
        .unwrap();

    for _ in 0..10 {
        processor.submit(None, "sensors/a", b"{}").await.unwrap();
    }
    processor.close();

    let stats = processor.stats();
    assert_eq!(stats.processed, 10);
    assert_eq!(stats.matched, 10);
    assert_eq!(stats.errors, 10);
    assert_eq!(target.published_count(), 0);
}
