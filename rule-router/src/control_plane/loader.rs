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

//! Rule-file loading from disk.
//!
//! The loader walks a directory for `.json` files, accepting either a bare
//! rule array or a rule-set object per file. Files are visited in name
//! order so insertion order into the index is reproducible across runs.
//! Absent timestamps default to load time, absent `enabled` to true. The
//! combined set is validated as a whole; duplicate topic patterns across
//! files are rejected.

use crate::control_plane::validator::validate_rules;
use crate::errors::RouterError;
use crate::observability::events;
use crate::rule::{Rule, RuleFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const COMPONENT: &str = "rule_loader";

/// Loads and validates every rule file under `dir`, recursively.
pub fn load_rules_dir(dir: &Path) -> Result<Vec<Rule>, RouterError> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut rules = Vec::new();
    for path in &files {
        let mut from_file = parse_rules_file(path)?;
        debug!(
            event = events::RULES_FILE_LOADED,
            component = COMPONENT,
            path = %path.display(),
            rule_count = from_file.len(),
            "rule file parsed"
        );
        rules.append(&mut from_file);
    }

    validate_rules(&rules)?;

    info!(
        component = COMPONENT,
        dir = %dir.display(),
        file_count = files.len(),
        rule_count = rules.len(),
        "rule directory loaded"
    );
    Ok(rules)
}

/// Loads and validates a single rule file.
pub fn load_rules_file(path: &Path) -> Result<Vec<Rule>, RouterError> {
    let rules = parse_rules_file(path)?;
    validate_rules(&rules)?;
    Ok(rules)
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), RouterError> {
    let entries = fs::read_dir(dir).map_err(|source| RouterError::RuleFileIo {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| RouterError::RuleFileIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

fn parse_rules_file(path: &Path) -> Result<Vec<Rule>, RouterError> {
    let data = fs::read(path).map_err(|source| RouterError::RuleFileIo {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: RuleFile =
        serde_json::from_slice(&data).map_err(|source| RouterError::RuleFileParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parsed.into_rules())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).expect("create rule file");
        file.write_all(contents.as_bytes()).expect("write rule file");
    }

    const BARE_RULES: &str = r#"[
        { "topic": "sensors/temperature",
          "action": { "topic": "alerts/temp", "payload": "${temperature}" } }
    ]"#;

    const RULE_SET: &str = r#"{
        "name": "wildcards",
        "version": "2",
        "createdAt": "2025-11-04T08:30:00Z",
        "rules": [
            { "topic": "sensors/+/humidity",
              "enabled": false,
              "action": { "topic": "alerts/humidity", "targetBroker": "cloud" } }
        ]
    }"#;

    #[test]
    fn loads_both_file_forms_in_name_order() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "20-sets.json", RULE_SET);
        write_file(dir.path(), "10-bare.json", BARE_RULES);
        write_file(dir.path(), "ignored.yaml", "not: json");

        let rules = load_rules_dir(dir.path()).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].topic, "sensors/temperature");
        assert!(rules[0].enabled);
        assert_eq!(rules[1].topic, "sensors/+/humidity");
        assert!(!rules[1].enabled);
        assert_eq!(rules[1].action.target_broker.as_deref(), Some("cloud"));
    }

    #[test]
    fn nested_directories_are_walked() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("site-a");
        fs::create_dir(&nested).unwrap();
        write_file(&nested, "rules.json", BARE_RULES);

        let rules = load_rules_dir(dir.path()).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn duplicate_patterns_across_files_abort_the_load() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.json", BARE_RULES);
        write_file(dir.path(), "b.json", BARE_RULES);

        assert!(matches!(
            load_rules_dir(dir.path()),
            Err(RouterError::DuplicatePattern { .. })
        ));
    }

    #[test]
    fn malformed_json_reports_the_offending_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "broken.json", "{ not json");

        let err = load_rules_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn invalid_rules_abort_the_load() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "bad.json",
            r#"[ { "topic": "sensors/#/broken", "action": { "topic": "out" } } ]"#,
        );

        assert!(matches!(
            load_rules_dir(dir.path()),
            Err(RouterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(matches!(
            load_rules_dir(&missing),
            Err(RouterError::RuleFileIo { .. })
        ));
    }

    #[test]
    fn loaded_rules_round_trip_modulo_timestamp_defaulting() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "rules.json", BARE_RULES);

        let rules = load_rules_file(&dir.path().join("rules.json")).unwrap();
        let exported = serde_json::to_string(&rules).unwrap();
        let reloaded: Vec<Rule> = serde_json::from_str(&exported).unwrap();

        assert_eq!(rules, reloaded);
    }
}
