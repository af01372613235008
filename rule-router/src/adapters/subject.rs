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

//! MQTT-topic ↔ NATS-subject translation at the adapter boundary.
//!
//! MQTT uses `/` separators with `+`/`#` wildcards; NATS uses `.` with
//! `*`/`>`. Wildcards are mapped before separators so a literal `+` segment
//! never collides with a freshly produced `*`.

/// Converts an MQTT-style topic or pattern to a NATS subject.
pub fn to_nats_subject(mqtt_topic: &str) -> String {
    mqtt_topic
        .replace('+', "*")
        .replace('#', ">")
        .replace('/', ".")
}

/// Converts a NATS subject back to MQTT form. Inverse of
/// [`to_nats_subject`] for topics free of literal `.`, `*` and `>`.
pub fn to_mqtt_topic(nats_subject: &str) -> String {
    nats_subject
        .replace('*', "+")
        .replace('>', "#")
        .replace('.', "/")
}

/// Replaces characters NATS rejects in subjects.
pub fn normalize_subject(subject: &str) -> String {
    subject.replace(
        [' ', ',', ':', '?', '[', ']'],
        "_",
    )
}
