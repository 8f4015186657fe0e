// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::{parse_resource_uri, resource_templates, static_resources};

#[parameterized(
    status = { "masc://status", "status", false },
    status_json = { "masc://status.json", "status", true },
    tasks = { "masc://tasks", "tasks", false },
    who_json = { "masc://who.json", "who", true },
    schema = { "masc://schema.json", "schema", true },
)]
fn known_uris_parse(uri: &str, id: &str, json: bool) {
    let parsed = parse_resource_uri(uri).unwrap();
    assert_eq!(parsed.id, id);
    assert_eq!(parsed.json, json);
    assert!(parsed.query.is_empty());
}

#[test]
fn query_parameters_parse() {
    let parsed = parse_resource_uri("masc://messages.json?since_seq=3&limit=10").unwrap();
    assert_eq!(parsed.query_u64("since_seq"), Some(3));
    assert_eq!(parsed.query_u64("limit"), Some(10));
    assert_eq!(parsed.query_u64("absent"), None);
}

#[parameterized(
    unknown = { "masc://bogus" },
    foreign = { "file:///etc/passwd" },
    empty = { "masc://" },
    bad_query_only = { "masc://?limit=1" },
)]
fn bad_uris_are_rejected(uri: &str) {
    assert!(parse_resource_uri(uri).is_none());
}

#[test]
fn static_list_covers_plain_and_json_variants() {
    let resources = static_resources();
    assert_eq!(resources.len(), 16);
    assert!(resources.iter().any(|r| r["uri"] == "masc://messages.json"));
    assert!(resources.iter().any(|r| r["uri"] == "masc://status"));
}

#[test]
fn templates_mention_query_parameters() {
    let templates = resource_templates();
    assert!(templates[0]["uriTemplate"].as_str().unwrap().contains("since_seq"));
}
