//! End-to-end runs over the definitions and responses in `fixtures/`.

use clap::Parser;
use search_agg::{AggBuilder, CliArgs, DefinitionDocument, load_document, run_command};
use serde_json::{Value, json};
use std::path::PathBuf;

fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(relative)
}

#[test]
fn audience_definition_compiles() {
    let document: DefinitionDocument =
        load_document(&fixture("definitions/audience.yaml"), "definition").expect("definition");
    let node = document.build(&AggBuilder::new()).expect("tree");
    assert!(node.is_root());

    assert_eq!(
        node.compile_query(),
        json!({
            "address_nested_agg": {
                "nested": {"path": "address"},
                "aggs": {
                    "address.state_terms_agg": {
                        "terms": {"field": "address.state", "size": 10}
                    }
                }
            },
            "membership_nested_agg": {
                "nested": {"path": "membership"},
                "aggs": {
                    "0_filter_agg": {"filter": {"term": {"membership.tier": "gold"}}},
                    "1_filter_agg": {"filter": {"term": {"membership.tier": "silver"}}}
                }
            },
            "donations_sum_agg": {"sum": {"field": "donations"}}
        })
    );
}

#[test]
fn audience_response_resolves() {
    let args = CliArgs::parse_from([
        "search-agg",
        "--label-case",
        "title-case",
        "resolve",
        "--definition",
        fixture("definitions/audience.yaml").to_str().unwrap(),
        "--response",
        fixture("responses/audience.json").to_str().unwrap(),
    ]);
    let output = run_command(&args).expect("resolve");
    let report: Value = serde_json::from_str(&output).expect("json output");

    assert_eq!(
        report,
        json!({
            "Total": 1591.5,
            "options": {
                "address_nested_agg": {
                    "Total": 41,
                    "options": {"Ohio": 20, "New York": 15, "Maine": 6}
                },
                "membership_nested_agg": {
                    "Total": 30,
                    "options": {"Gold": 12, "Silver": 18}
                },
                "donations_sum_agg": {
                    "Total": 1520.5,
                    "options": {"Sum": 1520.5}
                }
            }
        })
    );

    let labels: Vec<&str> = report["options"]["membership_nested_agg"]["options"]
        .as_object()
        .expect("options object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(labels, vec!["Gold", "Silver"]);
}
