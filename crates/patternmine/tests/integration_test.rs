//! Integration tests for patternmine.

use std::sync::Arc;

use serde_json::{json, Value};

use patternmine::agents::{
    ChurnAgent, MessageKind, PatternKind, PatternPayload, ProfitRulesAgent, RuleAgent,
    SeasonalityAgent, TendersAgent,
};
use patternmine::engine::{
    group_by_key, synthesize, CandidateKind, KeyExtractor, Metric, OutlierDetector, RuleSpec,
};
use patternmine::{Message, Normalizer, PatternAgent, PatternError, Record, Registry, Reply};

fn records(values: Vec<Value>) -> Vec<Record> {
    values.into_iter().filter_map(Record::from_value).collect()
}

fn erp_records() -> Vec<Record> {
    records(vec![
        json!({"department": "Tech", "project": "X", "status": "Delayed"}),
        json!({"department": "Tech", "project": "X", "status": "Delayed"}),
        json!({"department": "Tech", "project": "X", "status": "On time"}),
        json!({"department": "Ops", "project": "Y", "status": "Delayed"}),
    ])
}

fn financial_records() -> Vec<Record> {
    records(vec![
        json!({"client": "Acme", "month": 1, "profit": 200000}),
        json!({"client": "Acme", "month": 1, "profit": 140000}),
        json!({"client": "Beta", "month": 1, "profit": 500000}),
    ])
}

// =============================================================================
// Domain Scenarios
// =============================================================================

#[test]
fn test_erp_delay_rule() {
    let result = RuleAgent::erp(erp_records()).detect().expect("detection failed");
    assert_eq!(result.kind, PatternKind::ErpDelay);

    let rules = result.rules().expect("rule payload");
    assert_eq!(rules.len(), 1);

    let rule = &rules[0];
    assert_eq!(rule.kind, CandidateKind::Rule);
    assert_eq!(rule.support, 3);
    assert!(rule.statement.contains("Tech"));
    assert!(rule.statement.contains("'X'"));
    assert!(rule.statement.contains("67%"));
    assert!(rule.statement.contains("2/3"));
}

#[test]
fn test_financial_profit_rule() {
    let result = RuleAgent::financial(financial_records()).detect().expect("detection failed");
    let rules = result.rules().expect("rule payload");

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].observed, 170000.0);
    assert_eq!(rules[0].support, 2);
    assert_eq!(
        rules[0].statement,
        "Si le client est 'Acme' et le mois est 1, le profit moyen est élevé: 170,000."
    );
}

#[test]
fn test_financial_missing_client_groups_as_unknown() {
    let data = records(vec![
        json!({"month": 4, "profit": 300000}),
        json!({"client": null, "month": 4, "profit": 200000}),
    ]);
    let result = RuleAgent::financial(data).detect().expect("detection failed");
    let rules = result.rules().expect("rule payload");
    assert!(rules[0].statement.contains("'Unknown'"));
}

#[test]
fn test_empty_input_yields_sentinel() {
    let extractor = KeyExtractor::fields(&["department", "project"]);
    let groups = group_by_key(&[], &extractor);
    assert!(groups.is_empty());

    for agent in [
        RuleAgent::erp(Vec::<Record>::new()),
        RuleAgent::hr(Vec::<Record>::new()),
        RuleAgent::success_recipe(Vec::<Record>::new()),
        RuleAgent::financial(Vec::<Record>::new()),
    ] {
        let result = agent.detect().expect("detection failed");
        let rules = result.rules().expect("rule payload");
        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_sentinel());
    }
}

#[test]
fn test_sentinel_text_per_domain() {
    let result = RuleAgent::erp(records(vec![json!({"department": "A", "project": "B", "status": "Done"})]))
        .detect()
        .expect("detection failed");
    assert_eq!(
        result.rules().unwrap()[0].statement,
        "Aucun pattern de risque de retard significatif détecté."
    );
}

#[test]
fn test_group_sizes_sum_to_normalized_count() {
    let mut data = erp_records();
    data.push(data[0].clone());

    let normalized = Normalizer::new().normalize(&data);
    let groups = group_by_key(&normalized, &KeyExtractor::fields(&["department", "project"]));

    assert_eq!(groups.total_members(), normalized.len());
    assert_eq!(normalized.len(), 3);
}

#[test]
fn test_constant_values_never_flag() {
    let data = records(vec![json!({"v": 10}), json!({"v": 10}), json!({"v": 10}), json!({"v": 10})]);
    let report = OutlierDetector::new().detect(&data, &["v"]);
    assert_eq!(report.total(), 0);
}

#[test]
fn test_custom_rule_spec() {
    let data = erp_records();
    let groups = group_by_key(&data, &KeyExtractor::fields(&["department"]));
    let aggregates = groups.aggregate(&Metric::Rate {
        predicate: patternmine::engine::Predicate::Equals {
            field: "status".to_string(),
            value: json!("Delayed"),
        },
    });

    let spec = RuleSpec::new(1, 0.9, "{k0} delays {rate}%", "none");
    let rules = synthesize(&aggregates, &spec);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].statement, "Ops delays 100%");
}

// =============================================================================
// Dispatch
// =============================================================================

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(RuleAgent::erp(erp_records()));
    registry.register(RuleAgent::financial(financial_records()));
    registry.register(ChurnAgent::new(records(vec![json!({"churned": true})])));
    registry.register(SeasonalityAgent::new(records(vec![json!({"sales_month": 5})])));
    registry.register(ProfitRulesAgent::new(records(vec![
        json!({"project_type": "IT", "industry": "Retail", "team_size": 4, "profit": 90000}),
    ])));
    registry.register(TendersAgent::new(
        records(vec![json!({"status": "awarded", "tender_type": "Public"})]),
        Vec::<Record>::new(),
    ));
    registry
}

#[test]
fn test_registry_dispatch() {
    let registry = registry();
    let reply = registry
        .send(&Message::request_pattern("orchestrator", "erp"))
        .expect("dispatch failed");
    let result = reply.into_pattern().expect("pattern reply");
    assert_eq!(result.rules().unwrap().len(), 1);
}

#[test]
fn test_registry_errors_are_values() {
    let registry = registry();

    let missing = registry.send(&Message::request_pattern("orchestrator", "nobody"));
    assert!(matches!(missing, Err(PatternError::RouteNotFound { .. })));

    let unsupported = registry.send(&Message::new(
        "orchestrator",
        "erp",
        MessageKind::Other("PING".to_string()),
    ));
    assert!(matches!(
        unsupported,
        Err(PatternError::UnsupportedMessageKind { ref receiver, ref kind }) if receiver == "erp" && kind == "PING"
    ));
}

#[test]
fn test_history_only_on_profit_rules() {
    let registry = registry();
    registry
        .send(&Message::request_pattern("orchestrator", "profit_rules"))
        .expect("dispatch failed");

    let history = registry
        .send(&Message::new("orchestrator", "profit_rules", MessageKind::GetHistory))
        .expect("dispatch failed");
    assert!(matches!(history, Reply::History(ref h) if h.len() == 1));

    let churn = registry.send(&Message::new("orchestrator", "churn", MessageKind::GetHistory));
    assert!(churn.is_err());
}

#[test]
fn test_tender_prompt_through_registry() {
    let registry = registry();
    let reply = registry
        .send(&Message::request_pattern("orchestrator", "tenders").with_prompt("How many responses had high bids?"))
        .expect("dispatch failed")
        .into_pattern()
        .expect("pattern reply");
    assert!(matches!(reply.payload, PatternPayload::Tenders(_)));

    let unknown = registry
        .send(&Message::request_pattern("orchestrator", "tenders").with_prompt("What's the win rate by type?"));
    assert!(matches!(unknown, Err(PatternError::UnknownQuery(_))));
}

#[test]
fn test_result_serializes_to_json() {
    let result = RuleAgent::erp(erp_records()).detect().expect("detection failed");
    let value = serde_json::to_value(&result).expect("serialization failed");
    assert_eq!(value["kind"], "erp_delay");
    assert_eq!(value["payload"]["type"], "rules");
    assert_eq!(value["payload"]["rules"][0]["support"], 3);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_detection() {
    let shared: Arc<[Record]> = erp_records().into();
    let agent = RuleAgent::erp(Arc::clone(&shared));
    let profit = ProfitRulesAgent::new(records(vec![
        json!({"project_type": "IT", "industry": "Retail", "team_size": 4, "profit": 90000}),
    ]));

    let expected = agent.detect().expect("detection failed");
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    profit.detect().expect("detection failed");
                    agent.detect().expect("detection failed")
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread panicked"), expected);
        }
    });

    assert_eq!(profit.history().len(), 8);
}
