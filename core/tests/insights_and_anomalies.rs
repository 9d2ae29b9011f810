mod common;

use common::*;
use fingenius_core::anomaly::detector::FlagSeverity;
use fingenius_core::categorize::categorizer::CategorySource;
use fingenius_core::categorize::taxonomy::Category;
use fingenius_core::documents::model::LifecycleState;
use fingenius_core::error::CoreError;
use fingenius_core::extraction::fixture::FixtureAdapter;
use fingenius_core::insights::model::InsightType;
use std::sync::Arc;

#[tokio::test]
async fn outlier_grocery_charge_is_flagged_and_leads_the_insights() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let id = submit_card_statement(
        &mgr,
        &adapter,
        "groceries",
        "owner-1",
        statement(
            Some(("2026-03-01", "2026-03-31")),
            &[
                ("2026-03-04", "125.00", "Safeway"),
                ("2026-03-01", "50.00", "Safeway"),
                ("2026-03-02", "52.00", "Safeway"),
                ("2026-03-03", "48.00", "Safeway"),
            ],
        ),
    );
    assert_eq!(drive(&mgr, &id).await, LifecycleState::Ready);

    let detail = mgr.document_detail(&id).unwrap();
    let flagged: Vec<_> = detail.transactions.iter().filter(|t| t.is_flagged()).collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].amount(), 125.0);
    assert_eq!(flagged[0].flag_severity(), Some(FlagSeverity::Severe));
    assert!(flagged[0].flag_reason().unwrap().contains("Food"));

    let first = &detail.insights[0];
    assert_eq!(first.insight_type, InsightType::Anomaly);
    assert_eq!(first.importance, 5);
    assert_eq!(first.transaction_ids, vec![flagged[0].id().clone()]);

    let food = mgr.baselines().snapshot(&owner("owner-1"), Category::Food);
    assert_eq!(food.count, 4);
    assert!((food.mean - 68.75).abs() < 1e-9);
    assert!(mgr
        .baselines()
        .snapshot(&owner("owner-2"), Category::Food)
        .count
        == 0);
}

#[tokio::test]
async fn recurring_charge_across_statements_yields_a_recommendation() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let feb = submit_card_statement(
        &mgr,
        &adapter,
        "feb",
        "owner-1",
        statement(
            Some(("2026-02-01", "2026-02-28")),
            &[("2026-02-05", "15.99", "NETFLIX.COM"), ("2026-02-07", "40.00", "Kroger")],
        ),
    );
    assert_eq!(drive(&mgr, &feb).await, LifecycleState::Ready);
    assert!(!mgr
        .document_detail(&feb)
        .unwrap()
        .insights
        .iter()
        .any(|i| i.insight_type == InsightType::Recommendation));

    let mar = submit_card_statement(
        &mgr,
        &adapter,
        "mar",
        "owner-1",
        statement(
            Some(("2026-03-01", "2026-03-31")),
            &[("2026-03-05", "15.99", "NETFLIX.COM"), ("2026-03-08", "61.00", "Kroger")],
        ),
    );
    assert_eq!(drive(&mgr, &mar).await, LifecycleState::Ready);
    let insights = mgr.document_detail(&mar).unwrap().insights;
    let rec = insights
        .iter()
        .find(|i| i.insight_type == InsightType::Recommendation && i.title.contains("NETFLIX.COM"))
        .expect("recommendation");
    assert_eq!(rec.importance, 3);
    assert_eq!(rec.estimated_annual_savings, Some(191.88));
    assert!(!insights
        .iter()
        .any(|i| i.insight_type == InsightType::Recommendation && i.title.contains("Kroger")));
}

#[tokio::test]
async fn shift_in_category_mix_yields_a_spending_pattern() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let first = submit_card_statement(
        &mgr,
        &adapter,
        "mix-1",
        "owner-1",
        statement(None, &[("2026-02-03", "100.00", "Safeway")]),
    );
    drive(&mgr, &first).await;
    let second = submit_card_statement(
        &mgr,
        &adapter,
        "mix-2",
        "owner-1",
        statement(
            None,
            &[("2026-03-03", "50.00", "Safeway"), ("2026-03-04", "50.00", "Ticketmaster")],
        ),
    );
    drive(&mgr, &second).await;

    let insights = mgr.document_detail(&second).unwrap().insights;
    let pattern = insights
        .iter()
        .find(|i| i.insight_type == InsightType::SpendingPattern)
        .expect("pattern insight");
    assert!(pattern.title.starts_with("Entertainment"));
    assert_eq!(pattern.importance, 5);
    assert_eq!(insights[0].id, pattern.id);
    assert!(insights.windows(2).all(|w| w[0].importance >= w[1].importance));
}

#[tokio::test]
async fn recategorization_teaches_later_documents() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let first = submit_card_statement(
        &mgr,
        &adapter,
        "acme-1",
        "owner-1",
        statement(None, &[("2026-02-03", "80.00", "ACME WIDGETS")]),
    );
    drive(&mgr, &first).await;
    let tx = mgr.document_detail(&first).unwrap().transactions[0].clone();
    assert_eq!(tx.category(), Some(Category::Other));
    assert_eq!(tx.category_source(), Some(CategorySource::Fallback));

    let updated = mgr.recategorize(&first, tx.id(), Category::Business).unwrap();
    assert_eq!(updated.category(), Some(Category::Business));
    assert_eq!(updated.category_source(), Some(CategorySource::User));

    let second = submit_card_statement(
        &mgr,
        &adapter,
        "acme-2",
        "owner-1",
        statement(None, &[("2026-03-03", "82.00", "Acme Widgets")]),
    );
    drive(&mgr, &second).await;
    let learned = &mgr.document_detail(&second).unwrap().transactions[0];
    assert_eq!(learned.category(), Some(Category::Business));
    assert_eq!(learned.category_source(), Some(CategorySource::Precedent));

    let other_owner = submit_card_statement(
        &mgr,
        &adapter,
        "acme-3",
        "owner-2",
        statement(None, &[("2026-03-03", "82.00", "Acme Widgets")]),
    );
    drive(&mgr, &other_owner).await;
    assert_eq!(
        mgr.document_detail(&other_owner).unwrap().transactions[0].category(),
        Some(Category::Other)
    );
}

#[tokio::test]
async fn regenerated_insights_carry_a_new_generation() {
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    let mgr = manager(Arc::clone(&adapter));
    let id = submit_card_statement(
        &mgr,
        &adapter,
        "regen",
        "owner-1",
        statement(None, &[("2026-03-03", "20.00", "Chipotle")]),
    );
    assert!(matches!(
        mgr.regenerate_insights(&id),
        Err(CoreError::InvalidTransition(_))
    ));
    drive(&mgr, &id).await;
    let before = mgr.document_detail(&id).unwrap().insights;
    let after = mgr.regenerate_insights(&id).unwrap();
    assert_eq!(before.len(), after.len());
    assert!(before.iter().all(|i| i.generation == 1));
    assert!(after.iter().all(|i| i.generation == 2));
    assert_ne!(before[0].id, after[0].id);
    assert_eq!(mgr.document_detail(&id).unwrap().insights, after);
}
