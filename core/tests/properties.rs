use fingenius_core::anomaly::baseline::{BaselineStore, CategoryBaseline};
use fingenius_core::categorize::taxonomy::Category;
use fingenius_core::documents::model::{DocumentId, DocumentType, InsightId, OwnerId};
use fingenius_core::extraction::interface::{RawExtraction, RawLineItem};
use fingenius_core::insights::model::{order_insights, Insight, InsightType};
use fingenius_core::ledger::normalizer::LineNormalizer;
use proptest::prelude::*;
use std::cmp::Ordering;
use time::{Date, Duration as Days};

fn insight_type() -> impl Strategy<Value = InsightType> {
    prop_oneof![
        Just(InsightType::Anomaly),
        Just(InsightType::Recommendation),
        Just(InsightType::SpendingPattern),
        Just(InsightType::Summary),
        Just(InsightType::System),
    ]
}

fn base_date() -> Date {
    Date::from_calendar_date(2026, time::Month::January, 1).unwrap()
}

proptest! {
    #[test]
    fn welford_matches_two_pass_statistics(
        amounts in proptest::collection::vec(0.01f64..10_000.0, 1..200)
    ) {
        let mut running = CategoryBaseline::default();
        for a in &amounts {
            running = running.observe(*a);
        }
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;

        prop_assert_eq!(running.count, amounts.len() as u64);
        prop_assert!((running.mean - mean).abs() <= 1e-6 * mean.max(1.0));
        prop_assert!((running.variance() - variance).abs() <= 1e-6 * variance.max(1.0));
    }

    #[test]
    fn store_updates_match_local_fold(
        amounts in proptest::collection::vec(1.0f64..500.0, 1..50)
    ) {
        let store = BaselineStore::new();
        let owner = OwnerId::from("owner-1");
        let mut local = CategoryBaseline::default();
        for a in &amounts {
            let (seen, after) = store.observe_with(&owner, Category::Food, *a, |before| *before);
            prop_assert_eq!(seen, local);
            local = local.observe(*a);
            prop_assert_eq!(after, local);
        }
        prop_assert_eq!(store.snapshot(&owner, Category::Food), local);
    }

    #[test]
    fn ordered_insights_respect_importance_then_type_then_date(
        specs in proptest::collection::vec(
            (1u8..=5, insight_type(), proptest::option::of(0i64..90)),
            0..30
        )
    ) {
        let doc = DocumentId::from("doc");
        let mut insights: Vec<Insight> = specs
            .iter()
            .enumerate()
            .map(|(n, (importance, kind, offset))| Insight {
                id: InsightId::new(format!("i{}", n)),
                document_id: doc.clone(),
                generation: 1,
                insight_type: *kind,
                title: String::new(),
                body: String::new(),
                importance: *importance,
                transaction_ids: Vec::new(),
                anchor_date: offset.map(|d| base_date() + Days::days(d)),
                estimated_annual_savings: None,
            })
            .collect();
        order_insights(&mut insights);

        for pair in insights.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.importance >= b.importance);
            if a.importance == b.importance {
                prop_assert!(a.insight_type.precedence() <= b.insight_type.precedence());
                if a.insight_type == b.insight_type {
                    let ok = match (a.anchor_date, b.anchor_date) {
                        (Some(x), Some(y)) => x.cmp(&y) != Ordering::Greater,
                        (None, Some(_)) => false,
                        _ => true,
                    };
                    prop_assert!(ok);
                }
            }
        }
    }

    #[test]
    fn normalization_is_deterministic_and_accounts_for_every_line(
        lines in proptest::collection::vec(
            (0i64..365, -5_000i64..5_000, "[A-Za-z ]{0,20}", any::<bool>()),
            0..40
        )
    ) {
        let raw = RawExtraction {
            line_items: lines
                .iter()
                .map(|(day, cents, desc, garbled)| {
                    let date = if *garbled {
                        "garbled".to_string()
                    } else {
                        (base_date() + Days::days(*day)).to_string()
                    };
                    let amount = format!("{:.2}", *cents as f64 / 100.0);
                    RawLineItem::new(&date, &amount, desc)
                })
                .collect(),
            ..RawExtraction::default()
        };
        let normalizer = LineNormalizer::new().unwrap();
        let id = DocumentId::from("doc");
        let first = normalizer.normalize(&id, DocumentType::BankStatement, &raw);
        let second = normalizer.normalize(&id, DocumentType::BankStatement, &raw);
        prop_assert_eq!(&first.transactions, &second.transactions);

        let report = &first.report;
        prop_assert_eq!(report.total_lines, lines.len());
        prop_assert_eq!(report.accepted + report.skipped + report.zero_amount, report.total_lines);
        prop_assert_eq!(report.skipped, lines.iter().filter(|l| l.3).count());
        prop_assert!(first
            .transactions
            .windows(2)
            .all(|w| (w[0].date(), w[0].line_index()) <= (w[1].date(), w[1].line_index())));
    }
}
