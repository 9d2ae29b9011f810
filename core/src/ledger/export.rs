use super::model::Transaction;
use crate::error::CoreResult;

/// Renders transactions as CSV in (date, line) order with LF line endings.
pub fn render_transactions_csv(transactions: &[Transaction]) -> CoreResult<String> {
    let mut rows: Vec<&Transaction> = transactions.iter().collect();
    rows.sort_by(|a, b| (a.date(), a.line_index()).cmp(&(b.date(), b.line_index())));

    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record([
        "transaction_id",
        "date",
        "description",
        "direction",
        "amount",
        "category",
        "flagged",
        "flag_reason",
    ])?;
    for t in rows {
        wtr.write_record([
            t.id().to_string(),
            t.date().to_string(),
            t.description().to_string(),
            t.direction().as_str().to_string(),
            format!("{:.2}", t.amount()),
            t.category().map(|c| c.as_str().to_string()).unwrap_or_default(),
            t.is_flagged().to_string(),
            t.flag_reason().unwrap_or_default().to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).replace("\r\n", "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::categorizer::CategorySource;
    use crate::categorize::taxonomy::Category;
    use crate::documents::model::DocumentId;
    use crate::ledger::model::Direction;
    use time::macros::date;

    #[test]
    fn csv_is_sorted_and_quotes_commas() {
        let doc = DocumentId::from("doc_1");
        let later = Transaction::new(&doc, 0, date!(2026 - 01 - 09), 8.0, Direction::Debit, "Cafe, Downtown")
            .unwrap()
            .with_category(Category::Food, CategorySource::Keyword);
        let earlier = Transaction::new(&doc, 1, date!(2026 - 01 - 02), 1500.0, Direction::Credit, "Payroll").unwrap();
        let csv = render_transactions_csv(&[later, earlier]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "transaction_id,date,description,direction,amount,category,flagged,flag_reason"
        );
        assert!(lines[1].contains(",2026-01-02,Payroll,credit,1500.00,,false,"));
        assert!(lines[2].contains(",\"Cafe, Downtown\",debit,8.00,Food,false,"));
        assert!(!csv.contains('\r'));
    }
}
