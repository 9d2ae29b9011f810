use sha2::{Digest, Sha256};
use ulid::Ulid;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

pub fn document_id_ulid() -> String {
    format!("doc_{}", Ulid::new())
}

pub fn dispute_id_ulid() -> String {
    format!("dsp_{}", Ulid::new())
}

/// Stable id for a normalized line: same document + same line content => same id.
pub fn transaction_id(document_id: &str, line_index: usize, date: &str, amount: f64, description: &str) -> String {
    let combined = format!(
        "{}|{}|{}|{}|{}",
        document_id,
        line_index,
        date,
        amount.to_bits(),
        description
    );
    let digest = sha256_hex(combined.as_bytes());
    format!("txn_{}", &digest[..16])
}

pub fn insight_id(document_id: &str, generation: u32, ordinal: usize) -> String {
    let digest = sha256_hex(format!("{}|{}|{}", document_id, generation, ordinal).as_bytes());
    format!("ins_{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_ids_are_deterministic() {
        let a = transaction_id("doc_1", 0, "2026-01-05", 12.5, "COFFEE");
        let b = transaction_id("doc_1", 0, "2026-01-05", 12.5, "COFFEE");
        let c = transaction_id("doc_1", 1, "2026-01-05", 12.5, "COFFEE");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("txn_"));
        assert_eq!(a.len(), 4 + 16);
    }

    #[test]
    fn ulid_ids_are_prefixed_and_unique() {
        let a = document_id_ulid();
        let b = document_id_ulid();
        assert!(a.starts_with("doc_"));
        assert_ne!(a, b);
        assert!(dispute_id_ulid().starts_with("dsp_"));
    }
}
