//! Position sources.
//!
//! Positions are owned by the on-chain program; this crate only reads
//! snapshots through [`PositionSource`]. The in-memory store backs local
//! simulation and tests, optionally seeded from a JSON file.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use sdai_common::error::AppError;
use sdai_common::types::Position;

/// Supplier of position snapshots.
pub trait PositionSource: Send + Sync {
    /// All positions owned by `owner`, oldest first.
    fn positions_for_owner(&self, owner: &str) -> Result<Vec<Position>, AppError>;

    /// A single position by id.
    fn position(&self, id: &str) -> Result<Option<Position>, AppError>;

    /// Record an updated snapshot of a position.
    fn store(&mut self, position: Position) -> Result<(), AppError>;
}

/// In-memory position store keyed by position id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPositionStore {
    positions: HashMap<String, Position>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self {
            positions: positions.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Load a JSON array of positions. Negative amounts are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let positions: Vec<Position> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid positions file {}: {}", path.display(), e))?;

        let negative = |p: &&Position| {
            [p.collateral_amount, p.debt_amount, p.stability_fee_accrued]
                .iter()
                .any(|amount| *amount < Decimal::ZERO)
        };
        if let Some(p) = positions.iter().find(negative) {
            anyhow::bail!(
                "Invalid positions file {}: position {} has a negative amount",
                path.display(),
                p.id
            );
        }

        tracing::info!(
            path = %path.display(),
            count = positions.len(),
            "Loaded positions"
        );
        Ok(Self::from_positions(positions))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl PositionSource for InMemoryPositionStore {
    fn positions_for_owner(&self, owner: &str) -> Result<Vec<Position>, AppError> {
        let mut owned: Vec<Position> = self
            .positions
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    fn position(&self, id: &str) -> Result<Option<Position>, AppError> {
        Ok(self.positions.get(id).cloned())
    }

    fn store(&mut self, position: Position) -> Result<(), AppError> {
        self.positions.insert(position.id.clone(), position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn position(id: &str, owner: &str, age_days: i64) -> Position {
        let created = Utc::now() - Duration::days(age_days);
        Position {
            id: id.to_string(),
            owner: owner.to_string(),
            collateral_type: "sol".to_string(),
            collateral_amount: dec!(10),
            debt_amount: dec!(900),
            created_at: created,
            last_updated_at: created,
            stability_fee_accrued: Decimal::ZERO,
        }
    }

    #[test]
    fn test_filters_by_owner_oldest_first() {
        let store = InMemoryPositionStore::from_positions(vec![
            position("cdp-2", "alice", 15),
            position("cdp-1", "alice", 30),
            position("cdp-3", "bob", 1),
        ]);

        let alice = store.positions_for_owner("alice").unwrap();
        let ids: Vec<&str> = alice.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["cdp-1", "cdp-2"]);
        assert!(store.positions_for_owner("carol").unwrap().is_empty());
    }

    #[test]
    fn test_store_replaces_snapshot() {
        let mut store = InMemoryPositionStore::from_positions(vec![position("cdp-1", "alice", 1)]);
        let mut updated = store.position("cdp-1").unwrap().unwrap();
        updated.debt_amount = dec!(100);
        store.store(updated).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.position("cdp-1").unwrap().unwrap().debt_amount, dec!(100));
        assert!(store.position("missing").unwrap().is_none());
    }

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sdai-positions-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_from_json_file() {
        let path = temp_path();
        let json = serde_json::json!([{
            "id": "cdp-1",
            "owner": "alice",
            "collateral_type": "msol",
            "collateral_amount": "5",
            "debt_amount": "500",
            "created_at": "2026-01-01T00:00:00Z",
            "last_updated_at": "2026-01-02T00:00:00Z",
            "stability_fee_accrued": "2.15"
        }]);
        std::fs::write(&path, json.to_string()).unwrap();

        let store = InMemoryPositionStore::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let p = store.position("cdp-1").unwrap().unwrap();
        assert_eq!(p.collateral_type, "msol");
        assert_eq!(p.stability_fee_accrued, dec!(2.15));
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let path = temp_path();
        std::fs::write(&path, "not json").unwrap();
        let result = InMemoryPositionStore::from_json_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file_rejects_negative_amounts() {
        let path = temp_path();
        let json = serde_json::json!([{
            "id": "cdp-neg",
            "owner": "alice",
            "collateral_type": "sol",
            "collateral_amount": "10",
            "debt_amount": "-500",
            "created_at": "2026-01-01T00:00:00Z",
            "last_updated_at": "2026-01-01T00:00:00Z",
            "stability_fee_accrued": "0"
        }]);
        std::fs::write(&path, json.to_string()).unwrap();

        let result = InMemoryPositionStore::from_json_file(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.err().unwrap().to_string();
        assert!(err.contains("cdp-neg"), "{}", err);
        assert!(err.contains("negative amount"), "{}", err);
    }
}
