//! Storage area master data (read-only)
//!
//! Area master data is owned elsewhere in the organization; the ledger
//! only reads display names and dead-stock defaults from it.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use shared::StorageArea;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AreaService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct AreaRow {
    id: i32,
    name: String,
    code: String,
    dead_stock: Option<Decimal>,
}

impl From<AreaRow> for StorageArea {
    fn from(row: AreaRow) -> Self {
        StorageArea {
            id: row.id,
            name: row.name,
            code: row.code,
            dead_stock: row.dead_stock.unwrap_or(Decimal::ZERO),
        }
    }
}

impl AreaService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<StorageArea>> {
        let rows = sqlx::query_as::<_, AreaRow>(
            "SELECT id, name, code, dead_stock FROM packing_plants ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StorageArea::from).collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<StorageArea> {
        let row = sqlx::query_as::<_, AreaRow>(
            "SELECT id, name, code, dead_stock FROM packing_plants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Storage area".to_string()))?;

        Ok(row.into())
    }
}
