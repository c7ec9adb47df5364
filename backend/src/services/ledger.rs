//! Packing-plant stock ledger: in-memory period store and persistence
//!
//! The store holds at most one row set per (plant, year, month) and is
//! the single source of truth for the API, the reconciliation engine,
//! and the save scheduler. Mutations go through an explicit command API
//! (`select_period`, `edit_cell`, `set_opening_balance`, `merge_import`)
//! with a recompute step after each command; nothing recomputes
//! implicitly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::{
    apply_derivation, life_stock, validate_period, validate_quantity, BalanceObservation,
    DailyStockRow, ImportedRow, PeriodKey, SaveStatus, StockField, StorageArea,
};

use crate::error::{AppError, AppResult};

/// One persisted row of `packing_plant_stock`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRecord {
    pub plant_id: i32,
    pub tanggal: NaiveDate,
    pub stok_diterima: Option<Decimal>,
    pub stok_keluar: Option<Decimal>,
    pub stok_akhir: Option<Decimal>,
    pub dead_stock: Option<Decimal>,
    pub life_stock: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for editing one cell of a daily row
#[derive(Debug, Deserialize)]
pub struct EditCellInput {
    pub field: StockField,
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
}

/// Snapshot of a period handed to the API and the exporters
#[derive(Debug, Clone, Serialize)]
pub struct PeriodView {
    pub key: PeriodKey,
    pub rows: Vec<DailyStockRow>,
    pub opening_balance: Option<Decimal>,
    pub pending_changes: bool,
}

/// Outcome of a whole-period recompute
#[derive(Debug, Clone, Copy)]
pub struct RecomputeOutcome {
    /// Any derived value changed from what the store held
    pub changed: bool,
    /// Any derived value differs from the last known-saved value
    pub changed_since_saved: bool,
}

#[derive(Debug)]
struct PeriodState {
    rows: Vec<DailyStockRow>,
    /// Manual prior-closing-balance override, used when the previous
    /// period is neither in the store nor persisted
    opening_balance: Option<Decimal>,
    dead_stock: Decimal,
    pending_changes: bool,
    /// Received values as last loaded from or written to the backing
    /// store, keyed by date
    saved_received: HashMap<NaiveDate, Decimal>,
}

/// Ledger service: period store plus the queries that feed and drain it
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    store: Arc<RwLock<HashMap<PeriodKey, PeriodState>>>,
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PeriodKey, PeriodState>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PeriodKey, PeriodState>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place a period directly into the store, bypassing the database
    /// load path.
    #[cfg(test)]
    pub(crate) fn seed_period(&self, key: PeriodKey, rows: Vec<DailyStockRow>) {
        self.write().insert(
            key,
            PeriodState {
                rows,
                opening_balance: None,
                dead_stock: Decimal::ZERO,
                pending_changes: false,
                saved_received: HashMap::new(),
            },
        );
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Load (or lazily create) the period for one area and month, derive
    /// the received quantities, and return a snapshot.
    pub async fn select_period(
        &self,
        area: &StorageArea,
        year: i32,
        month: u32,
    ) -> AppResult<PeriodView> {
        validate_period(year, month).map_err(|msg| AppError::ValidationError(msg.to_string()))?;
        let key = PeriodKey::new(area.id, year, month);

        if !self.contains(key) {
            self.load_period(area, key).await?;
        }

        let prior = self.resolve_prior_closing(key).await?;
        {
            let mut store = self.write();
            if let Some(state) = store.get_mut(&key) {
                apply_derivation(&mut state.rows, prior);
            }
        }

        self.view(key).ok_or_else(|| AppError::NotFound("Period".to_string()))
    }

    /// Edit one cell of a daily row. The derived columns are refreshed
    /// before returning, so the caller always sees reconciled values.
    pub async fn edit_cell(
        &self,
        key: PeriodKey,
        date: NaiveDate,
        input: EditCellInput,
    ) -> AppResult<DailyStockRow> {
        tracing::debug!(%key, %date, field = input.field.as_str(), "edit cell");
        if !key.contains(date) {
            return Err(AppError::Validation {
                field: "date".to_string(),
                message: "Date is outside the selected period".to_string(),
                message_id: "Tanggal di luar periode yang dipilih".to_string(),
            });
        }

        {
            let mut store = self.write();
            let state = store
                .get_mut(&key)
                .ok_or_else(|| AppError::NotFound("Period".to_string()))?;

            match input.field {
                StockField::QuantityOut | StockField::QuantityEnd => {
                    if let Some(quantity) = input.quantity {
                        validate_quantity(quantity)
                            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
                    }
                    let row = find_row_mut(&mut state.rows, date)?;
                    if input.field == StockField::QuantityOut {
                        row.quantity_out = input.quantity;
                    } else {
                        row.quantity_end = input.quantity;
                    }
                    row.save_status = SaveStatus::Idle;
                }
                StockField::DeadStock => {
                    let quantity = input.quantity.ok_or_else(|| {
                        AppError::ValidationError("dead_stock requires a quantity".to_string())
                    })?;
                    validate_quantity(quantity)
                        .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
                    // Dead stock is constant within a period
                    state.dead_stock = quantity;
                    for row in &mut state.rows {
                        row.dead_stock = quantity;
                        row.save_status = SaveStatus::Idle;
                    }
                }
                StockField::Notes => {
                    let row = find_row_mut(&mut state.rows, date)?;
                    row.notes = input.notes.filter(|text| !text.is_empty());
                    row.save_status = SaveStatus::Idle;
                }
            }
            state.pending_changes = true;
        }

        let prior = self.resolve_prior_closing(key).await?;
        let mut store = self.write();
        let state = store
            .get_mut(&key)
            .ok_or_else(|| AppError::NotFound("Period".to_string()))?;
        apply_derivation(&mut state.rows, prior);
        Ok(find_row_mut(&mut state.rows, date)?.clone())
    }

    /// Set or clear the manual opening balance for a period that has no
    /// locally or persistently available previous period.
    pub async fn set_opening_balance(
        &self,
        key: PeriodKey,
        value: Option<Decimal>,
    ) -> AppResult<PeriodView> {
        if let Some(balance) = value {
            validate_quantity(balance)
                .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
        }

        {
            let mut store = self.write();
            let state = store
                .get_mut(&key)
                .ok_or_else(|| AppError::NotFound("Period".to_string()))?;
            state.opening_balance = value;
            state.pending_changes = true;
        }

        self.recompute(key).await?;
        self.view(key).ok_or_else(|| AppError::NotFound("Period".to_string()))
    }

    /// Overlay imported rows onto the period. Local-only: nothing is
    /// persisted until a save is scheduled or explicitly requested.
    pub async fn merge_import(&self, key: PeriodKey, rows: &[ImportedRow]) -> AppResult<usize> {
        let merged = {
            let mut store = self.write();
            let state = store
                .get_mut(&key)
                .ok_or_else(|| AppError::NotFound("Period".to_string()))?;

            let mut merged = 0usize;
            for imported in rows.iter().filter(|r| key.contains(r.date)) {
                let Ok(row) = find_row_mut(&mut state.rows, imported.date) else {
                    continue;
                };
                row.quantity_out = imported.quantity_out;
                row.quantity_end = imported.quantity_end;
                if let Some(notes) = &imported.notes {
                    row.notes = Some(notes.clone());
                }
                row.save_status = SaveStatus::Idle;
                merged += 1;
            }

            // The sheet may carry a dead-stock column; the last value
            // wins and applies to the whole period
            if let Some(dead) = rows.iter().rev().find_map(|r| r.dead_stock) {
                state.dead_stock = dead;
                for row in &mut state.rows {
                    row.dead_stock = dead;
                }
            }

            if merged > 0 {
                state.pending_changes = true;
            }
            merged
        };

        if merged > 0 {
            self.recompute(key).await?;
        }
        Ok(merged)
    }

    /// Recompute every derived value of the period from current store
    /// state, reporting whether anything changed.
    pub async fn recompute(&self, key: PeriodKey) -> AppResult<RecomputeOutcome> {
        let prior = self.resolve_prior_closing(key).await?;
        let mut store = self.write();
        let state = store
            .get_mut(&key)
            .ok_or_else(|| AppError::NotFound("Period".to_string()))?;

        let changed = apply_derivation(&mut state.rows, prior);
        let changed_since_saved = state.rows.iter().any(|row| {
            row.quantity_received
                != state
                    .saved_received
                    .get(&row.date)
                    .copied()
                    .unwrap_or(Decimal::ZERO)
        });
        if changed_since_saved {
            state.pending_changes = true;
        }

        Ok(RecomputeOutcome {
            changed,
            changed_since_saved,
        })
    }

    // ------------------------------------------------------------------
    // Prior closing balance
    // ------------------------------------------------------------------

    /// The closing balance feeding the first row of the period.
    ///
    /// Resolution order: last reported balance of the previous period in
    /// the store, then the last persisted balance of the previous month,
    /// then the manual opening balance, then zero.
    pub async fn resolve_prior_closing(&self, key: PeriodKey) -> AppResult<Decimal> {
        let prev = key.previous();

        {
            let store = self.read();
            if let Some(state) = store.get(&prev) {
                if let Some(balance) = state.rows.iter().rev().find_map(|r| r.quantity_end) {
                    return Ok(balance);
                }
            }
        }

        if let (Some(first), Some(last)) = (prev.first_day(), prev.last_day()) {
            let persisted: Option<Decimal> = sqlx::query_scalar(
                r#"
                SELECT stok_akhir FROM packing_plant_stock_view
                WHERE plant_id = $1 AND tanggal BETWEEN $2 AND $3 AND stok_akhir IS NOT NULL
                ORDER BY tanggal DESC
                LIMIT 1
                "#,
            )
            .bind(prev.plant_id)
            .bind(first)
            .bind(last)
            .fetch_optional(&self.db)
            .await?;

            if let Some(balance) = persisted {
                return Ok(balance);
            }
        }

        let opening = self.read().get(&key).and_then(|s| s.opening_balance);
        Ok(opening.unwrap_or(Decimal::ZERO))
    }

    // ------------------------------------------------------------------
    // Store access for the scheduler and the views
    // ------------------------------------------------------------------

    pub fn contains(&self, key: PeriodKey) -> bool {
        self.read().contains_key(&key)
    }

    pub fn view(&self, key: PeriodKey) -> Option<PeriodView> {
        let store = self.read();
        store.get(&key).map(|state| PeriodView {
            key,
            rows: state.rows.clone(),
            opening_balance: state.opening_balance,
            pending_changes: state.pending_changes,
        })
    }

    pub fn row_snapshot(&self, key: PeriodKey, date: NaiveDate) -> Option<DailyStockRow> {
        let store = self.read();
        store
            .get(&key)
            .and_then(|state| state.rows.iter().find(|r| r.date == date).cloned())
    }

    pub fn set_row_status(&self, key: PeriodKey, date: NaiveDate, status: SaveStatus) {
        let mut store = self.write();
        if let Some(state) = store.get_mut(&key) {
            if let Some(row) = state.rows.iter_mut().find(|r| r.date == date) {
                row.save_status = status;
            }
        }
    }

    pub fn set_period_status(&self, key: PeriodKey, status: SaveStatus) {
        let mut store = self.write();
        if let Some(state) = store.get_mut(&key) {
            for row in &mut state.rows {
                row.save_status = status;
            }
        }
    }

    /// Record a successful single-row write.
    pub fn mark_row_saved(&self, key: PeriodKey, date: NaiveDate) {
        let mut store = self.write();
        if let Some(state) = store.get_mut(&key) {
            if let Some(row) = state.rows.iter_mut().find(|r| r.date == date) {
                row.save_status = SaveStatus::Saved;
                state.saved_received.insert(date, row.quantity_received);
            }
        }
    }

    /// Record a successful whole-period write: statuses, the saved
    /// snapshot, and the pending-changes flag all reset.
    pub fn mark_period_saved(&self, key: PeriodKey) {
        let mut store = self.write();
        if let Some(state) = store.get_mut(&key) {
            state.saved_received.clear();
            for row in &mut state.rows {
                row.save_status = SaveStatus::Saved;
                state.saved_received.insert(row.date, row.quantity_received);
            }
            state.pending_changes = false;
        }
    }

    /// A failed write leaves the locally edited values in place and the
    /// pending-changes flag set; only the statuses change.
    pub fn mark_period_error(&self, key: PeriodKey) {
        let mut store = self.write();
        if let Some(state) = store.get_mut(&key) {
            for row in &mut state.rows {
                row.save_status = SaveStatus::Error;
            }
            state.pending_changes = true;
        }
    }

    // ------------------------------------------------------------------
    // Backing store
    // ------------------------------------------------------------------

    async fn load_period(&self, area: &StorageArea, key: PeriodKey) -> AppResult<()> {
        let (Some(first), Some(last)) = (key.first_day(), key.last_day()) else {
            return Err(AppError::ValidationError(format!(
                "Invalid period {}-{}",
                key.year, key.month
            )));
        };

        let records = self.fetch_records(key.plant_id, first, last).await?;
        let by_date: HashMap<NaiveDate, &StockRecord> =
            records.iter().map(|r| (r.tanggal, r)).collect();

        let dead_stock = records
            .iter()
            .rev()
            .find_map(|r| r.dead_stock)
            .unwrap_or(area.dead_stock);

        let mut saved_received = HashMap::new();
        let rows: Vec<DailyStockRow> = key
            .days()
            .into_iter()
            .map(|date| {
                let mut row = DailyStockRow::empty(date, dead_stock);
                if let Some(record) = by_date.get(&date) {
                    row.quantity_out = record.stok_keluar;
                    row.quantity_end = record.stok_akhir;
                    row.quantity_received = record.stok_diterima.unwrap_or(Decimal::ZERO);
                    row.dead_stock = record.dead_stock.unwrap_or(dead_stock);
                    row.life_stock = record
                        .life_stock
                        .unwrap_or_else(|| life_stock(record.stok_akhir, row.dead_stock));
                    row.notes = record.notes.clone();
                    row.save_status = SaveStatus::Saved;
                    saved_received.insert(date, row.quantity_received);
                }
                row
            })
            .collect();

        let mut store = self.write();
        store.entry(key).or_insert(PeriodState {
            rows,
            opening_balance: None,
            dead_stock,
            pending_changes: false,
            saved_received,
        });
        Ok(())
    }

    pub async fn fetch_records(
        &self,
        plant_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<StockRecord>> {
        let records = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT plant_id, tanggal, stok_diterima, stok_keluar, stok_akhir,
                   dead_stock, life_stock, notes
            FROM packing_plant_stock_view
            WHERE plant_id = $1 AND tanggal BETWEEN $2 AND $3
            ORDER BY tanggal ASC
            "#,
        )
        .bind(plant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Closing-balance series for the forecast, ascending, at most
    /// `limit` observations ending at the newest persisted day.
    pub async fn closing_series(
        &self,
        plant_id: i32,
        limit: i64,
    ) -> AppResult<Vec<BalanceObservation>> {
        let rows = sqlx::query_as::<_, (NaiveDate, Decimal)>(
            r#"
            SELECT tanggal, stok_akhir
            FROM packing_plant_stock_view
            WHERE plant_id = $1 AND stok_akhir IS NOT NULL
            ORDER BY tanggal DESC
            LIMIT $2
            "#,
        )
        .bind(plant_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let mut series: Vec<BalanceObservation> = rows
            .into_iter()
            .map(|(date, balance)| BalanceObservation { date, balance })
            .collect();
        series.reverse();
        Ok(series)
    }

    pub fn to_record(&self, plant_id: i32, row: &DailyStockRow) -> StockRecord {
        StockRecord {
            plant_id,
            tanggal: row.date,
            stok_diterima: Some(row.quantity_received),
            stok_keluar: row.quantity_out,
            stok_akhir: row.quantity_end,
            dead_stock: Some(row.dead_stock),
            life_stock: Some(row.life_stock),
            notes: row.notes.clone(),
        }
    }

    /// Upsert one row keyed by (plant_id, tanggal). A write always
    /// supplies every column; there is no partial-row merge.
    pub async fn upsert_row(&self, record: &StockRecord) -> AppResult<()> {
        sqlx::query(UPSERT_SQL)
            .bind(record.plant_id)
            .bind(record.tanggal)
            .bind(record.stok_diterima)
            .bind(record.stok_keluar)
            .bind(record.stok_akhir)
            .bind(record.dead_stock)
            .bind(record.life_stock)
            .bind(&record.notes)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Batched upsert for a whole period, in one transaction.
    pub async fn upsert_rows(&self, records: &[StockRecord]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        for record in records {
            sqlx::query(UPSERT_SQL)
                .bind(record.plant_id)
                .bind(record.tanggal)
                .bind(record.stok_diterima)
                .bind(record.stok_keluar)
                .bind(record.stok_akhir)
                .bind(record.dead_stock)
                .bind(record.life_stock)
                .bind(&record.notes)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Full replace for the explicit "save to server" action: delete the
    /// period's date range, then insert the freshly computed set.
    pub async fn replace_period(
        &self,
        key: PeriodKey,
        records: &[StockRecord],
    ) -> AppResult<()> {
        let (Some(first), Some(last)) = (key.first_day(), key.last_day()) else {
            return Err(AppError::ValidationError(format!(
                "Invalid period {}-{}",
                key.year, key.month
            )));
        };

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM packing_plant_stock WHERE plant_id = $1 AND tanggal BETWEEN $2 AND $3")
            .bind(key.plant_id)
            .bind(first)
            .bind(last)
            .execute(&mut *tx)
            .await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO packing_plant_stock
                    (plant_id, tanggal, stok_diterima, stok_keluar, stok_akhir,
                     dead_stock, life_stock, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(record.plant_id)
            .bind(record.tanggal)
            .bind(record.stok_diterima)
            .bind(record.stok_keluar)
            .bind(record.stok_akhir)
            .bind(record.dead_stock)
            .bind(record.life_stock)
            .bind(&record.notes)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

const UPSERT_SQL: &str = r#"
    INSERT INTO packing_plant_stock
        (plant_id, tanggal, stok_diterima, stok_keluar, stok_akhir,
         dead_stock, life_stock, notes)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (plant_id, tanggal)
    DO UPDATE SET stok_diterima = EXCLUDED.stok_diterima,
                  stok_keluar = EXCLUDED.stok_keluar,
                  stok_akhir = EXCLUDED.stok_akhir,
                  dead_stock = EXCLUDED.dead_stock,
                  life_stock = EXCLUDED.life_stock,
                  notes = EXCLUDED.notes,
                  updated_at = now()
"#;

fn find_row_mut(rows: &mut [DailyStockRow], date: NaiveDate) -> AppResult<&mut DailyStockRow> {
    rows.iter_mut()
        .find(|r| r.date == date)
        .ok_or_else(|| AppError::NotFound("Row".to_string()))
}
