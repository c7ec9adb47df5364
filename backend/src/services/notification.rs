//! In-app notification service
//!
//! Persists user-facing notifications for save failures and import
//! warnings. Recording is best-effort: a notification that cannot be
//! written is logged and dropped rather than failing the operation it
//! reports on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Notification type enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::Type)]
#[sqlx(type_name = "ledger_notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SaveFailed,
    ImportWarning,
    System,
}

/// A persisted in-app notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub plant_id: Option<i32>,
    pub title: String,
    pub title_id: String,
    pub message: String,
    pub message_id: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a persistence failure for a row or period.
    pub async fn record_save_failure(&self, plant_id: i32, what: &str) {
        self.record(
            NotificationType::SaveFailed,
            Some(plant_id),
            "Stock save failed",
            "Penyimpanan stok gagal",
            &format!("Saving {} failed; the edited values are kept locally", what),
            &format!(
                "Penyimpanan {} gagal; nilai yang diubah tetap tersimpan lokal",
                what
            ),
        )
        .await;
    }

    /// Record the skipped sheets/rows of a workbook import.
    pub async fn record_import_warning(&self, plant_id: Option<i32>, detail: &str) {
        self.record(
            NotificationType::ImportWarning,
            plant_id,
            "Import skipped some data",
            "Sebagian data impor dilewati",
            detail,
            detail,
        )
        .await;
    }

    async fn record(
        &self,
        notification_type: NotificationType,
        plant_id: Option<i32>,
        title: &str,
        title_id: &str,
        message: &str,
        message_id: &str,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO ledger_notifications
                (notification_type, plant_id, title, title_id, message, message_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&notification_type)
        .bind(plant_id)
        .bind(title)
        .bind(title_id)
        .bind(message)
        .bind(message_id)
        .execute(&self.db)
        .await;

        if let Err(error) = result {
            tracing::warn!(%error, "failed to record notification");
        }
    }

    /// List notifications, newest first.
    pub async fn list(&self, unread_only: bool) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, notification_type, plant_id, title, title_id,
                   message, message_id, read_at, created_at
            FROM ledger_notifications
            WHERE $1 = false OR read_at IS NULL
            ORDER BY created_at DESC
            LIMIT 200
            "#,
        )
        .bind(unread_only)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE ledger_notifications SET read_at = NOW() WHERE id = $1 AND read_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::AppError::NotFound("Notification".to_string()));
        }
        Ok(())
    }
}
