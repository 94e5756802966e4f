use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::enums::ResponseAction;

use super::export::AuditExport;
use super::types::{AlertError, AlertState, AlertStats, ClinicalAlert, UserResponse};

/// In-memory, per-session alert history backed by RwLock.
/// Alerts are only ever appended or flagged; nothing is removed until `clear_all`.
pub struct AlertStore {
    pub(crate) alerts: RwLock<Vec<ClinicalAlert>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<ClinicalAlert>>, AlertError> {
        self.alerts.read().map_err(|_| AlertError::LockFailed)
    }

    /// Write guard for callers that must dedupe and insert atomically.
    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<ClinicalAlert>>, AlertError> {
        self.alerts.write().map_err(|_| AlertError::LockFailed)
    }

    pub fn insert(&self, alert: ClinicalAlert) -> Result<(), AlertError> {
        self.write()?.push(alert);
        Ok(())
    }

    fn in_state(&self, state: AlertState) -> Result<Vec<ClinicalAlert>, AlertError> {
        Ok(self
            .read()?
            .iter()
            .filter(|a| a.state() == state)
            .cloned()
            .collect())
    }

    /// Alerts still awaiting a clinician response.
    pub fn active(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.in_state(AlertState::Active)
    }

    pub fn acknowledged(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.in_state(AlertState::Acknowledged)
    }

    pub fn overridden(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.in_state(AlertState::Overridden)
    }

    pub fn suppressed(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.in_state(AlertState::Suppressed)
    }

    /// Full history in insertion order (audit view).
    pub fn all(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        Ok(self.read()?.clone())
    }

    pub fn get(&self, alert_id: &Uuid) -> Result<Option<ClinicalAlert>, AlertError> {
        Ok(self.read()?.iter().find(|a| a.id == *alert_id).cloned())
    }

    pub fn len(&self) -> Result<usize, AlertError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AlertError> {
        Ok(self.read()?.is_empty())
    }

    /// Mark an active alert as seen.
    pub fn acknowledge(&self, alert_id: &Uuid, user_id: Option<&str>) -> Result<(), AlertError> {
        self.respond(alert_id, ResponseAction::Acknowledge, None, user_id, Utc::now())
    }

    /// Dismiss an active alert with a mandatory justification.
    pub fn override_alert(
        &self,
        alert_id: &Uuid,
        comment: &str,
        user_id: Option<&str>,
    ) -> Result<(), AlertError> {
        if comment.trim().is_empty() {
            return Err(AlertError::EmptyOverrideComment);
        }
        self.respond(
            alert_id,
            ResponseAction::Override,
            Some(comment.trim()),
            user_id,
            Utc::now(),
        )
    }

    fn respond(
        &self,
        alert_id: &Uuid,
        action: ResponseAction,
        comment: Option<&str>,
        user_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        let mut alerts = self.write()?;

        let alert = alerts
            .iter_mut()
            .find(|a| a.id == *alert_id)
            .ok_or(AlertError::AlertNotFound(*alert_id))?;

        match alert.state() {
            AlertState::Active => {}
            AlertState::Suppressed => return Err(AlertError::AlertSuppressed(*alert_id)),
            state => {
                return Err(AlertError::AlreadyResolved {
                    id: *alert_id,
                    state,
                })
            }
        }

        match action {
            ResponseAction::Acknowledge => alert.is_acknowledged = true,
            ResponseAction::Override => alert.is_overridden = true,
        }
        alert.user_response = Some(UserResponse {
            action,
            comment: comment.map(str::to_string),
            timestamp: at,
            user_id: user_id.map(str::to_string),
        });

        tracing::info!(
            alert_id = %alert_id,
            alert_type = alert.alert_type().as_str(),
            action = action.as_str(),
            user_id = user_id.unwrap_or("unknown"),
            "Alert resolved"
        );
        Ok(())
    }

    /// Counts over active alerts.
    pub fn stats(&self) -> Result<AlertStats, AlertError> {
        let alerts = self.read()?;
        Ok(AlertStats::from_alerts(alerts.iter().filter(|a| a.is_active())))
    }

    /// Session reset. Callers invoke this explicitly; nothing expires on its own.
    pub fn clear_all(&self) -> Result<(), AlertError> {
        let mut alerts = self.write()?;
        let cleared = alerts.len();
        alerts.clear();
        tracing::info!(cleared, "Alert store cleared");
        Ok(())
    }

    pub fn export(&self, exported_at: DateTime<Utc>) -> Result<AuditExport, AlertError> {
        Ok(AuditExport::new(self.all()?, exported_at))
    }

    /// Reload a previous export. The store must be empty and the export must
    /// pass [`AuditExport::validate`].
    pub fn restore(&self, export: AuditExport) -> Result<(), AlertError> {
        export.validate()?;
        let mut alerts = self.write()?;
        if !alerts.is_empty() {
            return Err(AlertError::StoreNotEmpty(alerts.len()));
        }
        let restored = export.alerts.len();
        *alerts = export.alerts;
        tracing::info!(restored, exported_at = %export.exported_at, "Alert store restored");
        Ok(())
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
