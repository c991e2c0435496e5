//! Store settings endpoints.
//!
//! Reads return three views of the same state: the typed settings the
//! frontend binds forms to, the raw stored rows (including unknown keys
//! other tools wrote), and rendered previews of the numbering formats
//! so an admin sees "ORD-000001" while editing the pattern.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use backoffice_core::settings::SettingRow;
use backoffice_core::StoreSettings;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: StoreSettings,
    pub rows: Vec<SettingRow>,
    pub previews: NumberPreviews,
}

/// Next order/invoice/SKU numbers as they would print.
#[derive(Debug, Serialize)]
pub struct NumberPreviews {
    pub order: String,
    pub invoice: String,
    pub sku: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub updates: BTreeMap<String, String>,
}

/// `GET /api/settings`
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SettingsResponse>> {
    let rows = state.db.settings().all().await?;
    Ok(Json(respond(rows)))
}

/// `PUT /api/settings`
///
/// Validates every pair before writing anything, so a save is
/// all-or-nothing. Unknown keys pass through with length checks only;
/// known keys must parse into their typed form.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let mut validated = Vec::with_capacity(req.updates.len());
    for (key, value) in &req.updates {
        StoreSettings::validate_update(key, value)?;
        validated.push(SettingRow {
            key: key.clone(),
            value: value.clone(),
        });
    }

    state.db.settings().upsert_many(&validated).await?;
    info!(count = validated.len(), "Settings updated");

    let rows = state.db.settings().all().await?;
    Ok(Json(respond(rows)))
}

fn respond(rows: Vec<SettingRow>) -> SettingsResponse {
    let settings =
        StoreSettings::merge(rows.iter().map(|row| (row.key.as_str(), row.value.as_str())));

    let previews = NumberPreviews {
        order: settings.order_format.preview(1),
        invoice: settings.invoice_format.preview(1),
        sku: settings.sku_format.preview(1),
    };

    SettingsResponse {
        settings,
        rows,
        previews,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ApiError;
    use crate::testutil;

    fn updates(pairs: &[(&str, &str)]) -> Json<UpdateSettingsRequest> {
        Json(UpdateSettingsRequest {
            updates: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_fresh_database_serves_defaults_with_previews() {
        let state = testutil::state().await;

        let response = get_settings(State(state)).await.unwrap();

        assert!(response.0.rows.is_empty());
        assert_eq!(response.0.settings.currency.code, "USD");
        assert_eq!(response.0.previews.order, "ORD-000001");
        assert_eq!(response.0.previews.sku, "SKU-00001");
    }

    #[tokio::test]
    async fn test_update_round_trips_typed_values() {
        let state = testutil::state().await;

        let response = update_settings(
            State(state.clone()),
            updates(&[
                ("store.name", "Corner Mart"),
                ("currency.symbol", "€"),
                ("currency.decimals", "2"),
                ("numbering.order_format", "SO-{n:4}"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(response.0.settings.store_name, "Corner Mart");
        assert_eq!(response.0.settings.currency.symbol, "€");
        assert_eq!(response.0.previews.order, "SO-0001");
        assert_eq!(response.0.rows.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_value_rejects_whole_batch() {
        let state = testutil::state().await;

        let err = update_settings(
            State(state.clone()),
            updates(&[
                ("store.name", "Corner Mart"),
                ("currency.decimals", "nine"),
            ]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Nothing from the batch was stored.
        let after = get_settings(State(state)).await.unwrap();
        assert!(after.0.rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_keys_survive_saves() {
        let state = testutil::state().await;

        update_settings(State(state.clone()), updates(&[("plugin.theme", "dark")]))
            .await
            .unwrap();
        let response = update_settings(State(state), updates(&[("store.name", "Corner Mart")]))
            .await
            .unwrap();

        assert!(response
            .0
            .rows
            .iter()
            .any(|row| row.key == "plugin.theme" && row.value == "dark"));
    }
}
