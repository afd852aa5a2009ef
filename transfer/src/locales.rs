//! Locale discovery for both sides of a transfer.

use courier_engine::LocalesInfo;
use serde::Deserialize;

use crate::client::RemoteClient;
use crate::error::Result;
use crate::store::LocalStore;

/// One locale as the remote locale listing describes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocale {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_default: bool,
}

/// Assemble the locale settings of both systems.
///
/// The remote listing is advisory. When it cannot be fetched or parsed the
/// transfer proceeds as if the remote ran single-locale with the local
/// default, which disables locale filtering downstream.
pub async fn fetch_locales_info(
    store: &dyn LocalStore,
    client: &RemoteClient,
) -> Result<LocalesInfo> {
    let local_default = store.default_locale().await?;

    let locales: Vec<RemoteLocale> = match client.fetch("/i18n/locales").await {
        Ok(listing) => match serde_json::from_value(listing) {
            Ok(locales) => locales,
            Err(err) => {
                tracing::warn!("Failed to fetch available remote locales: {err}");
                return Ok(fallback(local_default));
            }
        },
        Err(err) => {
            tracing::warn!("Failed to fetch available remote locales: {err}");
            return Ok(fallback(local_default));
        }
    };

    let remote_default = locales
        .iter()
        .find(|locale| locale.is_default)
        .map(|locale| locale.code.clone())
        .unwrap_or_else(|| local_default.clone());
    let available = locales.into_iter().map(|locale| locale.code).collect();

    Ok(LocalesInfo::new(local_default, remote_default, available))
}

fn fallback(local_default: String) -> LocalesInfo {
    LocalesInfo::new(local_default.clone(), local_default, Vec::new())
}
