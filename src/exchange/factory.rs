use std::sync::Arc;

use crate::adapters::BinanceFuturesClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::signing::{ApiCredentials, HmacAuth};

use super::ExchangeGateway;

/// Create the runtime gateway from `AppConfig`.
///
/// Credentials are required in dry-run mode too; their absence is a
/// precondition failure reported before any parameter is validated.
pub fn build_gateway(app_config: &AppConfig, dry_run: bool) -> Result<Arc<dyn ExchangeGateway>> {
    let credentials = ApiCredentials::from_env(
        &app_config.credentials.api_key_env,
        &app_config.credentials.api_secret_env,
    )?;
    let client = BinanceFuturesClient::new(&app_config.exchange, HmacAuth::new(credentials), dry_run)?;
    Ok(Arc::new(client))
}
