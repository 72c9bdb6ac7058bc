//! Application reset between scenarios.
//!
//! Scenarios share the application's persistent data. [`NoReset`] keeps that
//! ordering dependency (later scenarios see earlier products); `ApiReset`
//! (feature `reset-api`) empties the product table through the REST API
//! before each scenario.

use crate::config::ResetConfig;
use crate::result::{RegressionError, RegressionResult};
use async_trait::async_trait;
#[cfg(feature = "reset-api")]
use serde::Deserialize;
#[cfg(feature = "reset-api")]
use tracing::{debug, info};

/// Puts the application into a known state before a scenario
#[async_trait]
pub trait AppReset: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Reset the application
    async fn reset(&self) -> RegressionResult<()>;
}

/// Leaves application data untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReset;

#[async_trait]
impl AppReset for NoReset {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn reset(&self) -> RegressionResult<()> {
        Ok(())
    }
}

/// The reset configured in `config`, [`NoReset`] when none is
///
/// # Errors
///
/// Returns [`RegressionError::Config`] when an API URL is set but the crate
/// was built without the `reset-api` feature.
pub fn from_config(config: &ResetConfig) -> RegressionResult<Box<dyn AppReset>> {
    match config.api_url {
        #[cfg(feature = "reset-api")]
        Some(ref url) => Ok(Box::new(ApiReset::new(url.clone()))),
        #[cfg(not(feature = "reset-api"))]
        Some(_) => Err(RegressionError::Config {
            message: "reset.api_url needs the `reset-api` feature".to_string(),
        }),
        None => Ok(Box::new(NoReset)),
    }
}

#[cfg(feature = "reset-api")]
#[derive(Debug, Deserialize)]
struct ProductId {
    id: serde_json::Value,
}

/// Deletes every product through `{api_url}/products`
#[cfg(feature = "reset-api")]
#[derive(Debug, Clone)]
pub struct ApiReset {
    client: reqwest::Client,
    api_url: String,
}

#[cfg(feature = "reset-api")]
impl ApiReset {
    /// Reset against the API rooted at `api_url` (e.g. `http://localhost:3000/api`)
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Products collection URL
    #[must_use]
    pub fn products_url(&self) -> String {
        format!("{}/products", self.api_url)
    }

    fn reset_error(message: impl std::fmt::Display) -> RegressionError {
        RegressionError::Reset {
            message: message.to_string(),
        }
    }
}

/// Render an id as it appears in a path segment
#[cfg(feature = "reset-api")]
fn id_segment(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(feature = "reset-api")]
#[async_trait]
impl AppReset for ApiReset {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn reset(&self) -> RegressionResult<()> {
        let url = self.products_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::reset_error)?;
        if !response.status().is_success() {
            return Err(Self::reset_error(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }
        let products: Vec<ProductId> = response.json().await.map_err(Self::reset_error)?;

        for product in &products {
            let target = format!("{url}/{}", id_segment(&product.id));
            let status = self
                .client
                .delete(&target)
                .send()
                .await
                .map_err(Self::reset_error)?
                .status();
            // already gone is fine
            if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                return Err(Self::reset_error(format!("DELETE {target} returned {status}")));
            }
            debug!(url = %target, "product deleted");
        }
        info!(deleted = products.len(), "application reset");
        Ok(())
    }
}
