//! Extension pour intégrer Bilibili dans pmoconfig
//!
//! Ce module fournit le trait `BilibiliConfigExt` qui ajoute à
//! `pmoconfig::Config` les réglages du client API (`sources.bilibili.*`).
//!
//! # Exemple
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmobilibili::BilibiliConfigExt;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let client = config.bilibili_client_builder()?.build().await?;
//! println!("API base: {}", client.api_base());
//! # Ok(())
//! # }
//! ```

use crate::client::{
    ClientBuilder, DASH_FNVAL, DEFAULT_API_BASE, DEFAULT_REFERER, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

/// Trait d'extension pour gérer la configuration Bilibili dans pmoconfig
///
/// # Auto-persist des valeurs par défaut
///
/// Les getters persistent automatiquement les valeurs par défaut dans la
/// configuration si elles n'existent pas encore.
pub trait BilibiliConfigExt {
    /// URL de base de l'API (default: `https://api.bilibili.com`)
    fn get_bilibili_api_base(&self) -> Result<String>;

    fn set_bilibili_api_base(&self, api_base: &str) -> Result<()>;

    /// Valeur du header `Referer` envoyé avec chaque requête
    fn get_bilibili_referer(&self) -> Result<String>;

    fn set_bilibili_referer(&self, referer: &str) -> Result<()>;

    /// Timeout des requêtes en secondes (default: 30)
    fn get_bilibili_timeout_secs(&self) -> Result<u64>;

    fn set_bilibili_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Drapeau de négociation de format (default: 16, DASH)
    fn get_bilibili_fnval(&self) -> Result<u32>;

    fn set_bilibili_fnval(&self, fnval: u32) -> Result<()>;

    /// Construit un `ClientBuilder` à partir de la configuration
    fn bilibili_client_builder(&self) -> Result<ClientBuilder>;
}

impl BilibiliConfigExt for Config {
    fn get_bilibili_api_base(&self) -> Result<String> {
        match self.get_value(&["sources", "bilibili", "api_base"]) {
            Ok(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => {
                self.set_bilibili_api_base(DEFAULT_API_BASE)?;
                Ok(DEFAULT_API_BASE.to_string())
            }
        }
    }

    fn set_bilibili_api_base(&self, api_base: &str) -> Result<()> {
        self.set_value(
            &["sources", "bilibili", "api_base"],
            Value::String(api_base.to_string()),
        )
    }

    fn get_bilibili_referer(&self) -> Result<String> {
        match self.get_value(&["sources", "bilibili", "referer"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => {
                self.set_bilibili_referer(DEFAULT_REFERER)?;
                Ok(DEFAULT_REFERER.to_string())
            }
        }
    }

    fn set_bilibili_referer(&self, referer: &str) -> Result<()> {
        self.set_value(
            &["sources", "bilibili", "referer"],
            Value::String(referer.to_string()),
        )
    }

    fn get_bilibili_timeout_secs(&self) -> Result<u64> {
        match self.get_value(&["sources", "bilibili", "timeout_secs"]) {
            Ok(Value::Number(n)) => match n.as_u64().filter(|secs| *secs > 0) {
                Some(secs) => Ok(secs),
                None => {
                    self.set_bilibili_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)?;
                    Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
                }
            },
            _ => {
                self.set_bilibili_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)?;
                Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
            }
        }
    }

    fn set_bilibili_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["sources", "bilibili", "timeout_secs"],
            Value::Number(serde_yaml::Number::from(secs)),
        )
    }

    fn get_bilibili_fnval(&self) -> Result<u32> {
        match self.get_value(&["sources", "bilibili", "fnval"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(fnval) => Ok(fnval),
                None => {
                    self.set_bilibili_fnval(DASH_FNVAL)?;
                    Ok(DASH_FNVAL)
                }
            },
            _ => {
                self.set_bilibili_fnval(DASH_FNVAL)?;
                Ok(DASH_FNVAL)
            }
        }
    }

    fn set_bilibili_fnval(&self, fnval: u32) -> Result<()> {
        self.set_value(
            &["sources", "bilibili", "fnval"],
            Value::Number(serde_yaml::Number::from(fnval)),
        )
    }

    fn bilibili_client_builder(&self) -> Result<ClientBuilder> {
        Ok(ClientBuilder::new()
            .api_base(self.get_bilibili_api_base()?)
            .referer(self.get_bilibili_referer()?)
            .timeout(Duration::from_secs(self.get_bilibili_timeout_secs()?))
            .fnval(self.get_bilibili_fnval()?))
    }
}
