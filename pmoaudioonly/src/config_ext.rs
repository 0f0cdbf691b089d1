//! Extension pour intégrer le mode audio dans pmoconfig
//!
//! Ce module fournit le trait `AudioOnlyConfigExt` (réglages
//! `audio_only.*`) et fait de `pmoconfig::Config` un [`FlagStore`] : les
//! drapeaux sont rangés sous `audio_only.state` et survivent donc au
//! rechargement de la page.
//!
//! # Exemple
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmoaudioonly::AudioOnlyConfigExt;
//!
//! let config = get_config();
//! let settings = config.audio_only_settings().unwrap();
//! println!("Blocking {}", settings.seek_preview_pattern);
//! ```

use crate::controller::{AudioOnlySettings, DEFAULT_BANNER_HINT, DEFAULT_BANNER_TITLE};
use crate::error::{ModeError, Result as ModeResult};
use crate::host::{AudioModeBanner, FlagStore};
use crate::view::DEFAULT_BACKDROP_OPACITY;
use anyhow::Result;
use pmobilibili::SEEK_PREVIEW_PATTERN;
use pmoconfig::Config;
use serde_yaml::Value;

const STATE_PATH: [&str; 2] = ["audio_only", "state"];

/// Trait d'extension pour les réglages du mode audio
///
/// Comme pour les autres extensions, les getters persistent la valeur par
/// défaut quand la clé manque ou est invalide.
pub trait AudioOnlyConfigExt {
    /// Motif des requêtes d'aperçu à bloquer (default: `api.bilibili.com/x/player/videoshot`)
    fn get_seek_preview_pattern(&self) -> Result<String>;

    fn set_seek_preview_pattern(&self, pattern: &str) -> Result<()>;

    /// Opacité de la pochette affichée à la place de la vidéo, entre 0 et 1
    fn get_backdrop_opacity(&self) -> Result<f32>;

    fn set_backdrop_opacity(&self, opacity: f32) -> Result<()>;

    fn get_banner_title(&self) -> Result<String>;

    fn set_banner_title(&self, title: &str) -> Result<()>;

    fn get_banner_hint(&self) -> Result<String>;

    fn set_banner_hint(&self, hint: &str) -> Result<()>;

    /// Rassemble tous les réglages du mode audio
    fn audio_only_settings(&self) -> Result<AudioOnlySettings>;
}

fn string_or_default(config: &Config, path: &[&str], default: &str) -> Result<String> {
    match config.get_value(path) {
        Ok(Value::String(s)) => Ok(s),
        _ => {
            config.set_value(path, Value::String(default.to_string()))?;
            Ok(default.to_string())
        }
    }
}

impl AudioOnlyConfigExt for Config {
    fn get_seek_preview_pattern(&self) -> Result<String> {
        string_or_default(
            self,
            &["audio_only", "seek_preview_pattern"],
            SEEK_PREVIEW_PATTERN,
        )
    }

    fn set_seek_preview_pattern(&self, pattern: &str) -> Result<()> {
        self.set_value(
            &["audio_only", "seek_preview_pattern"],
            Value::String(pattern.to_string()),
        )
    }

    fn get_backdrop_opacity(&self) -> Result<f32> {
        let stored = match self.get_value(&["audio_only", "backdrop_opacity"]) {
            Ok(Value::Number(n)) => n.as_f64().filter(|o| (0.0..=1.0).contains(o)),
            _ => None,
        };
        match stored {
            Some(opacity) => Ok(opacity as f32),
            None => {
                self.set_backdrop_opacity(DEFAULT_BACKDROP_OPACITY)?;
                Ok(DEFAULT_BACKDROP_OPACITY)
            }
        }
    }

    fn set_backdrop_opacity(&self, opacity: f32) -> Result<()> {
        // Passer par la chaîne évite d'écrire 0.30000001192092896
        let value = opacity.to_string().parse::<f64>()?;
        self.set_value(
            &["audio_only", "backdrop_opacity"],
            Value::Number(serde_yaml::Number::from(value)),
        )
    }

    fn get_banner_title(&self) -> Result<String> {
        string_or_default(self, &["audio_only", "banner_title"], DEFAULT_BANNER_TITLE)
    }

    fn set_banner_title(&self, title: &str) -> Result<()> {
        self.set_value(
            &["audio_only", "banner_title"],
            Value::String(title.to_string()),
        )
    }

    fn get_banner_hint(&self) -> Result<String> {
        string_or_default(self, &["audio_only", "banner_hint"], DEFAULT_BANNER_HINT)
    }

    fn set_banner_hint(&self, hint: &str) -> Result<()> {
        self.set_value(
            &["audio_only", "banner_hint"],
            Value::String(hint.to_string()),
        )
    }

    fn audio_only_settings(&self) -> Result<AudioOnlySettings> {
        Ok(AudioOnlySettings {
            seek_preview_pattern: self.get_seek_preview_pattern()?,
            backdrop_opacity: self.get_backdrop_opacity()?,
            banner: AudioModeBanner {
                title: self.get_banner_title()?,
                hint: self.get_banner_hint()?,
            },
        })
    }
}

impl FlagStore for Config {
    fn set_flag(&self, key: &str) -> ModeResult<()> {
        let [section, state] = STATE_PATH;
        self.set_value(&[section, state, key], Value::Bool(true))
            .map_err(ModeError::store)
    }

    fn take_flag(&self, key: &str) -> ModeResult<bool> {
        let [section, state] = STATE_PATH;
        self.take_bool(&[section, state, key])
            .map_err(ModeError::store)
    }
}
