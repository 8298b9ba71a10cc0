//! Voice registry: maps voice ids to Piper model configs and caches loaded
//! engines.

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::Context;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::engine::{PiperVoice, SpeechEngine};

/// One selectable voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// Path to the Piper model config JSON. Empty for voices registered
    /// directly through [`VoiceManager::install_engine`].
    #[serde(default)]
    pub config: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("unknown voice '{requested}'. Available voices: {available}")]
    UnknownVoice {
        requested: String,
        available: String,
    },

    #[error("no voices are configured")]
    NoVoices,

    #[error("failed to load voice '{voice}': {source}")]
    Load {
        voice: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Shape of `models/map.json`.
#[derive(Deserialize)]
struct MapFile {
    default_voice: Option<String>,
    voices: HashMap<String, VoiceEntry>,
}

pub struct VoiceManager {
    default_voice: Option<String>,
    voices: HashMap<String, VoiceEntry>,
    // voice id -> loaded engine; loading a Piper model takes seconds, so
    // engines are shared across jobs once loaded
    engines: DashMap<String, Arc<dyn SpeechEngine>>,
}

impl std::fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceManager")
            .field("default_voice", &self.default_voice)
            .field("voices", &self.voices)
            .field("loaded", &self.engines.len())
            .finish()
    }
}

impl VoiceManager {
    /// Create from a prebuilt map. When `default_voice` is `None` the first
    /// voice id in sorted order becomes the default.
    pub fn new(default_voice: Option<String>, voices: HashMap<String, VoiceEntry>) -> Self {
        let default_voice = default_voice.or_else(|| {
            let mut ids: Vec<&String> = voices.keys().collect();
            ids.sort();
            ids.first().map(|id| (*id).clone())
        });
        Self {
            default_voice,
            voices,
            engines: DashMap::new(),
        }
    }

    /// Load from a map file, typically `models/map.json`.
    pub fn from_mapfile<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to load {}", path.as_ref().display()))?;
        let map: MapFile = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid voice map", path.as_ref().display()))?;

        for (id, entry) in &map.voices {
            if entry.config.trim().is_empty() {
                anyhow::bail!("voice '{id}' has no 'config' path");
            }
        }
        if let Some(ref default) = map.default_voice {
            if !map.voices.contains_key(default) {
                anyhow::bail!("default_voice '{default}' is not in the voices map");
            }
        }

        info!(voices = map.voices.len(), "loaded voice map");
        Ok(Self::new(map.default_voice, map.voices))
    }

    /// Register a voice backed by an already-constructed engine, e.g. a
    /// non-Piper backend. Becomes the default when no default exists yet.
    pub fn install_engine(
        &mut self,
        id: &str,
        display_name: Option<String>,
        engine: Arc<dyn SpeechEngine>,
    ) {
        self.voices.insert(
            id.to_string(),
            VoiceEntry {
                config: String::new(),
                display_name,
            },
        );
        self.engines.insert(id.to_string(), engine);
        if self.default_voice.is_none() {
            self.default_voice = Some(id.to_string());
        }
    }

    /// Sorted list of voice ids.
    pub fn voice_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.voices.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted (id, entry) pairs for the detail listing.
    pub fn entries(&self) -> Vec<(String, VoiceEntry)> {
        let mut entries: Vec<(String, VoiceEntry)> = self
            .voices
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn default_voice(&self) -> Option<&str> {
        self.default_voice.as_deref()
    }

    /// Resolve the requested (or default) voice to an engine, loading and
    /// caching the Piper model on first use.
    pub fn engine_for(&self, voice: Option<&str>) -> Result<Arc<dyn SpeechEngine>, VoiceError> {
        let id = match voice {
            Some(v) => v,
            None => self.default_voice.as_deref().ok_or(VoiceError::NoVoices)?,
        };

        if let Some(engine) = self.engines.get(id) {
            return Ok(engine.value().clone());
        }

        let entry = self
            .voices
            .get(id)
            .ok_or_else(|| VoiceError::UnknownVoice {
                requested: id.to_string(),
                available: self.voice_ids().join(", "),
            })?;

        let loaded = PiperVoice::from_config_path(&entry.config).map_err(|source| {
            VoiceError::Load {
                voice: id.to_string(),
                source,
            }
        })?;
        info!(voice = id, sample_rate = loaded.sample_rate(), "loaded piper voice");

        let engine: Arc<dyn SpeechEngine> = Arc::new(loaded);
        self.engines.insert(id.to_string(), engine.clone());
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SampleBuffer;

    struct SilentEngine;

    impl SpeechEngine for SilentEngine {
        fn synthesize(&self, _text: &str) -> anyhow::Result<SampleBuffer> {
            Ok(SampleBuffer::new(vec![0.0; 8], 22050))
        }
    }

    #[test]
    fn unknown_voice_lists_the_alternatives() {
        let mut manager = VoiceManager::new(None, HashMap::new());
        manager.install_engine("alba", None, Arc::new(SilentEngine));
        manager.install_engine("ryan", None, Arc::new(SilentEngine));

        let err = manager.engine_for(Some("norman")).unwrap_err();
        match err {
            VoiceError::UnknownVoice {
                requested,
                available,
            } => {
                assert_eq!(requested, "norman");
                assert_eq!(available, "alba, ryan");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_registry_has_no_default() {
        let manager = VoiceManager::new(None, HashMap::new());
        assert!(matches!(
            manager.engine_for(None),
            Err(VoiceError::NoVoices)
        ));
    }

    #[test]
    fn first_installed_engine_becomes_the_default() {
        let mut manager = VoiceManager::new(None, HashMap::new());
        manager.install_engine("alba", Some("Alba".into()), Arc::new(SilentEngine));
        assert_eq!(manager.default_voice(), Some("alba"));
        assert!(manager.engine_for(None).is_ok());
    }

    #[test]
    fn mapfile_without_config_path_is_rejected() {
        let path = std::env::temp_dir().join("audiobook-voices-bad-map.json");
        fs::write(&path, r#"{"voices": {"alba": {"display_name": "Alba"}}}"#).unwrap();
        let err = VoiceManager::from_mapfile(&path).unwrap_err();
        assert!(err.to_string().contains("no 'config' path"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn mapfile_round_trips_default_and_entries() {
        let path = std::env::temp_dir().join("audiobook-voices-map.json");
        fs::write(
            &path,
            r#"{
                "default_voice": "ryan",
                "voices": {
                    "alba": {"config": "models/alba.onnx.json", "display_name": "Alba"},
                    "ryan": {"config": "models/ryan.onnx.json"}
                }
            }"#,
        )
        .unwrap();
        let manager = VoiceManager::from_mapfile(&path).unwrap();
        assert_eq!(manager.default_voice(), Some("ryan"));
        assert_eq!(manager.voice_ids(), vec!["alba", "ryan"]);
        let entries = manager.entries();
        assert_eq!(entries[0].1.config, "models/alba.onnx.json");
        let _ = fs::remove_file(&path);
    }
}
