use crate::error::StoreError;
use crate::model::{Config, Step};
use std::collections::HashSet;
use std::path::Path;

pub const CONFIGS_FILE: &str = "configs.json";

/// In-memory collection of configs, in creation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigStore {
    configs: Vec<Config>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configs(&self) -> &[Config] {
        &self.configs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Config> {
        self.configs.iter().find(|c| c.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Config, StoreError> {
        self.configs
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::UnknownConfig(name.to_string()))
    }

    fn check_index(config: &Config, index: usize) -> Result<(), StoreError> {
        if index < config.steps.len() {
            Ok(())
        } else {
            Err(StoreError::StepIndex { index, len: config.steps.len() })
        }
    }

    /// Create an empty config. The name is trimmed and must be unique.
    pub fn add_config(&mut self, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        tracing::debug!(config = name, "adding config");
        self.configs.push(Config::new(name));
        Ok(())
    }

    /// Append a default step and return its index.
    pub fn add_step(&mut self, config: &str) -> Result<usize, StoreError> {
        let cfg = self.get_mut(config)?;
        cfg.steps.push(Step::default());
        Ok(cfg.steps.len() - 1)
    }

    /// Replace the step at `index` wholesale.
    pub fn edit_step(&mut self, config: &str, index: usize, step: Step) -> Result<(), StoreError> {
        let cfg = self.get_mut(config)?;
        Self::check_index(cfg, index)?;
        cfg.steps[index] = step;
        Ok(())
    }

    pub fn delete_step(&mut self, config: &str, index: usize) -> Result<Step, StoreError> {
        let cfg = self.get_mut(config)?;
        Self::check_index(cfg, index)?;
        Ok(cfg.steps.remove(index))
    }

    /// Swap with the previous step. The first step stays put.
    pub fn move_step_up(&mut self, config: &str, index: usize) -> Result<(), StoreError> {
        let cfg = self.get_mut(config)?;
        Self::check_index(cfg, index)?;
        if index > 0 {
            cfg.steps.swap(index, index - 1);
        }
        Ok(())
    }

    /// Swap with the next step. The last step stays put.
    pub fn move_step_down(&mut self, config: &str, index: usize) -> Result<(), StoreError> {
        let cfg = self.get_mut(config)?;
        Self::check_index(cfg, index)?;
        if index + 1 < cfg.steps.len() {
            cfg.steps.swap(index, index + 1);
        }
        Ok(())
    }

    /// Load the collection from `path`. A missing or blank file yields an
    /// empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let corrupt = |reason: String| StoreError::Corrupt { path: path.to_path_buf(), reason };
        let configs: Vec<Config> = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        let mut seen = HashSet::new();
        for cfg in &configs {
            if !seen.insert(cfg.name.as_str()) {
                return Err(corrupt(format!("duplicate config name '{}'", cfg.name)));
            }
            for step in &cfg.steps {
                step.validate().map_err(|e| corrupt(format!("config '{}': {e}", cfg.name)))?;
            }
        }
        tracing::info!(path = %path.display(), count = configs.len(), "loaded configs");
        Ok(Self { configs })
    }

    /// Overwrite `path` with the full collection.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.configs)
            .map_err(|e| StoreError::Corrupt { path: path.to_path_buf(), reason: e.to_string() })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), count = self.configs.len(), "saved configs");
        Ok(())
    }
}
