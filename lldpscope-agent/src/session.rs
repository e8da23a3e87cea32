//! Explicit per-invocation context handed to every component

use lldpscope_core::Result;
use std::path::PathBuf;

use crate::config::AgentConfig;
use crate::paths::RuntimePaths;

/// Validated configuration plus the runtime paths derived from it
#[derive(Debug, Clone)]
pub struct Session {
    config: AgentConfig,
    paths: RuntimePaths,
}

impl Session {
    /// Validate `config` and resolve paths against `runtime_dir` (or the
    /// executable's directory)
    pub fn new(config: AgentConfig, runtime_dir: Option<PathBuf>) -> Result<Self> {
        config.validate()?;
        let paths = RuntimePaths::resolve(runtime_dir, &config.neighbors_file)?;
        Ok(Self { config, paths })
    }

    pub fn with_paths(config: AgentConfig, paths: RuntimePaths) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, paths })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lldpscope_core::Error;

    #[test]
    fn test_session_validates_config() {
        let config = AgentConfig {
            interval: 1,
            ..Default::default()
        };
        assert!(matches!(
            Session::new(config, Some(PathBuf::from("/tmp"))),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_session_paths() {
        let session = Session::new(AgentConfig::default(), Some(PathBuf::from("/srv/lldp"))).unwrap();
        assert_eq!(
            session.paths().neighbors_file(),
            std::path::Path::new("/srv/lldp/neighbors.json")
        );
        assert_eq!(session.config().interval, 30);
    }
}
