use std::path::PathBuf;
use std::sync::OnceLock;

use config::Config;
use serde::{Deserialize, Serialize};

use crate::error::IfcError;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IfcConfig {
    // maximum creatable threads
    pub threads: usize,

    // public exponent, hex
    pub exponent: String,

    // default modulus bits
    pub bits: usize,

    // fresh seed retries after a generation exhausted its iteration bound
    pub retries: usize,
}

impl Default for IfcConfig {
    fn default() -> Self {
        Self {
            threads: (num_cpus::get() >> 1).max(1),
            exponent: "10001".to_string(),
            bits: 2048,
            retries: 8,
        }
    }
}

impl IfcConfig {
    pub fn config() -> &'static Self {
        Self::config_with_file(None)
    }

    /// The first call decides the configuration: defaults, then the config file `f`
    /// (or `$HOME/.ifcgen.json`), then the `IFCGEN__*` environment variables.
    pub fn config_with_file(f: Option<&str>) -> &'static Self {
        static CONFIG: OnceLock<IfcConfig> = OnceLock::new();

        CONFIG.get_or_init(|| {
            let default_file = home::home_dir().map(|h| h.join(".ifcgen.json"));
            let file = f
                .map(PathBuf::from)
                .or(default_file)
                .filter(|p| p.is_file());

            match Self::load(file.as_ref().and_then(|p| p.to_str())) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("{e}, use the default config");
                    Self::default()
                }
            }
        })
    }

    pub(crate) fn load(f: Option<&str>) -> Result<Self, IfcError> {
        let default_config = Config::try_from(&IfcConfig::default())
            .map_err(|e| IfcError::ConfigFailed(format!("{e}")))?;

        let mut config = Config::builder().add_source(default_config);
        if let Some(f) = f {
            config = config.add_source(config::File::with_name(f).required(false));
        }
        config = config.add_source(
            config::Environment::with_prefix("IFCGEN")
                .try_parsing(true)
                .separator("__"),
        );

        let config = config
            .build()
            .map_err(|e| IfcError::ConfigFailed(format!("load config failed: {e}")))?;
        let mut ifc_config: IfcConfig = config
            .try_deserialize()
            .map_err(|e| IfcError::ConfigFailed(format!("parse config failed: {e}")))?;

        ifc_config.threads = ifc_config.threads.max(1);

        log::trace!("{:?}", ifc_config);

        Ok(ifc_config)
    }
}

#[cfg(test)]
mod tests {
    use super::IfcConfig;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = IfcConfig::default();
        assert!(c.threads >= 1);
        assert_eq!((c.exponent.as_str(), c.bits, c.retries), ("10001", 2048, 8));
    }

    #[test]
    fn file_config() {
        let path = std::env::temp_dir().join(format!("ifcgen-config-{}.json", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{"bits": 3072, "retries": 2, "exponent": "1000000000000000000000001"}"#)
            .unwrap();
        drop(f);

        let c = IfcConfig::load(path.to_str()).unwrap();
        assert_eq!(c.exponent, "1000000000000000000000001");
        assert_eq!((c.bits, c.retries), (3072, 2));
        std::fs::remove_file(&path).unwrap();
    }
}
