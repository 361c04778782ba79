use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::ConfigError;

pub mod crs_policy;
pub use crs_policy::CrsPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    primary_path: PathBuf,
    secondary_path: PathBuf,
    primary_output_path: PathBuf,
    secondary_output_path: PathBuf,
    crs_policy: CrsPolicy,
}

// Deserializes a Config, rejecting empty paths and outputs that would clobber
// each other or one of the inputs.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            primary_path: PathBuf,
            secondary_path: PathBuf,
            primary_output_path: PathBuf,
            secondary_output_path: PathBuf,
            #[serde(default)]
            crs_policy: CrsPolicy,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        let config = Config {
            primary_path: helper.primary_path,
            secondary_path: helper.secondary_path,
            primary_output_path: helper.primary_output_path,
            secondary_output_path: helper.secondary_output_path,
            crs_policy: helper.crs_policy,
        };

        config.validate().map_err(D::Error::custom)?;

        Ok(config)
    }
}

impl Config {
    pub fn new<P: Into<PathBuf>>(
        primary_path: P,
        secondary_path: P,
        primary_output_path: P,
        secondary_output_path: P,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            primary_path: primary_path.into(),
            secondary_path: secondary_path.into(),
            primary_output_path: primary_output_path.into(),
            secondary_output_path: secondary_output_path.into(),
            crs_policy: CrsPolicy::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_crs_policy(mut self, crs_policy: CrsPolicy) -> Self {
        self.crs_policy = crs_policy;
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader)?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("primary_path", &self.primary_path),
            ("secondary_path", &self.secondary_path),
            ("primary_output_path", &self.primary_output_path),
            ("secondary_output_path", &self.secondary_output_path),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, p)| p.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyPath(*name));
        }

        if self.primary_output_path == self.secondary_output_path {
            return Err(ConfigError::DuplicateOutput);
        }

        for output in [&self.primary_output_path, &self.secondary_output_path] {
            if *output == self.primary_path || *output == self.secondary_path {
                return Err(ConfigError::OutputOverwritesInput(output.clone()));
            }
        }

        Ok(())
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn secondary_path(&self) -> &Path {
        &self.secondary_path
    }

    pub fn primary_output_path(&self) -> &Path {
        &self.primary_output_path
    }

    pub fn secondary_output_path(&self) -> &Path {
        &self.secondary_output_path
    }

    pub fn crs_policy(&self) -> CrsPolicy {
        self.crs_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, file_path)
    }

    #[test]
    fn test_from_file() {
        let (_dir, file_path) = write_config(
            r#"
    {
        "primary_path": "dhaka_ground_truth.tif",
        "secondary_path": "WB_padded.tif",
        "primary_output_path": "dhaka_ground_truth_masked.tif",
        "secondary_output_path": "WB_masked.tif"
    }
    "#,
        );

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.primary_path(), Path::new("dhaka_ground_truth.tif"));
        assert_eq!(config.secondary_path(), Path::new("WB_padded.tif"));
        assert_eq!(
            config.primary_output_path(),
            Path::new("dhaka_ground_truth_masked.tif")
        );
        assert_eq!(config.secondary_output_path(), Path::new("WB_masked.tif"));
        assert_eq!(config.crs_policy(), CrsPolicy::Reject);
    }

    #[test]
    fn test_crs_policy_is_read() {
        let (_dir, file_path) = write_config(
            r#"
    {
        "primary_path": "a.tif",
        "secondary_path": "b.tif",
        "primary_output_path": "a_out.tif",
        "secondary_output_path": "b_out.tif",
        "crs_policy": "reproject"
    }
    "#,
        );

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.crs_policy(), CrsPolicy::Reproject);
    }

    #[test]
    fn test_unknown_crs_policy_is_rejected() {
        let (_dir, file_path) = write_config(
            r#"
    {
        "primary_path": "a.tif",
        "secondary_path": "b.tif",
        "primary_output_path": "a_out.tif",
        "secondary_output_path": "b_out.tif",
        "crs_policy": "guess"
    }
    "#,
        );

        assert!(matches!(
            Config::from_file(file_path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let (_dir, file_path) = write_config(r#"{ "primary_path": "a.tif" }"#);

        assert!(matches!(
            Config::from_file(file_path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            Config::from_file(dir.path().join("nope.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Config::new("", "b.tif", "a_out.tif", "b_out.tif"),
            Err(ConfigError::EmptyPath("primary_path"))
        ));

        assert!(matches!(
            Config::new("a.tif", "b.tif", "out.tif", "out.tif"),
            Err(ConfigError::DuplicateOutput)
        ));

        assert!(matches!(
            Config::new("a.tif", "b.tif", "a_out.tif", "b.tif"),
            Err(ConfigError::OutputOverwritesInput(_))
        ));

        let config = Config::new("a.tif", "b.tif", "a_out.tif", "b_out.tif")
            .unwrap()
            .with_crs_policy(CrsPolicy::Reproject);
        assert_eq!(config.crs_policy(), CrsPolicy::Reproject);
    }
}
