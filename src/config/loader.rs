use crate::config::schema::{BenchConfig, OutputConfig};
use crate::error::{Error, Result};
use crate::output::{console::ConsoleReporter, csv::CsvReporter, json::JsonReporter, Reporter};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BenchConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        let merged = Self::load_with_inheritance(path, &mut visited)?;

        let mut config: BenchConfig = serde_json::from_value(merged)?;
        config.extends = None;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` and every file it `extends`, child keys overriding parent
    /// keys at any depth.
    fn load_with_inheritance(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Value> {
        let path = fs::canonicalize(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if visited.contains(&path) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }
        visited.insert(path.clone());

        let document = Self::load_file(&path)?;

        let parent_ref = document
            .get("extends")
            .and_then(Value::as_str)
            .map(str::to_string);

        match parent_ref {
            Some(parent_path_str) => {
                let parent_path = path
                    .parent()
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "Cannot determine parent directory for {}",
                            path.display()
                        ))
                    })?
                    .join(parent_path_str);

                let mut parent = Self::load_with_inheritance(&parent_path, visited)?;
                merge_values(&mut parent, document);
                Ok(parent)
            }
            None => Ok(document),
        }
    }

    fn load_file(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if content.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        let document: Value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported file extension: {}",
                    path.display()
                )))
            }
        };

        match document {
            Value::Object(_) => Ok(document),
            Value::Null => Ok(Value::Object(Default::default())),
            _ => Err(Error::Config(format!(
                "{}: top level must be a mapping",
                path.display()
            ))),
        }
    }

    pub fn create_reporters(
        config: &BenchConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Result<Vec<Box<dyn Reporter>>> {
        if config.outputs.is_empty() {
            return Ok(vec![Box::new(ConsoleReporter::new(multi))]);
        }

        let mut reporters: Vec<Box<dyn Reporter>> = Vec::with_capacity(config.outputs.len());
        for out_config in &config.outputs {
            let reporter: Box<dyn Reporter> = match out_config {
                OutputConfig::Console => Box::new(ConsoleReporter::new(multi.clone())),
                OutputConfig::Json { path } => Box::new(JsonReporter::new(PathBuf::from(path))?),
                OutputConfig::Csv { path } => Box::new(CsvReporter::new(PathBuf::from(path))?),
            };
            reporters.push(reporter);
        }
        Ok(reporters)
    }
}

fn merge_values(parent: &mut Value, child: Value) {
    match (parent, child) {
        (Value::Object(parent_map), Value::Object(child_map)) => {
            for (key, child_value) in child_map {
                match parent_map.get_mut(&key) {
                    Some(parent_value) => merge_values(parent_value, child_value),
                    None => {
                        parent_map.insert(key, child_value);
                    }
                }
            }
        }
        (parent, child) => *parent = child,
    }
}
