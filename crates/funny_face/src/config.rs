//! Prop catalog configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use funny_face_api::PropStatus;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog contains no props")]
    Empty,
    #[error("prop {0} has an empty name")]
    EmptyName(usize),
    #[error("duplicate prop name: {0}")]
    DuplicateName(String),
}

/// Node names of the joints driven by face tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigNames {
    pub left_eyelid: String,
    pub right_eyelid: String,
    pub jaw: String,
}

impl Default for RigNames {
    fn default() -> Self {
        Self {
            left_eyelid: "eyeLid_L".to_string(),
            right_eyelid: "eyeLid_R".to_string(),
            jaw: "jaw".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    pub name: String,
    /// Asset path of the glTF scene. `#Scene0` is assumed when no label is given.
    pub scene: String,
    #[serde(default)]
    pub rig: Option<RigNames>,
}

impl PropDefinition {
    fn new(name: &str, scene: &str, rig: Option<RigNames>) -> Self {
        Self {
            name: name.to_string(),
            scene: scene.to_string(),
            rig,
        }
    }

    pub fn scene_path(&self) -> String {
        if self.scene.contains('#') {
            self.scene.clone()
        } else {
            format!("{}#Scene0", self.scene)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct PropCatalog {
    props: Vec<PropDefinition>,
}

impl Default for PropCatalog {
    fn default() -> Self {
        Self {
            props: vec![
                PropDefinition::new("eyes", "props/eyes.glb", None),
                PropDefinition::new("glasses", "props/glasses.glb", None),
                PropDefinition::new("mustache", "props/mustache.glb", None),
                PropDefinition::new("robot", "props/robot.glb", Some(RigNames::default())),
            ],
        }
    }
}

impl PropCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadFile {
            path: path.to_owned(),
            source,
        })?;
        let catalog = Self::parse(&contents)?;
        tracing::info!("loaded {} props from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        let catalog: Self = toml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.props.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, prop) in self.props.iter().enumerate() {
            if prop.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(index));
            }
            if !seen.insert(prop.name.as_str()) {
                return Err(CatalogError::DuplicateName(prop.name.clone()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn get(&self, index: usize) -> Option<&PropDefinition> {
        self.props.get(index)
    }

    pub fn status(&self, index: usize) -> PropStatus {
        PropStatus {
            index,
            count: self.len(),
            name: self.get(index).map(|p| p.name.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_four_props_with_rigged_robot() {
        let catalog = PropCatalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.len(), 4);
        let robot = catalog.get(3).unwrap();
        assert_eq!(robot.name, "robot");
        assert_eq!(robot.rig, Some(RigNames::default()));
        assert!(catalog.get(0).unwrap().rig.is_none());
    }

    #[test]
    fn parses_catalog_with_partial_rig() {
        let catalog = PropCatalog::parse(r#"
            [[props]]
            name = "robot"
            scene = "props/robot.glb#Scene1"

            [props.rig]
            jaw = "Jaw_Bone"
        "#).unwrap();

        let robot = catalog.get(0).unwrap();
        assert_eq!(robot.scene_path(), "props/robot.glb#Scene1");
        let rig = robot.rig.as_ref().unwrap();
        assert_eq!(rig.jaw, "Jaw_Bone");
        assert_eq!(rig.left_eyelid, "eyeLid_L");
    }

    #[test]
    fn scene_label_defaults_to_first_scene() {
        let prop = PropDefinition::new("eyes", "props/eyes.glb", None);
        assert_eq!(prop.scene_path(), "props/eyes.glb#Scene0");
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(PropCatalog::parse("props = []"), Err(CatalogError::Empty)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = PropCatalog::parse(r#"
            [[props]]
            name = "eyes"
            scene = "a.glb"

            [[props]]
            name = "eyes"
            scene = "b.glb"
        "#);
        assert!(matches!(result, Err(CatalogError::DuplicateName(name)) if name == "eyes"));
    }

    #[test]
    fn rejects_blank_names() {
        let result = PropCatalog::parse(r#"
            [[props]]
            name = " "
            scene = "a.glb"
        "#);
        assert!(matches!(result, Err(CatalogError::EmptyName(0))));
    }

    #[test]
    fn status_reports_name_and_count() {
        let status = PropCatalog::default().status(1);
        assert_eq!(status, PropStatus { index: 1, count: 4, name: "glasses".to_string() });
    }
}
