use std::path::Path;

use pta_core::parse_number;
use pta_idf::token::sanitize;
use tracing::debug;

use crate::delimited::{lines, split_record};
use crate::{BcError, BcResult};

/// A solid material registered with the solver before assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// W/(m·K)
    pub conductivity: f64,
}

/// Materials artifact: a header line, then `name,conductivity` rows.
///
/// Names are stored with commas replaced, matching what a table cell can hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialList {
    materials: Vec<Material>,
}

impl MaterialList {
    pub fn new(materials: Vec<Material>) -> Self {
        let materials = materials
            .into_iter()
            .map(|m| Material {
                name: sanitize(&m.name),
                ..m
            })
            .collect();
        Self { materials }
    }

    pub fn from_csv(text: &str) -> BcResult<Self> {
        let mut materials = Vec::new();
        for (line, record) in lines(text).skip(1) {
            let cells =
                split_record(record).map_err(|message| BcError::Malformed { line, message })?;
            let [name, conductivity, ..] = cells.as_slice() else {
                return Err(BcError::Malformed {
                    line,
                    message: "expected name and conductivity".to_string(),
                });
            };
            let conductivity = parse_number(conductivity).ok_or_else(|| BcError::Malformed {
                line,
                message: format!("conductivity is not a number: {conductivity}"),
            })?;
            materials.push(Material {
                name: sanitize(name.trim()),
                conductivity,
            });
        }
        debug!(materials = materials.len(), "read materials");
        Ok(Self { materials })
    }

    pub fn read_csv(path: &Path) -> BcResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BcError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(&text)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn names(&self) -> Vec<String> {
        self.materials.iter().map(|m| m.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.iter().any(|m| m.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
