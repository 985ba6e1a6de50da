use super::parts::{
    part_number, CONTENT_TYPES_PART, PRESENTATION_PART, PRESENTATION_RELS_PART,
    SLIDE_LAYOUT_PART_PREFIX,
};
use crate::utils::error::{DeckError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Every part of a template package, held in archive order.
#[derive(Debug, Clone)]
pub struct TemplatePackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl TemplatePackage {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DeckError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| DeckError::InvalidTemplate {
                message: format!("{} is not a presentation package: {}", path.display(), e),
            })?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push((entry.name().to_string(), data));
        }

        let package = Self { parts };
        for required in [CONTENT_TYPES_PART, PRESENTATION_PART, PRESENTATION_RELS_PART] {
            package.require(required)?;
        }
        tracing::debug!("Template {} has {} parts", path.display(), package.parts.len());
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.part(name).ok_or_else(|| DeckError::InvalidTemplate {
            message: format!("missing part {}", name),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn parts(&self) -> &[(String, Vec<u8>)] {
        &self.parts
    }

    /// Layout at 0-based `index`, else the lowest-numbered layout.
    pub fn slide_layout(&self, index: usize) -> Result<String> {
        let preferred = format!("{}{}.xml", SLIDE_LAYOUT_PART_PREFIX, index + 1);
        if self.contains(&preferred) {
            return Ok(preferred);
        }

        let fallback = self
            .part_names()
            .filter_map(|name| {
                part_number(name, SLIDE_LAYOUT_PART_PREFIX, ".xml").map(|n| (n, name))
            })
            .min()
            .map(|(_, name)| name.to_string())
            .ok_or_else(|| DeckError::InvalidTemplate {
                message: "template has no slide layouts".to_string(),
            })?;
        tracing::warn!(
            "Slide layout {} not found in template, using {}",
            index,
            fallback
        );
        Ok(fallback)
    }

    /// Highest `N` among parts named `<prefix>N<suffix>`.
    pub fn max_part_number(&self, prefix: &str, suffix: &str) -> u32 {
        self.part_names()
            .filter_map(|name| part_number(name, prefix, suffix))
            .max()
            .unwrap_or(0)
    }
}
