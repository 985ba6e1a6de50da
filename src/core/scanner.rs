//! Directory scanner for the `root/region/sub-region/business/<asset-dir>/` tree.

use crate::config::NamingConfig;
use crate::domain::events::ProgressEvent;
use crate::domain::model::{BusinessMap, BusinessRecord};
use crate::domain::ports::ProgressSink;
use crate::utils::error::{DeckError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// File-name patterns for one asset folder.
#[derive(Debug, Clone)]
pub struct AssetMatcher {
    venue_capture: String,
    price: Vec<Regex>,
    interior: Regex,
}

impl AssetMatcher {
    pub fn new(naming: &NamingConfig) -> Result<Self> {
        let price = naming
            .price_extensions
            .iter()
            .map(|ext| file_pattern(&naming.price_prefix, ext))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            venue_capture: naming.venue_capture.clone(),
            price,
            interior: file_pattern(&naming.interior_prefix, &naming.interior_extension)?,
        })
    }

    pub fn is_venue_capture(&self, file_name: &str) -> bool {
        file_name == self.venue_capture
    }

    /// Price images for the first extension that matches anything.
    pub fn price_images(&self, file_names: &[String]) -> Vec<String> {
        self.price
            .iter()
            .map(|pattern| self.collect_matches(pattern, file_names))
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    }

    pub fn interior_images(&self, file_names: &[String]) -> Vec<String> {
        self.collect_matches(&self.interior, file_names)
    }

    fn collect_matches(&self, pattern: &Regex, file_names: &[String]) -> Vec<String> {
        let mut matches: Vec<(IndexKey, &String)> = file_names
            .iter()
            .filter(|name| !self.is_venue_capture(name))
            .filter_map(|name| {
                let caps = pattern.captures(name)?;
                Some((IndexKey::parse(&caps[1]), name))
            })
            .collect();
        matches.sort();
        matches.into_iter().map(|(_, name)| name.clone()).collect()
    }
}

fn file_pattern(prefix: &str, extension: &str) -> Result<Regex> {
    let pattern = format!(
        r"^{}(.+)\.(?i:{})$",
        regex::escape(prefix),
        regex::escape(extension.trim_start_matches('.'))
    );
    Regex::new(&pattern).map_err(|e| DeckError::InvalidConfigValueError {
        field: "naming".to_string(),
        value: pattern,
        reason: e.to_string(),
    })
}

/// Numeric indexes sort numerically (`_2` before `_10`); anything else after, by text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum IndexKey {
    Numeric(u64),
    Text(String),
}

impl IndexKey {
    fn parse(raw: &str) -> Self {
        raw.parse::<u64>()
            .map(IndexKey::Numeric)
            .unwrap_or_else(|_| IndexKey::Text(raw.to_string()))
    }
}

pub struct DirectoryScanner {
    asset_dir: String,
    matcher: AssetMatcher,
}

impl DirectoryScanner {
    pub fn new(naming: &NamingConfig) -> Result<Self> {
        Ok(Self {
            asset_dir: naming.asset_dir.clone(),
            matcher: AssetMatcher::new(naming)?,
        })
    }

    /// Scans three directory levels below `root`. A missing root yields an empty map.
    pub fn scan<S: ProgressSink>(&self, root: &Path, sink: &mut S) -> BusinessMap {
        let mut businesses = BusinessMap::new();

        if !root.is_dir() {
            tracing::debug!("Image root not found: {}", root.display());
            sink.report(ProgressEvent::ImageRootMissing {
                root: root.to_path_buf(),
            });
            return businesses;
        }

        for (region, region_path) in subdirectories(root, sink) {
            for (district, district_path) in subdirectories(&region_path, sink) {
                tracing::debug!("Scanning {}/{}", region, district);
                for (name, business_path) in subdirectories(&district_path, sink) {
                    let Some(record) = self.scan_business(&name, &business_path, sink) else {
                        continue;
                    };
                    if let Some(replaced) = businesses.insert(record) {
                        sink.report(ProgressEvent::DuplicateBusiness {
                            name: name.clone(),
                            kept: business_path.clone(),
                            replaced: replaced.source_dir,
                        });
                    }
                }
            }
        }

        sink.report(ProgressEvent::BusinessesDiscovered {
            count: businesses.len(),
        });
        businesses
    }

    /// Builds the record for one business folder, or `None` when it has no assets.
    pub fn scan_business<S: ProgressSink>(
        &self,
        name: &str,
        business_dir: &Path,
        sink: &mut S,
    ) -> Option<BusinessRecord> {
        let asset_dir = business_dir.join(&self.asset_dir);
        if !asset_dir.is_dir() {
            tracing::debug!("No asset folder in {}", business_dir.display());
            return None;
        }

        let file_names = file_names(&asset_dir, sink);
        let mut record = BusinessRecord::new(name, business_dir);
        record.venue_capture = file_names
            .iter()
            .find(|f| self.matcher.is_venue_capture(f))
            .map(|f| asset_dir.join(f));
        record.price_images = join_all(&asset_dir, self.matcher.price_images(&file_names));
        record.interior_images = join_all(&asset_dir, self.matcher.interior_images(&file_names));

        record.has_assets().then_some(record)
    }
}

fn join_all(dir: &Path, names: Vec<String>) -> Vec<PathBuf> {
    names.into_iter().map(|name| dir.join(name)).collect()
}

/// Visible subdirectories sorted by name; unreadable entries are reported and skipped.
fn subdirectories<S: ProgressSink>(dir: &Path, sink: &mut S) -> Vec<(String, PathBuf)> {
    let mut dirs: Vec<(String, PathBuf)> = read_entries(dir, sink)
        .into_iter()
        .filter(|(name, path)| !name.starts_with('.') && path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn file_names<S: ProgressSink>(dir: &Path, sink: &mut S) -> Vec<String> {
    read_entries(dir, sink)
        .into_iter()
        .filter(|(_, path)| path.is_file())
        .map(|(name, _)| name)
        .collect()
}

fn read_entries<S: ProgressSink>(dir: &Path, sink: &mut S) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            skip(sink, dir.to_path_buf(), e.to_string());
            return Vec::new();
        }
    };

    let mut result = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skip(sink, dir.to_path_buf(), e.to_string());
                continue;
            }
        };
        let path = entry.path();
        match entry.file_name().into_string() {
            Ok(name) => result.push((name, path)),
            Err(_) => skip(sink, path, "file name is not valid UTF-8".to_string()),
        }
    }
    result
}

fn skip<S: ProgressSink>(sink: &mut S, path: PathBuf, reason: String) {
    tracing::debug!("Skipping {}: {}", path.display(), reason);
    sink.report(ProgressEvent::EntrySkipped { path, reason });
}
