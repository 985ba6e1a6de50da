//! Business ordering from an external spreadsheet.

use crate::config::OrderConfig;
use crate::domain::events::ProgressEvent;
use crate::domain::model::{BusinessMap, BusinessRecord};
use crate::domain::ports::ProgressSink;
use crate::utils::error::{DeckError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashSet;
use std::path::Path;

pub struct OrderResolver<'a> {
    config: &'a OrderConfig,
}

impl<'a> OrderResolver<'a> {
    pub fn new(config: &'a OrderConfig) -> Self {
        Self { config }
    }

    /// Orders `businesses` by the spreadsheet, falling back to alphabetical
    /// order when there is no usable spreadsheet.
    pub fn resolve<S: ProgressSink>(
        &self,
        order_file: Option<&Path>,
        businesses: BusinessMap,
        sink: &mut S,
    ) -> Vec<BusinessRecord> {
        let Some(path) = order_file else {
            tracing::debug!("No order file configured, using alphabetical order");
            return businesses.into_sorted();
        };

        if !path.is_file() {
            fallback(sink, format!("order file not found: {}", path.display()));
            return businesses.into_sorted();
        }

        match self.load_names(path) {
            Ok(names) => {
                tracing::debug!("Loaded {} names from {}", names.len(), path.display());
                sink.report(ProgressEvent::OrderLoaded {
                    path: path.to_path_buf(),
                    entries: names.len(),
                });
                reconcile(&names, businesses, sink)
            }
            Err(e) => {
                fallback(sink, format!("failed to read {}: {}", path.display(), e));
                businesses.into_sorted()
            }
        }
    }

    /// Trimmed, non-empty names from the configured column, after the header rows.
    pub fn load_names(&self, path: &Path) -> Result<Vec<String>> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            self.load_csv(path)
        } else {
            self.load_workbook(path)
        }
    }

    /// 0-based index of the 1-based `name_column`.
    fn column_index(&self) -> Result<usize> {
        self.config
            .name_column
            .checked_sub(1)
            .ok_or_else(|| DeckError::InvalidConfigValueError {
                field: "order.name_column".to_string(),
                value: self.config.name_column.to_string(),
                reason: "columns are numbered from 1".to_string(),
            })
    }

    fn load_workbook(&self, path: &Path) -> Result<Vec<String>> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DeckError::ConfigError {
                message: format!("{} contains no worksheets", path.display()),
            })??;

        let (Some((start_row, _)), Some((end_row, _))) = (range.start(), range.end()) else {
            return Ok(Vec::new());
        };

        let column = self.column_index()? as u32;
        let first_row = (self.config.header_rows as u32).max(start_row);

        Ok((first_row..=end_row)
            .filter_map(|row| range.get_value((row, column)))
            .filter_map(cell_text)
            .collect())
    }

    fn load_csv(&self, path: &Path) -> Result<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let column = self.column_index()?;
        let mut names = Vec::new();
        for record in reader.records().skip(self.config.header_rows) {
            let record = record?;
            if let Some(name) = record.get(column).map(str::trim).filter(|s| !s.is_empty()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn fallback<S: ProgressSink>(sink: &mut S, reason: String) {
    tracing::debug!("Using alphabetical order: {}", reason);
    sink.report(ProgressEvent::OrderFallback { reason });
}

/// Listed names first in listed order, then unlisted businesses alphabetically.
///
/// Listed names with no scanned folder are reported and dropped; a name listed
/// twice keeps its first position.
pub fn reconcile<S: ProgressSink>(
    desired: &[String],
    businesses: BusinessMap,
    sink: &mut S,
) -> Vec<BusinessRecord> {
    let mut remaining = businesses;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for name in desired {
        if !seen.insert(name.as_str()) {
            sink.report(ProgressEvent::OrderEntryRepeated { name: name.clone() });
            continue;
        }
        match remaining.remove(name) {
            Some(record) => ordered.push(record),
            None => {
                tracing::debug!("'{}' is listed but has no image folder", name);
                sink.report(ProgressEvent::OrderEntryUnmatched { name: name.clone() });
            }
        }
    }

    for (name, record) in remaining {
        tracing::debug!("Appending '{}' (not in order file)", name);
        sink.report(ProgressEvent::UnlistedBusinessAppended { name });
        ordered.push(record);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::progress::CollectingSink;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn map(names: &[&str]) -> BusinessMap {
        names.iter().map(|n| BusinessRecord::new(*n, *n)).collect()
    }

    fn order_of(records: &[BusinessRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_reconcile_keeps_listed_order_and_appends_rest() {
        let desired: Vec<String> =
            ["Cedar", "Ghost", "Alder"].iter().map(|s| s.to_string()).collect();
        let mut sink = CollectingSink::default();
        let ordered = reconcile(&desired, map(&["Alder", "Birch", "Cedar", "Aspen"]), &mut sink);

        assert_eq!(order_of(&ordered), vec!["Cedar", "Alder", "Aspen", "Birch"]);
        assert!(sink
            .events
            .contains(&ProgressEvent::OrderEntryUnmatched { name: "Ghost".into() }));
        assert!(sink
            .events
            .contains(&ProgressEvent::UnlistedBusinessAppended { name: "Aspen".into() }));
    }

    #[test]
    fn test_reconcile_repeated_name_appears_once() {
        let desired: Vec<String> =
            ["Birch", "Alder", "Birch"].iter().map(|s| s.to_string()).collect();
        let mut sink = CollectingSink::default();
        let ordered = reconcile(&desired, map(&["Alder", "Birch"]), &mut sink);

        assert_eq!(order_of(&ordered), vec!["Birch", "Alder"]);
        assert!(sink
            .events
            .contains(&ProgressEvent::OrderEntryRepeated { name: "Birch".into() }));
    }

    #[test]
    fn test_no_order_file_is_alphabetical() {
        let config = OrderConfig::default();
        let mut sink = CollectingSink::default();
        let ordered = OrderResolver::new(&config).resolve(None, map(&["b", "c", "a"]), &mut sink);
        assert_eq!(order_of(&ordered), vec!["a", "b", "c"]);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_missing_order_file_falls_back() {
        let config = OrderConfig::default();
        let mut sink = CollectingSink::default();
        let ordered = OrderResolver::new(&config).resolve(
            Some(Path::new("/no/such/order.xlsx")),
            map(&["b", "a"]),
            &mut sink,
        );
        assert_eq!(order_of(&ordered), vec!["a", "b"]);
        assert!(matches!(sink.events[0], ProgressEvent::OrderFallback { .. }));
    }

    #[test]
    fn test_corrupt_workbook_falls_back() {
        let mut file = NamedTempFile::with_suffix(".xlsx").unwrap();
        file.write_all(b"this is not a workbook").unwrap();

        let config = OrderConfig::default();
        let mut sink = CollectingSink::default();
        let ordered =
            OrderResolver::new(&config).resolve(Some(file.path()), map(&["b", "a"]), &mut sink);
        assert_eq!(order_of(&ordered), vec!["a", "b"]);
        assert!(matches!(sink.events[0], ProgressEvent::OrderFallback { .. }));
    }

    #[test]
    fn test_csv_reads_third_column_after_header() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "no,region,name,link").unwrap();
        writeln!(file, "1,중구,  Birch  ,http://x").unwrap();
        writeln!(file, "2,중구,,http://y").unwrap();
        writeln!(file, "3,중구,Alder").unwrap();
        writeln!(file, "4").unwrap();

        let config = OrderConfig::default();
        let names = OrderResolver::new(&config).load_names(file.path()).unwrap();
        assert_eq!(names, vec!["Birch".to_string(), "Alder".to_string()]);
    }

    #[test]
    fn test_zero_name_column_falls_back() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "no,region,name").unwrap();
        writeln!(file, "1,중구,b").unwrap();

        let config = OrderConfig {
            name_column: 0,
            ..OrderConfig::default()
        };
        let resolver = OrderResolver::new(&config);
        assert!(matches!(
            resolver.load_names(file.path()),
            Err(DeckError::InvalidConfigValueError { .. })
        ));

        let mut sink = CollectingSink::default();
        let ordered = resolver.resolve(Some(file.path()), map(&["b", "a"]), &mut sink);
        assert_eq!(order_of(&ordered), vec!["a", "b"]);
        assert!(matches!(sink.events[0], ProgressEvent::OrderFallback { .. }));
    }
}
