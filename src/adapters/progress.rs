use crate::domain::events::{ProgressEvent, RunPhase};
use crate::domain::ports::ProgressSink;
use std::io::{self, Write};

/// Renders progress as human-readable lines; warnings go through `tracing`.
pub struct ConsoleProgress<W: Write> {
    out: W,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        // Console output is best-effort; a closed stdout must not stop the run.
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn report(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::PhaseEntered(RunPhase::Scanning) => {
                self.line(format_args!("🔍 Scanning image folders..."))
            }
            ProgressEvent::PhaseEntered(RunPhase::Resolving) => {
                self.line(format_args!("📋 Resolving business order..."))
            }
            ProgressEvent::PhaseEntered(RunPhase::Saving) => {
                self.line(format_args!("\n💾 Saving presentation..."))
            }
            ProgressEvent::PhaseEntered(phase) => tracing::debug!("Entered phase: {}", phase),
            ProgressEvent::BusinessesDiscovered { count } => {
                self.line(format_args!("Found {} businesses", count))
            }
            ProgressEvent::OrderLoaded { path, entries } => self.line(format_args!(
                "Loaded {} names from {}",
                entries,
                path.display()
            )),
            ProgressEvent::UnlistedBusinessAppended { name } => {
                self.line(format_args!("  + '{}' (not in order file, appended)", name))
            }
            ProgressEvent::BusinessStarted {
                index,
                total,
                name,
                price_images,
                interior_images,
                has_capture,
            } => self.line(format_args!(
                "\n[{}/{}] {} (capture: {}, price: {}, images: {})",
                index,
                total,
                name,
                if has_capture { "yes" } else { "no" },
                price_images,
                interior_images
            )),
            ProgressEvent::SlideAdded { kind, pictures } => {
                self.line(format_args!("  - {} slide ({} pictures)", kind, pictures))
            }
            ProgressEvent::Saved { path, slides } => self.line(format_args!(
                "✅ Saved {} slides to {}",
                slides,
                path.display()
            )),
            ProgressEvent::ImageRootMissing { root } => {
                tracing::warn!("Image root not found: {}", root.display())
            }
            ProgressEvent::EntrySkipped { path, reason } => {
                tracing::warn!("Skipped {}: {}", path.display(), reason)
            }
            ProgressEvent::DuplicateBusiness {
                name,
                kept,
                replaced,
            } => tracing::warn!(
                "Duplicate business '{}': using {}, ignoring {}",
                name,
                kept.display(),
                replaced.display()
            ),
            ProgressEvent::OrderFallback { reason } => {
                tracing::warn!("Using alphabetical order: {}", reason)
            }
            ProgressEvent::OrderEntryUnmatched { name } => {
                tracing::warn!("'{}' is in the order file but has no image folder", name)
            }
            ProgressEvent::OrderEntryRepeated { name } => {
                tracing::warn!("'{}' appears more than once in the order file", name)
            }
            ProgressEvent::ImageSkipped { path, reason } => {
                tracing::warn!("Image skipped ({}): {}", path.display(), reason)
            }
            ProgressEvent::PlacementFailed { target, reason } => {
                tracing::warn!("Could not place {}: {}", target, reason)
            }
        }
    }
}

/// Keeps every event; used by tests and by callers that post-process a run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<ProgressEvent>,
}

impl CollectingSink {
    pub fn warnings(&self) -> impl Iterator<Item = &ProgressEvent> {
        self.events.iter().filter(|e| e.is_warning())
    }
}

impl ProgressSink for CollectingSink {
    fn report(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::SlideKind;
    use std::path::PathBuf;

    #[test]
    fn test_console_lines() {
        let mut console = ConsoleProgress::new(Vec::new());
        console.report(ProgressEvent::BusinessStarted {
            index: 2,
            total: 89,
            name: "Alpha".to_string(),
            price_images: 2,
            interior_images: 5,
            has_capture: true,
        });
        console.report(ProgressEvent::SlideAdded {
            kind: SlideKind::PriceList,
            pictures: 2,
        });
        console.report(ProgressEvent::Saved {
            path: PathBuf::from("out.pptx"),
            slides: 7,
        });

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert!(text.contains("[2/89] Alpha (capture: yes, price: 2, images: 5)"));
        assert!(text.contains("  - price list slide (2 pictures)"));
        assert!(text.contains("Saved 7 slides to out.pptx"));
    }

    #[test]
    fn test_collecting_sink_filters_warnings() {
        let mut sink = CollectingSink::default();
        sink.report(ProgressEvent::BusinessesDiscovered { count: 1 });
        sink.report(ProgressEvent::OrderEntryUnmatched {
            name: "Ghost".to_string(),
        });
        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.warnings().count(), 1);
    }
}
