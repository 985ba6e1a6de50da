use crate::adapters::{FileImageProbe, PptxDocument};
use crate::config::DeckConfig;
use crate::core::emitter::SlideEmitter;
use crate::core::order::OrderResolver;
use crate::core::scanner::DirectoryScanner;
use crate::domain::events::{ProgressEvent, RunPhase};
use crate::domain::model::{BusinessRecord, RunMode, RunSummary};
use crate::domain::ports::{DocumentBuilder, ImageProbe, ProgressSink};
use crate::utils::error::{DeckError, Result};
use std::time::Instant;

/// Counts warnings on their way to the caller's sink.
struct CountingSink<'s, S: ProgressSink> {
    inner: &'s mut S,
    warnings: usize,
}

impl<'s, S: ProgressSink> CountingSink<'s, S> {
    fn new(inner: &'s mut S) -> Self {
        Self { inner, warnings: 0 }
    }
}

impl<S: ProgressSink> ProgressSink for CountingSink<'_, S> {
    fn report(&mut self, event: ProgressEvent) {
        if event.is_warning() {
            self.warnings += 1;
        }
        self.inner.report(event);
    }
}

fn advance<S: ProgressSink>(phase: &mut RunPhase, next: RunPhase, sink: &mut S) -> Result<()> {
    if !phase.can_advance_to(&next) {
        return Err(DeckError::document(format!("cannot move from {} to {}", phase, next)));
    }
    tracing::debug!("Phase: {} -> {}", phase, next);
    *phase = next;
    sink.report(ProgressEvent::PhaseEntered(next));
    Ok(())
}

/// Runs scan, ordering, emission and save for one deck.
pub struct DeckEngine<'a, P: ImageProbe> {
    config: &'a DeckConfig,
    probe: P,
    phase: RunPhase,
    businesses_found: usize,
    warnings: usize,
    started: Instant,
}

impl<'a, P: ImageProbe> DeckEngine<'a, P> {
    pub fn new(config: &'a DeckConfig, probe: P) -> Self {
        Self {
            config,
            probe,
            phase: RunPhase::Idle,
            businesses_found: 0,
            warnings: 0,
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Scans the image tree and resolves the emission order.
    pub fn prepare<S: ProgressSink>(&mut self, sink: &mut S) -> Result<Vec<BusinessRecord>> {
        let mut sink = CountingSink::new(sink);
        let config = self.config;
        let paths = &config.paths;

        advance(&mut self.phase, RunPhase::Scanning, &mut sink)?;
        let scanner = DirectoryScanner::new(&config.naming)?;
        let businesses = scanner.scan(&paths.image_root, &mut sink);
        self.businesses_found = businesses.len();
        tracing::info!(
            "Found {} businesses under {}",
            businesses.len(),
            paths.image_root.display()
        );

        advance(&mut self.phase, RunPhase::Resolving, &mut sink)?;
        let ordered = OrderResolver::new(&config.order).resolve(
            paths.order_file.as_deref(),
            businesses,
            &mut sink,
        );

        self.warnings += sink.warnings;
        Ok(ordered)
    }

    /// Emits the businesses selected by `mode` and saves the document.
    ///
    /// With nothing to emit the run ends without writing a file.
    pub fn emit<D, S>(
        &mut self,
        businesses: &[BusinessRecord],
        mode: RunMode,
        doc: &mut D,
        sink: &mut S,
    ) -> Result<RunSummary>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        let mut sink = CountingSink::new(sink);
        let config = self.config;
        let limit = mode.limit(businesses.len());
        let mut summary = RunSummary {
            businesses_found: self.businesses_found.max(businesses.len()),
            ..RunSummary::default()
        };

        if limit == 0 {
            tracing::warn!("No businesses to emit, nothing written");
            advance(&mut self.phase, RunPhase::Done, &mut sink)?;
            return Ok(self.finish(summary, sink.warnings));
        }

        let emitter =
            SlideEmitter::new(doc.slide_size(), &config.layout, &config.text, &self.probe);
        let cover = emitter.emit_deck_cover(doc, &mut sink)?;
        summary.slides_added += cover.slides;

        for (offset, business) in businesses.iter().take(limit).enumerate() {
            let index = offset + 1;
            advance(&mut self.phase, RunPhase::Emitting { index, total: limit }, &mut sink)?;
            sink.report(ProgressEvent::BusinessStarted {
                index,
                total: limit,
                name: business.name.clone(),
                price_images: business.price_images.len(),
                interior_images: business.interior_images.len(),
                has_capture: business.venue_capture.is_some(),
            });

            let stats = emitter.emit_business(doc, business, &mut sink)?;
            summary.slides_added += stats.slides;
            summary.pictures_placed += stats.pictures;
            summary.businesses_emitted += 1;
        }

        advance(&mut self.phase, RunPhase::Saving, &mut sink)?;
        let output = mode.output_path(&config.paths.output);
        doc.save(&output)?;
        sink.report(ProgressEvent::Saved {
            path: output.clone(),
            slides: doc.slide_count(),
        });
        summary.output_path = Some(output);

        advance(&mut self.phase, RunPhase::Done, &mut sink)?;
        Ok(self.finish(summary, sink.warnings))
    }

    /// `prepare` followed by `emit`.
    pub fn run<D, S>(&mut self, mode: RunMode, doc: &mut D, sink: &mut S) -> Result<RunSummary>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        let businesses = self.prepare(sink)?;
        self.emit(&businesses, mode, doc, sink)
    }

    fn finish(&mut self, mut summary: RunSummary, warnings: usize) -> RunSummary {
        self.warnings += warnings;
        summary.warnings = self.warnings;
        summary.elapsed = self.started.elapsed();
        tracing::info!(
            "Run finished: {} of {} businesses, {} slides, {} pictures, {} warnings in {:.2?}",
            summary.businesses_emitted,
            summary.businesses_found,
            summary.slides_added,
            summary.pictures_placed,
            summary.warnings,
            summary.elapsed
        );
        summary
    }
}

/// Opens the configured template and runs a whole deck against it.
///
/// The template is opened before anything is scanned, so a missing template
/// fails the run without touching the image tree.
pub fn build_deck<S: ProgressSink>(
    config: &DeckConfig,
    mode: RunMode,
    sink: &mut S,
) -> Result<RunSummary> {
    let mut doc = PptxDocument::open(&config.paths.template, config.layout.slide_layout_index)?;
    DeckEngine::new(config, FileImageProbe).run(mode, &mut doc, sink)
}
