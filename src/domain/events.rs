use std::fmt;
use std::path::PathBuf;

/// Stages of a single run. A run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning,
    Resolving,
    /// 1-based position of the business being emitted.
    Emitting { index: usize, total: usize },
    Saving,
    Done,
}

impl RunPhase {
    fn rank(&self) -> (u8, usize) {
        match self {
            RunPhase::Idle => (0, 0),
            RunPhase::Scanning => (1, 0),
            RunPhase::Resolving => (2, 0),
            RunPhase::Emitting { index, .. } => (3, *index),
            RunPhase::Saving => (4, 0),
            RunPhase::Done => (5, 0),
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: &RunPhase) -> bool {
        match (self, next) {
            (RunPhase::Emitting { index: a, .. }, RunPhase::Emitting { index: b, .. }) => {
                *b == a + 1
            }
            (_, RunPhase::Emitting { index, .. }) => *index == 1 && self.rank() < next.rank(),
            _ => self.rank() < next.rank(),
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Scanning => write!(f, "scanning"),
            RunPhase::Resolving => write!(f, "resolving order"),
            RunPhase::Emitting { index, total } => write!(f, "emitting {}/{}", index, total),
            RunPhase::Saving => write!(f, "saving"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    DeckCover,
    BusinessCover,
    PriceList,
    ImageGroup,
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SlideKind::DeckCover => "deck cover",
            SlideKind::BusinessCover => "cover",
            SlideKind::PriceList => "price list",
            SlideKind::ImageGroup => "image group",
        };
        f.write_str(label)
    }
}

/// Structured progress reported by the scanner, resolver, emitter and engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PhaseEntered(RunPhase),
    ImageRootMissing {
        root: PathBuf,
    },
    EntrySkipped {
        path: PathBuf,
        reason: String,
    },
    DuplicateBusiness {
        name: String,
        kept: PathBuf,
        replaced: PathBuf,
    },
    BusinessesDiscovered {
        count: usize,
    },
    OrderLoaded {
        path: PathBuf,
        entries: usize,
    },
    OrderFallback {
        reason: String,
    },
    OrderEntryUnmatched {
        name: String,
    },
    OrderEntryRepeated {
        name: String,
    },
    UnlistedBusinessAppended {
        name: String,
    },
    BusinessStarted {
        index: usize,
        total: usize,
        name: String,
        price_images: usize,
        interior_images: usize,
        has_capture: bool,
    },
    SlideAdded {
        kind: SlideKind,
        pictures: usize,
    },
    ImageSkipped {
        path: PathBuf,
        reason: String,
    },
    PlacementFailed {
        target: String,
        reason: String,
    },
    Saved {
        path: PathBuf,
        slides: usize,
    },
}

impl ProgressEvent {
    /// Events that describe something skipped or degraded.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ProgressEvent::ImageRootMissing { .. }
                | ProgressEvent::EntrySkipped { .. }
                | ProgressEvent::DuplicateBusiness { .. }
                | ProgressEvent::OrderFallback { .. }
                | ProgressEvent::OrderEntryUnmatched { .. }
                | ProgressEvent::OrderEntryRepeated { .. }
                | ProgressEvent::ImageSkipped { .. }
                | ProgressEvent::PlacementFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_only_move_forward() {
        assert!(RunPhase::Idle.can_advance_to(&RunPhase::Scanning));
        assert!(RunPhase::Scanning.can_advance_to(&RunPhase::Resolving));
        assert!(RunPhase::Resolving.can_advance_to(&RunPhase::Emitting { index: 1, total: 2 }));
        assert!(RunPhase::Emitting { index: 1, total: 2 }
            .can_advance_to(&RunPhase::Emitting { index: 2, total: 2 }));
        assert!(RunPhase::Emitting { index: 2, total: 2 }.can_advance_to(&RunPhase::Saving));
        assert!(RunPhase::Resolving.can_advance_to(&RunPhase::Saving));
        assert!(RunPhase::Saving.can_advance_to(&RunPhase::Done));

        assert!(!RunPhase::Resolving.can_advance_to(&RunPhase::Scanning));
        assert!(!RunPhase::Resolving.can_advance_to(&RunPhase::Emitting { index: 2, total: 2 }));
        assert!(!RunPhase::Emitting { index: 2, total: 3 }
            .can_advance_to(&RunPhase::Emitting { index: 1, total: 3 }));
        assert!(!RunPhase::Done.can_advance_to(&RunPhase::Saving));
    }

    #[test]
    fn test_warning_classification() {
        assert!(ProgressEvent::OrderEntryUnmatched { name: "x".into() }.is_warning());
        assert!(!ProgressEvent::BusinessesDiscovered { count: 3 }.is_warning());
    }
}
