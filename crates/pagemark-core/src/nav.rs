//! Page navigation over a set of [`SnapPoints`].

use crate::snap::SnapPoints;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { index: usize, offset: u32 },
    BoundaryHit(Boundary),
}

/// Current page index plus the snap points it indexes into.
///
/// Invariant: `index < points.len()`. A command at a boundary leaves the state untouched
/// (including [`Navigator::revision`]) and reports [`NavOutcome::BoundaryHit`].
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    points: SnapPoints,
    index: usize,
    revision: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &SnapPoints {
        &self.points
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page_count(&self) -> usize {
        self.points.len()
    }

    /// Counts state writes; unchanged by boundary hits.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_offset(&self) -> u32 {
        self.points.get(self.index).unwrap_or(0)
    }

    /// Installs freshly computed points and returns to the first page.
    pub fn reset(&mut self, points: SnapPoints) -> u32 {
        self.points = points;
        self.index = 0;
        self.revision += 1;
        0
    }

    pub fn apply(&mut self, command: NavCommand) -> NavOutcome {
        let last = self.points.len().saturating_sub(1);
        let next = match command {
            NavCommand::Next if self.index >= last => {
                return NavOutcome::BoundaryHit(Boundary::End);
            }
            NavCommand::Previous if self.index == 0 => {
                return NavOutcome::BoundaryHit(Boundary::Start);
            }
            NavCommand::Next => self.index + 1,
            NavCommand::Previous => self.index - 1,
        };
        self.index = next;
        self.revision += 1;
        NavOutcome::Moved {
            index: next,
            offset: self.current_offset(),
        }
    }
}
