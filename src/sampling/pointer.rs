//! The forward-only supersampling cursor over a pixel window.

use super::SamplePoint;

/// A rectangular pixel region, in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Leftmost column
    pub x: usize,
    /// Topmost row
    pub y: usize,
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl PixelWindow {
    /// A window anchored at the raster origin.
    pub fn sized(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Enumerates `(x, y, sample point)` positions over a pixel window.
///
/// The cursor visits the ordered cross product rows-outer, columns-next,
/// sampling points innermost. It starts before the first position:
/// [`advance`](SamplePointer::advance) must be called once before the
/// accessors are used, and panics when no position is left. The cursor
/// cannot be restarted; construct a new one to re-scan.
#[derive(Debug)]
pub struct SamplePointer<'a> {
    window: PixelWindow,
    points: &'a [SamplePoint],
    /// Linear position, `None` before the first advance
    cursor: Option<usize>,
}

impl<'a> SamplePointer<'a> {
    /// Create a cursor over a window with at least one sampling point.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn new(window: PixelWindow, points: &'a [SamplePoint]) -> Self {
        assert!(!points.is_empty(), "at least one sampling point is required");
        Self {
            window,
            points,
            cursor: None,
        }
    }

    fn total(&self) -> usize {
        self.window.width * self.window.height * self.points.len()
    }

    /// Whether another position exists.
    pub fn can_advance(&self) -> bool {
        match self.cursor {
            None => self.total() > 0,
            Some(pos) => pos + 1 < self.total(),
        }
    }

    /// Move to the next position.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn advance(&mut self) {
        assert!(self.can_advance(), "sample pointer is exhausted");
        self.cursor = Some(match self.cursor {
            None => 0,
            Some(pos) => pos + 1,
        });
    }

    fn position(&self) -> usize {
        self.cursor.expect("sample pointer not advanced yet")
    }

    /// Current pixel column.
    pub fn x(&self) -> usize {
        let pixel = self.position() / self.points.len();
        self.window.x + pixel % self.window.width
    }

    /// Current pixel row.
    pub fn y(&self) -> usize {
        let pixel = self.position() / self.points.len();
        self.window.y + pixel / self.window.width
    }

    /// Current sub-pixel sampling point.
    pub fn sample_point(&self) -> SamplePoint {
        self.points[self.position() % self.points.len()]
    }
}
