use crate::{Board, Point, Rect, Size};

/// Distance one scroll step moves the view, in board units.
pub const SCROLL_STEP: f64 = 100.0;

/// The visible window onto the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Board coordinate shown at the top-left corner
    pub offset: Point,
    /// Visible extent in board units
    pub size: Size,
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            offset: Point::default(),
            size,
        }
    }

    pub fn scroll(&mut self, dx: f64, dy: f64) {
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Moves back to the origin. Returns whether the view moved.
    pub fn reset(&mut self) -> bool {
        let moved = self.offset != Point::default();
        self.offset = Point::default();
        moved
    }

    pub fn visible_rect(&self) -> Rect {
        Rect::from_origin(self.offset, self.size)
    }

    /// The area an overview map has to show: the visible rectangle plus every note.
    pub fn overview_bounds(&self, board: &Board) -> Rect {
        let visible = self.visible_rect();
        match board.bounds() {
            Some(notes) => visible.union(&notes),
            None => visible,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::new(1024.0, 768.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn reset_reports_movement() {
        let mut viewport = Viewport::default();
        assert!(!viewport.reset());
        viewport.scroll(SCROLL_STEP, -SCROLL_STEP);
        assert_eq!(viewport.offset, Point::new(100.0, -100.0));
        assert!(viewport.reset());
        assert_eq!(viewport.offset, Point::default());
    }

    #[test]
    fn overview_includes_offscreen_notes() {
        let mut board = Board::new(Config::default());
        let viewport = Viewport::new(Size::new(500.0, 500.0));
        assert_eq!(viewport.overview_bounds(&board), viewport.visible_rect());

        board.create(Point::new(900.0, -50.0));
        let bounds = viewport.overview_bounds(&board);
        assert_eq!(bounds.min_y, -50.0);
        assert_eq!(bounds.max_x, 1080.0);
        assert_eq!(bounds.max_y, 500.0);
    }
}
