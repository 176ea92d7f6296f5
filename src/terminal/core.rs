use std::sync::{Arc, Mutex};

use crate::error::{DeckError, Result};
use crate::geometry::Size;
use crate::style::CellStyle;

/// The cell grid sink contract. The layout core reads the size and
/// forwards paint operations; everything else is the driver's business.
pub trait CellGrid: Send {
    fn size(&self) -> Size;

    /// Set the cell at `(x, y)`. Implementations reject out-of-bounds
    /// writes with a sink error.
    fn set_cell(&mut self, x: u16, y: u16, glyph: char, style: CellStyle) -> Result<()>;
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            style: CellStyle::default(),
        }
    }
}

#[derive(Debug)]
struct BufferInner {
    size: Size,
    cells: Vec<Cell>,
}

impl BufferInner {
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }
}

/// In-memory cell grid with handle semantics: clones share the same
/// buffer, so a test can keep a view while the container tree owns the
/// sink. Doubles as the backing store for drivers that diff themselves.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    inner: Arc<Mutex<BufferInner>>,
}

impl CellBuffer {
    pub fn new(size: Size) -> Self {
        let cells = vec![Cell::default(); size.width as usize * size.height as usize];
        Self {
            inner: Arc::new(Mutex::new(BufferInner { size, cells })),
        }
    }

    /// Replace the grid dimensions, clearing all content. Models a
    /// terminal resize; callers submit the matching resize event and
    /// redraw.
    pub fn resize(&self, size: Size) {
        let mut inner = self.inner.lock().expect("cell buffer mutex poisoned");
        inner.size = size;
        inner.cells = vec![Cell::default(); size.width as usize * size.height as usize];
    }

    pub fn cell_at(&self, x: u16, y: u16) -> Option<Cell> {
        let inner = self.inner.lock().expect("cell buffer mutex poisoned");
        inner.index(x, y).map(|idx| inner.cells[idx])
    }

    pub fn glyph_at(&self, x: u16, y: u16) -> Option<char> {
        self.cell_at(x, y).map(|cell| cell.glyph)
    }

    /// Render the buffer as one string per row. Test helper.
    pub fn rows(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("cell buffer mutex poisoned");
        (0..inner.size.height)
            .map(|y| {
                (0..inner.size.width)
                    .map(|x| {
                        let idx = inner.index(x, y).expect("row iteration in bounds");
                        inner.cells[idx].glyph
                    })
                    .collect()
            })
            .collect()
    }
}

impl CellGrid for CellBuffer {
    fn size(&self) -> Size {
        self.inner.lock().expect("cell buffer mutex poisoned").size
    }

    fn set_cell(&mut self, x: u16, y: u16, glyph: char, style: CellStyle) -> Result<()> {
        let mut inner = self.inner.lock().expect("cell buffer mutex poisoned");
        let idx = inner
            .index(x, y)
            .ok_or_else(|| DeckError::Sink(format!("cell ({x}, {y}) outside the grid")))?;
        inner.cells[idx] = Cell { glyph, style };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn set_and_read_cell() {
        let mut buffer = CellBuffer::new(Size::new(4, 2));
        buffer
            .set_cell(3, 1, 'x', CellStyle::fg(Color::Red))
            .unwrap();
        let cell = buffer.cell_at(3, 1).unwrap();
        assert_eq!(cell.glyph, 'x');
        assert_eq!(cell.style.fg, Color::Red);
    }

    #[test]
    fn out_of_bounds_write_is_a_sink_error() {
        let mut buffer = CellBuffer::new(Size::new(4, 2));
        let err = buffer.set_cell(4, 0, 'x', CellStyle::default()).unwrap_err();
        assert!(matches!(err, DeckError::Sink(_)));
    }

    #[test]
    fn clones_share_the_buffer() {
        let mut buffer = CellBuffer::new(Size::new(2, 2));
        let view = buffer.clone();
        buffer
            .set_cell(0, 0, 'a', CellStyle::default())
            .unwrap();
        assert_eq!(view.glyph_at(0, 0), Some('a'));
    }

    #[test]
    fn resize_clears_content() {
        let mut buffer = CellBuffer::new(Size::new(2, 2));
        buffer
            .set_cell(1, 1, 'z', CellStyle::default())
            .unwrap();
        buffer.resize(Size::new(3, 3));
        assert_eq!(buffer.size(), Size::new(3, 3));
        assert_eq!(buffer.glyph_at(1, 1), Some(' '));
    }

    #[test]
    fn rows_snapshot() {
        let mut buffer = CellBuffer::new(Size::new(3, 1));
        buffer
            .set_cell(1, 0, 'm', CellStyle::default())
            .unwrap();
        assert_eq!(buffer.rows(), vec![" m ".to_string()]);
    }
}
