use crate::error::{DeckError, Result};
use crate::geometry::{Point, Rect, Size};

use super::core::{Node, NodeId};
use super::options::SplitKind;

/// Assign a rectangle to every node for the given terminal size. The
/// root gets the full terminal; bordered nodes lose one row/column per
/// edge before their children divide the remainder.
pub(crate) fn assign_rects(nodes: &mut [Node], root: NodeId, size: Size) -> Result<()> {
    nodes[root.0].rect = Rect::from_size(size);
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let rect = nodes[id.0].rect;
        let bordered = !nodes[id.0].border.is_none();
        if bordered && (rect.width < 2 || rect.height < 2) {
            return Err(DeckError::Layout(format!(
                "{}x{} area cannot fit a border frame",
                rect.width, rect.height
            )));
        }
        let inner = if bordered { rect.inset() } else { rect };

        if let Some((first, second)) = nodes[id.0].children {
            let split = nodes[id.0].split.expect("split node carries split options");
            let (first_rect, second_rect) = split_area(inner, split.kind, split.percent);
            nodes[first.0].rect = first_rect;
            nodes[second.0].rect = second_rect;
            stack.push(second);
            stack.push(first);
        }
    }
    Ok(())
}

fn split_area(inner: Rect, kind: SplitKind, percent: u8) -> (Rect, Rect) {
    match kind {
        SplitKind::Vertical => {
            let cut = (inner.width as u32 * percent as u32 / 100) as u16;
            (
                Rect::new(inner.x, inner.y, cut, inner.height),
                Rect::new(inner.x + cut, inner.y, inner.width - cut, inner.height),
            )
        }
        SplitKind::Horizontal => {
            let cut = (inner.height as u32 * percent as u32 / 100) as u16;
            (
                Rect::new(inner.x, inner.y, inner.width, cut),
                Rect::new(inner.x, inner.y + cut, inner.width, inner.height - cut),
            )
        }
    }
}

/// Resolve `p` to the most specific container whose area contains it.
/// Points on a split node's own frame or divider resolve to that node;
/// points outside the root resolve to none. Zero-sized children contain
/// nothing and are never returned.
pub(crate) fn node_at(nodes: &[Node], root: NodeId, p: Point) -> Option<NodeId> {
    if !nodes[root.0].rect.contains(p) {
        return None;
    }
    let mut current = root;
    while let Some((first, second)) = nodes[current.0].children {
        if nodes[first.0].rect.contains(p) {
            current = first;
        } else if nodes[second.0].rect.contains(p) {
            current = second;
        } else {
            break;
        }
    }
    Some(current)
}
