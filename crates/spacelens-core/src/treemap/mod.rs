/// Squarified treemap layout (Bruls, Huizing, van Wijk).
///
/// A pure function of its inputs: given one tree level and a viewport
/// rectangle it produces a flat list of positioned, size-proportional cells,
/// parents before their nested children. No hidden state — the renderer
/// re-invokes it on every resize instead of the scanner re-walking anything.
///
/// Rows are assembled greedily: children join the current row while the
/// worst aspect ratio the row would produce keeps improving (or holds), and
/// the row closes at the first worsening addition. A closed row spans the
/// remaining rectangle's long axis and consumes its thickness from the
/// short axis.
///
/// Depth, minimum cell size, and inner padding are fixed, not per-call
/// configuration.
use crate::model::Node;

/// Nesting levels laid out below the starting level.
pub const MAX_DEPTH: usize = 3;

/// Cells narrower or shorter than this are dropped entirely — omission
/// beats an unreadable sliver.
pub const MIN_CELL_SIZE: f32 = 30.0;

/// Gap between a parent cell's border and its nested children.
pub const INNER_PADDING: f32 = 3.0;

/// Number of colour families; a cell's family is `depth % PALETTE_SIZE`.
pub const PALETTE_SIZE: usize = 8;

/// Shades per family; a cell's shade is its row position `% SHADE_COUNT`.
pub const SHADE_COUNT: usize = 3;

/// An axis-aligned rectangle in viewport units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// A rectangle with non-positive extent terminates layout recursion.
    fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// One positioned cell of the layout, referencing the node it represents.
///
/// Ephemeral: recomputed on every layout call and never mutated in place.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub node: &'a Node,
    pub rect: Rect,
    /// Nesting depth below the layout's starting level.
    pub depth: usize,
    /// Colour family index, `depth % PALETTE_SIZE`.
    pub color: usize,
    /// Shade index within the family, row position `% SHADE_COUNT`.
    pub shade: usize,
}

/// Lay out `children` inside `viewport`.
///
/// Identical inputs always yield an identical cell list; size ties keep the
/// input order. Emission order is rendering order: a parent cell precedes
/// the nested cells laid out inside it.
pub fn layout<'a>(children: &'a [Node], viewport: Rect) -> Vec<Cell<'a>> {
    let mut cells = Vec::new();
    squarify(children, viewport, 0, &mut cells);
    cells
}

fn squarify<'a>(children: &'a [Node], rect: Rect, depth: usize, cells: &mut Vec<Cell<'a>>) {
    if depth >= MAX_DEPTH || rect.is_degenerate() {
        return;
    }

    let mut ordered: Vec<&Node> = children.iter().filter(|c| c.size > 0).collect();
    if ordered.is_empty() {
        return;
    }
    // Stable sort: equal sizes stay in input order, keeping the layout
    // deterministic for any given input.
    ordered.sort_by(|a, b| b.size.cmp(&a.size));

    let total: u64 = ordered.iter().map(|c| c.size).sum();
    layout_rows(&ordered, rect, total as f64, depth, cells);
}

/// Place `ordered` (descending by size, all non-zero) into `rect`, one
/// greedy row at a time.
fn layout_rows<'a>(
    ordered: &[&'a Node],
    rect: Rect,
    total: f64,
    depth: usize,
    cells: &mut Vec<Cell<'a>>,
) {
    let mut remaining = rect;
    let mut rest = ordered;
    let mut remaining_total = total;

    while !rest.is_empty() && !remaining.is_degenerate() && remaining_total > 0.0 {
        let horizontal = remaining.width >= remaining.height;

        // The first child is always admitted, so a row is never empty even
        // when no addition can avoid a poor ratio.
        let mut row_len = 1;
        let mut row_size = rest[0].size as f64;
        let mut best = worst_ratio(&rest[..1], row_size, remaining, remaining_total, horizontal);

        while row_len < rest.len() {
            let candidate_size = row_size + rest[row_len].size as f64;
            let candidate = worst_ratio(
                &rest[..row_len + 1],
                candidate_size,
                remaining,
                remaining_total,
                horizontal,
            );
            if candidate <= best {
                best = candidate;
                row_size = candidate_size;
                row_len += 1;
            } else {
                break;
            }
        }

        let (row, after) = rest.split_at(row_len);
        emit_row(row, row_size, remaining, remaining_total, depth, horizontal, cells);

        // Advance past the row: its thickness is consumed from the short axis.
        let fraction = (row_size / remaining_total) as f32;
        if horizontal {
            let thickness = remaining.height * fraction;
            remaining.y += thickness;
            remaining.height -= thickness;
        } else {
            let thickness = remaining.width * fraction;
            remaining.x += thickness;
            remaining.width -= thickness;
        }

        rest = after;
        remaining_total -= row_size;
    }
}

/// Worst (highest) aspect ratio among the cells a candidate row would
/// actually receive: the row spans the long axis of `rect` with thickness
/// `short_side * row_size / remaining_total`, and each member's length is
/// its share of the span.
fn worst_ratio(
    row: &[&Node],
    row_size: f64,
    rect: Rect,
    remaining_total: f64,
    horizontal: bool,
) -> f64 {
    let (span, short) = if horizontal {
        (rect.width as f64, rect.height as f64)
    } else {
        (rect.height as f64, rect.width as f64)
    };

    let thickness = short * row_size / remaining_total;
    if thickness <= 0.0 {
        return f64::INFINITY;
    }

    let mut worst = 0.0f64;
    for member in row {
        let length = member.size as f64 / row_size * span;
        let ratio = if length > 0.0 {
            (length / thickness).max(thickness / length)
        } else {
            f64::INFINITY
        };
        worst = worst.max(ratio);
    }
    worst
}

/// Emit the cells of one closed row, then recurse into members that still
/// have materialised children.
#[allow(clippy::too_many_arguments)]
fn emit_row<'a>(
    row: &[&'a Node],
    row_size: f64,
    rect: Rect,
    remaining_total: f64,
    depth: usize,
    horizontal: bool,
    cells: &mut Vec<Cell<'a>>,
) {
    let fraction = (row_size / remaining_total) as f32;
    let thickness = if horizontal {
        rect.height * fraction
    } else {
        rect.width * fraction
    };

    let mut offset = if horizontal { rect.x } else { rect.y };

    for (position, member) in row.iter().enumerate() {
        let share = (member.size as f64 / row_size) as f32;

        let cell_rect = if horizontal {
            let width = rect.width * share;
            let r = Rect::new(offset, rect.y, width, thickness);
            offset += width;
            r
        } else {
            let height = rect.height * share;
            let r = Rect::new(rect.x, offset, thickness, height);
            offset += height;
            r
        };

        // The offset has already advanced, so dropping a sliver leaves a
        // gap rather than shifting its siblings.
        if cell_rect.width < MIN_CELL_SIZE || cell_rect.height < MIN_CELL_SIZE {
            continue;
        }

        cells.push(Cell {
            node: member,
            rect: cell_rect,
            depth,
            color: depth % PALETTE_SIZE,
            shade: position % SHADE_COUNT,
        });

        if !member.children.is_empty() && depth < MAX_DEPTH - 1 {
            let inner = Rect::new(
                cell_rect.x + INNER_PADDING,
                cell_rect.y + INNER_PADDING,
                cell_rect.width - INNER_PADDING * 2.0,
                cell_rect.height - INNER_PADDING * 2.0,
            );
            if inner.width > MIN_CELL_SIZE && inner.height > MIN_CELL_SIZE {
                squarify(&member.children, inner, depth + 1, cells);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn file(name: &str, size: u64) -> Node {
        Node::file(&Path::new("/t").join(name), size, None)
    }

    fn dir(name: &str, children: Vec<Node>) -> Node {
        let mut node = Node::dir(&Path::new("/t").join(name), None);
        node.size = children.iter().map(|c| c.size).sum();
        node.children = children;
        node
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn overlaps(a: &Rect, b: &Rect) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    #[test]
    fn two_files_in_wide_viewport_split_horizontally() {
        let children = vec![file("big", 300), file("small", 100)];
        let cells = layout(&children, Rect::new(0.0, 0.0, 400.0, 100.0));

        assert_eq!(cells.len(), 2);
        let big = &cells[0];
        let small = &cells[1];
        assert!(approx(big.rect.x, 0.0) && approx(big.rect.y, 0.0));
        assert!(approx(big.rect.width, 300.0) && approx(big.rect.height, 100.0));
        assert!(approx(small.rect.x, 300.0) && approx(small.rect.y, 0.0));
        assert!(approx(small.rect.width, 100.0) && approx(small.rect.height, 100.0));
    }

    #[test]
    fn cells_stay_inside_viewport_and_never_overlap() {
        let children = vec![
            file("a", 500),
            file("b", 320),
            file("c", 180),
            file("d", 90),
            file("e", 60),
            file("f", 30),
        ];
        let viewport = Rect::new(0.0, 0.0, 640.0, 480.0);
        let cells = layout(&children, viewport);
        assert!(!cells.is_empty());

        let mut area_sum = 0.0f32;
        for cell in &cells {
            assert!(cell.rect.x >= -1e-3 && cell.rect.y >= -1e-3);
            assert!(cell.rect.x + cell.rect.width <= viewport.width + 1e-2);
            assert!(cell.rect.y + cell.rect.height <= viewport.height + 1e-2);
            area_sum += cell.rect.area();
        }
        assert!(area_sum <= viewport.area() + 1.0);

        for (i, a) in cells.iter().enumerate() {
            for b in cells.iter().skip(i + 1) {
                if a.depth == b.depth {
                    assert!(
                        !overlaps(&a.rect, &b.rect),
                        "{} overlaps {}",
                        a.node.name,
                        b.node.name
                    );
                }
            }
        }
    }

    #[test]
    fn areas_are_proportional_to_sizes() {
        let children = vec![file("a", 600), file("b", 300), file("c", 100)];
        let viewport = Rect::new(0.0, 0.0, 500.0, 400.0);
        let cells = layout(&children, viewport);
        assert_eq!(cells.len(), 3);

        let total_area = viewport.area();
        for cell in &cells {
            let expected = cell.node.size as f32 / 1000.0 * total_area;
            assert!(
                (cell.rect.area() - expected).abs() < 1.0,
                "{}: area {} vs expected {}",
                cell.node.name,
                cell.rect.area(),
                expected
            );
        }
    }

    #[test]
    fn no_cell_below_minimum_size() {
        let mut children: Vec<Node> = (0..40).map(|i| file(&format!("f{i}"), 1000 - i)).collect();
        children.push(file("tiny", 1));
        let cells = layout(&children, Rect::new(0.0, 0.0, 300.0, 200.0));

        for cell in &cells {
            assert!(cell.rect.width >= MIN_CELL_SIZE);
            assert!(cell.rect.height >= MIN_CELL_SIZE);
        }
    }

    #[test]
    fn zero_size_children_are_dropped() {
        let children = vec![file("empty", 0), file("real", 100)];
        let cells = layout(&children, Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].node.name, "real");
    }

    #[test]
    fn empty_input_or_degenerate_viewport_yields_nothing() {
        assert!(layout(&[], Rect::new(0.0, 0.0, 100.0, 100.0)).is_empty());
        let children = vec![file("a", 10)];
        assert!(layout(&children, Rect::new(0.0, 0.0, 0.0, 100.0)).is_empty());
        assert!(layout(&children, Rect::new(0.0, 0.0, 100.0, -5.0)).is_empty());
    }

    #[test]
    fn nested_children_follow_their_parent() {
        let children = vec![dir(
            "folder",
            vec![file("inner_a", 300), file("inner_b", 100)],
        )];
        let cells = layout(&children, Rect::new(0.0, 0.0, 400.0, 300.0));

        assert_eq!(cells[0].node.name, "folder");
        assert_eq!(cells[0].depth, 0);
        let nested: Vec<_> = cells.iter().filter(|c| c.depth == 1).collect();
        assert_eq!(nested.len(), 2);

        let parent = cells[0].rect;
        for cell in nested {
            assert!(cell.rect.x >= parent.x + INNER_PADDING - 1e-3);
            assert!(cell.rect.y >= parent.y + INNER_PADDING - 1e-3);
            assert!(cell.rect.x + cell.rect.width <= parent.x + parent.width - INNER_PADDING + 1e-3);
            assert!(
                cell.rect.y + cell.rect.height <= parent.y + parent.height - INNER_PADDING + 1e-3
            );
        }
    }

    #[test]
    fn nesting_stops_at_max_depth() {
        // Four levels of single-child directories; only MAX_DEPTH levels emit.
        let tree = dir(
            "l0",
            vec![dir("l1", vec![dir("l2", vec![file("l3", 1000)])])],
        );
        let cells = layout(std::slice::from_ref(&tree), Rect::new(0.0, 0.0, 800.0, 600.0));

        let max_emitted = cells.iter().map(|c| c.depth).max().unwrap();
        assert!(max_emitted <= MAX_DEPTH - 1);
    }

    #[test]
    fn color_and_shade_are_deterministic() {
        let children = vec![file("a", 400), file("b", 300), file("c", 200), file("d", 100)];
        let first = layout(&children, Rect::new(0.0, 0.0, 600.0, 400.0));
        let second = layout(&children, Rect::new(0.0, 0.0, 600.0, 400.0));

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.rect, b.rect);
            assert_eq!(a.color, b.color);
            assert_eq!(a.shade, b.shade);
            assert_eq!(a.color, a.depth % PALETTE_SIZE);
            assert!(a.shade < SHADE_COUNT);
        }
    }

    #[test]
    fn size_ties_keep_input_order() {
        let children = vec![file("first", 100), file("second", 100)];
        let cells = layout(&children, Rect::new(0.0, 0.0, 400.0, 100.0));
        assert_eq!(cells[0].node.name, "first");
        assert_eq!(cells[1].node.name, "second");
    }
}
