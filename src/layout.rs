//! Squarified treemap layout (Bruls, Huizing & van Wijk, 2000).
//!
//! Every box that has children keeps a label band at its top and a thin
//! padding around its children, so the nesting stays visible.

use log::debug;

use crate::config::ReportConfig;
use crate::node::DataNode;

/// Boxes thinner than this are not subdivided any further.
const MIN_INNER_SIDE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    fn inset(&self, top: f64, side: f64) -> Rect {
        Rect {
            x: self.x + side,
            y: self.y + top,
            w: (self.w - 2.0 * side).max(0.0),
            h: (self.h - top - side).max(0.0),
        }
    }
}

/// A positioned node.
#[derive(Debug, Clone)]
pub struct LayoutRect {
    pub rect: Rect,
    /// 0 for the root.
    pub depth: usize,
    pub name: String,
    /// Labels from the root down to this node, joined with `/`.
    pub path: String,
    pub size: u64,
    /// Position of the top-level ancestor among the root's children. `None`
    /// for the root itself.
    pub branch: Option<usize>,
    /// Whether this box's children were laid out inside it.
    pub has_children: bool,
}

/// Lay out `root` inside the configured canvas, minus the margins.
///
/// The root is always present, even when its size is 0. Other nodes of size
/// 0 get no box.
pub fn compute_layout(root: &DataNode<'_>, config: &ReportConfig) -> Vec<LayoutRect> {
    let margin = config.margin;
    let plot = Rect {
        x: margin.left as f64,
        y: margin.top as f64,
        w: config.width.saturating_sub(margin.left + margin.right) as f64,
        h: config.height.saturating_sub(margin.top + margin.bottom) as f64,
    };

    let mut rects = Vec::new();
    push_and_recurse(
        root,
        &config.root_label,
        config.root_label.clone(),
        plot,
        0,
        None,
        config,
        &mut rects,
    );
    rects
}

#[allow(clippy::too_many_arguments)]
fn push_and_recurse(
    node: &DataNode<'_>,
    name: &str,
    path: String,
    rect: Rect,
    depth: usize,
    branch: Option<usize>,
    config: &ReportConfig,
    out: &mut Vec<LayoutRect>,
) {
    let idx = out.len();
    out.push(LayoutRect {
        rect,
        depth,
        name: name.to_string(),
        path: path.clone(),
        size: node.size,
        branch,
        has_children: false,
    });

    if node.is_leaf() || node.size == 0 {
        return;
    }
    let inner = rect.inset(config.header_height, config.padding);
    if inner.w < MIN_INNER_SIDE || inner.h < MIN_INNER_SIDE {
        return;
    }

    let children = node
        .sorted_children()
        .into_iter()
        .filter(|(_, child)| child.size > 0)
        .collect::<Vec<_>>();
    let total = children.iter().map(|(_, child)| child.size as f64).sum::<f64>();
    let scale = inner.area() / total;
    let areas = children
        .iter()
        .map(|(_, child)| child.size as f64 * scale)
        .collect::<Vec<_>>();

    let positioned = squarify(&areas, inner);
    out[idx].has_children = !positioned.is_empty();
    for (name, child) in &children[positioned.len()..] {
        debug!("{path}/{name} (size {}) is too small to draw", child.size);
    }
    for (i, ((child_name, child), child_rect)) in children.iter().zip(positioned).enumerate() {
        push_and_recurse(
            child,
            child_name,
            format!("{path}/{child_name}"),
            child_rect,
            depth + 1,
            branch.or(Some(i)),
            config,
            out,
        );
    }
}

/// Place `areas` (sorted descending, summing to `bounds.area()`) in `bounds`.
fn squarify(areas: &[f64], bounds: Rect) -> Vec<Rect> {
    let mut result = Vec::with_capacity(areas.len());
    let mut free = bounds;

    let mut idx = 0usize;
    let mut row_start = 0usize;
    let mut row_sum = 0.0;
    let mut row_min = f64::INFINITY;
    let mut row_max = 0.0_f64;

    while idx < areas.len() {
        if free.w <= 1e-6 || free.h <= 1e-6 {
            break;
        }

        let area = areas[idx];
        let side = free.w.min(free.h);
        let current = if row_sum > 0.0 {
            worst_aspect_ratio(row_min, row_max, row_sum, side)
        } else {
            f64::INFINITY
        };
        let next = worst_aspect_ratio(row_min.min(area), row_max.max(area), row_sum + area, side);

        // Grow the row while that makes its worst box more square.
        if row_sum <= 0.0 || next <= current {
            row_sum += area;
            row_min = row_min.min(area);
            row_max = row_max.max(area);
            idx += 1;
            continue;
        }

        layout_row(&areas[row_start..idx], row_sum, &mut free, &mut result);
        row_start = idx;
        row_sum = 0.0;
        row_min = f64::INFINITY;
        row_max = 0.0;
    }

    if row_sum > 0.0 && row_start < idx {
        layout_row(&areas[row_start..idx], row_sum, &mut free, &mut result);
    }

    result
}

/// Lay `row` out as one strip along the short side of `free`, then shrink
/// `free` by the strip.
fn layout_row(row: &[f64], row_sum: f64, free: &mut Rect, out: &mut Vec<Rect>) {
    if row.is_empty() || row_sum <= 0.0 || free.w <= 1e-8 || free.h <= 1e-8 {
        return;
    }

    let horizontal = free.w <= free.h;
    let short = if horizontal { free.w } else { free.h };
    let thickness = (row_sum / short).min(if horizontal { free.h } else { free.w });

    let mut offset = 0.0;
    for (i, &area) in row.iter().enumerate() {
        let mut length = area / thickness;
        // The last box absorbs rounding error.
        if i == row.len() - 1 {
            length = (short - offset).max(0.0);
        }

        out.push(if horizontal {
            Rect {
                x: free.x + offset,
                y: free.y,
                w: length,
                h: thickness,
            }
        } else {
            Rect {
                x: free.x,
                y: free.y + offset,
                w: thickness,
                h: length,
            }
        });
        offset += length;
    }

    if horizontal {
        free.y += thickness;
        free.h = (free.h - thickness).max(0.0);
    } else {
        free.x += thickness;
        free.w = (free.w - thickness).max(0.0);
    }
}

fn worst_aspect_ratio(min: f64, max: f64, sum: f64, side: f64) -> f64 {
    let sum2 = sum * sum;
    let side2 = side * side;
    (side2 * max / sum2).max(sum2 / (side2 * min))
}
