use crate::model::{RawTableRow, Segment, TextSpan};

/// Distance under which two rule coordinates are treated as the same line.
pub(crate) const SNAP_TOLERANCE: f64 = 3.0;

/// Grid of a ruled table: column boundaries left to right, row boundaries
/// top to bottom (descending PDF y).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RuledTable {
    pub columns: Vec<f64>,
    pub rows: Vec<f64>,
}

impl RuledTable {
    pub fn column_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    fn top(&self) -> f64 {
        self.rows.first().copied().unwrap_or_default()
    }

    fn left(&self) -> f64 {
        self.columns.first().copied().unwrap_or_default()
    }

    fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let column = self
            .columns
            .windows(2)
            .position(|pair| x >= pair[0] - SNAP_TOLERANCE && x < pair[1])?;
        let row = self
            .rows
            .windows(2)
            .position(|pair| y <= pair[0] + SNAP_TOLERANCE && y > pair[1])?;
        Some((row, column))
    }

    /// Places every span inside the grid and joins each cell's text in
    /// reading order, one `\n` per visual line.
    pub fn fill(&self, spans: &[TextSpan]) -> Vec<RawTableRow> {
        let mut cells: Vec<Vec<Vec<&TextSpan>>> =
            vec![vec![Vec::new(); self.column_count()]; self.row_count()];
        for span in spans.iter().filter(|span| !span.text.trim().is_empty()) {
            if let Some((row, column)) = self.cell_of(span.x, span.y) {
                cells[row][column].push(span);
            }
        }

        cells
            .into_iter()
            .map(|row| row.into_iter().map(join_cell_text).collect())
            .collect()
    }
}

fn join_cell_text(mut spans: Vec<&TextSpan>) -> String {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut text = String::new();
    let mut line_y: Option<f64> = None;
    for span in spans {
        match line_y {
            Some(y) if (span.y - y).abs() <= span.font_size * 0.5 => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        line_y = Some(span.y);
        text.push_str(span.text.trim());
    }
    text
}

fn find(parent: &mut [usize], index: usize) -> usize {
    let mut root = index;
    while parent[root] != root {
        root = parent[root];
    }
    let mut current = index;
    while parent[current] != root {
        let next = parent[current];
        parent[current] = root;
        current = next;
    }
    root
}

fn union(parent: &mut [usize], left: usize, right: usize) {
    let left = find(parent, left);
    let right = find(parent, right);
    if left != right {
        parent[right] = left;
    }
}

fn touches(horizontal: &Segment, vertical: &Segment) -> bool {
    vertical.x0 >= horizontal.x0 - SNAP_TOLERANCE
        && vertical.x0 <= horizontal.x1 + SNAP_TOLERANCE
        && horizontal.y0 >= vertical.y0 - SNAP_TOLERANCE
        && horizontal.y0 <= vertical.y1 + SNAP_TOLERANCE
}

/// Merges coordinates closer than the snap tolerance into their mean.
pub(crate) fn snap_positions(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut snapped = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();
    for value in values {
        if cluster.last().is_some_and(|last| value - last > SNAP_TOLERANCE) {
            snapped.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
            cluster.clear();
        }
        cluster.push(value);
    }
    if !cluster.is_empty() {
        snapped.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
    }
    snapped
}

/// Groups touching horizontal and vertical rules into grids. Tables come
/// back top of page first.
pub(crate) fn detect_ruled_tables(segments: &[Segment]) -> Vec<RuledTable> {
    let horizontals = segments
        .iter()
        .filter(|segment| segment.is_horizontal(SNAP_TOLERANCE))
        .collect::<Vec<_>>();
    let verticals = segments
        .iter()
        .filter(|segment| segment.is_vertical(SNAP_TOLERANCE))
        .collect::<Vec<_>>();
    if horizontals.len() < 2 || verticals.len() < 2 {
        return Vec::new();
    }

    let mut parent = (0..horizontals.len() + verticals.len()).collect::<Vec<_>>();
    for (h_index, horizontal) in horizontals.iter().enumerate() {
        for (v_index, vertical) in verticals.iter().enumerate() {
            if touches(horizontal, vertical) {
                union(&mut parent, h_index, horizontals.len() + v_index);
            }
        }
    }

    let mut components: Vec<(usize, Vec<f64>, Vec<f64>)> = Vec::new();
    for (index, horizontal) in horizontals.iter().enumerate() {
        let root = find(&mut parent, index);
        component_for(&mut components, root).1.push(horizontal.y0);
    }
    for (index, vertical) in verticals.iter().enumerate() {
        let root = find(&mut parent, horizontals.len() + index);
        component_for(&mut components, root).2.push(vertical.x0);
    }

    let mut tables = components
        .into_iter()
        .filter_map(|(_, ys, xs)| {
            let mut rows = snap_positions(ys);
            let columns = snap_positions(xs);
            if rows.len() < 2 || columns.len() < 2 {
                return None;
            }
            rows.reverse();
            Some(RuledTable { columns, rows })
        })
        .collect::<Vec<_>>();

    tables.sort_by(|a, b| {
        b.top()
            .partial_cmp(&a.top())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.left().partial_cmp(&b.left()).unwrap_or(std::cmp::Ordering::Equal))
    });
    tables
}

fn component_for(
    components: &mut Vec<(usize, Vec<f64>, Vec<f64>)>,
    root: usize,
) -> &mut (usize, Vec<f64>, Vec<f64>) {
    let position = match components.iter().position(|(id, _, _)| *id == root) {
        Some(position) => position,
        None => {
            components.push((root, Vec::new(), Vec::new()));
            components.len() - 1
        }
    };
    &mut components[position]
}
