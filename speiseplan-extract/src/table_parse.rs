use std::cmp::Ordering;

use crate::model::{GridRow, TextSpan};

pub(crate) const DEFAULT_COLUMN_TOLERANCE: f64 = 10.0;

/// Line gaps beyond this many line heights separate blocks.
const BLANK_LINE_GAP: f64 = 2.0;

fn by_position(a: &TextSpan, b: &TextSpan) -> Ordering {
    b.y.partial_cmp(&a.y)
        .unwrap_or(Ordering::Equal)
        .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
}

/// Groups spans into visual lines, top of page first, each sorted by x.
pub(crate) fn cluster_rows(spans: &[TextSpan]) -> Vec<Vec<&TextSpan>> {
    let mut spans = spans
        .iter()
        .filter(|span| !span.text.trim().is_empty())
        .collect::<Vec<_>>();
    if spans.is_empty() {
        return Vec::new();
    }

    let average_size = spans.iter().map(|span| span.font_size).sum::<f64>() / spans.len() as f64;
    let tolerance = average_size * 0.5;
    spans.sort_by(|a, b| by_position(a, b));

    let mut rows: Vec<Vec<&TextSpan>> = Vec::new();
    let mut current_y: Option<f64> = None;
    for span in spans {
        let same_line = current_y.is_some_and(|y| (span.y - y).abs() <= tolerance);
        if same_line && let Some(row) = rows.last_mut() {
            row.push(span);
            continue;
        }
        current_y = Some(span.y);
        rows.push(vec![span]);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    rows
}

/// Clusters span start positions into column buckets, left to right.
pub(crate) fn column_buckets(rows: &[Vec<&TextSpan>], tolerance: f64) -> Vec<f64> {
    let mut xs = rows
        .iter()
        .flat_map(|row| row.iter().map(|span| span.x))
        .collect::<Vec<_>>();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut buckets = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();
    for x in xs {
        if cluster.last().is_some_and(|last| x - last > tolerance) {
            buckets.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
            cluster.clear();
        }
        cluster.push(x);
    }
    if !cluster.is_empty() {
        buckets.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
    }
    buckets
}

fn nearest_bucket(buckets: &[f64], x: f64) -> usize {
    buckets
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map_or(0, |(index, _)| index)
}

pub(crate) fn normalize_rows(rows: &[GridRow], width: usize) -> Vec<GridRow> {
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, None);
            out
        })
        .collect()
}

fn line_y(row: &[&TextSpan]) -> f64 {
    row.iter().map(|span| span.y).sum::<f64>() / row.len().max(1) as f64
}

fn line_height(row: &[&TextSpan]) -> f64 {
    row.iter().map(|span| span.font_size).fold(0.0, f64::max)
}

/// Reads the page as a text grid: one row per visual line, one column per
/// x bucket, `None` where a line has no text in a bucket. A vertical gap
/// wider than `BLANK_LINE_GAP` line heights becomes an all-`None` row.
pub(crate) fn build_grid(spans: &[TextSpan], column_tolerance: f64) -> Vec<GridRow> {
    let rows = cluster_rows(spans);
    let buckets = column_buckets(&rows, column_tolerance);

    let mut grid: Vec<GridRow> = Vec::with_capacity(rows.len());
    let mut previous: Option<&Vec<&TextSpan>> = None;
    for row in &rows {
        if let Some(above) = previous {
            let gap = line_y(above) - line_y(row);
            if gap > BLANK_LINE_GAP * line_height(above).max(line_height(row)) {
                grid.push(vec![None; buckets.len()]);
            }
        }
        previous = Some(row);

        let mut cells: GridRow = vec![None; buckets.len()];
        for span in row {
            let index = nearest_bucket(&buckets, span.x);
            let text = span.text.trim();
            if let Some(existing) = cells[index].as_mut() {
                existing.push(' ');
                existing.push_str(text);
            } else {
                cells[index] = Some(text.to_string());
            }
        }
        grid.push(cells);
    }

    normalize_rows(&grid, buckets.len())
}

#[cfg(test)]
mod tests {
    use super::{build_grid, cluster_rows, column_buckets, normalize_rows};
    use crate::model::TextSpan;

    fn span(text: &str, x: f64, y: f64) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            font_size: 10.0,
        }
    }

    #[test]
    fn clusters_lines_top_first() {
        let spans = vec![
            span("b", 200.0, 698.0),
            span("c", 50.0, 650.0),
            span("a", 50.0, 700.0),
        ];
        let rows = cluster_rows(&spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].iter().map(|s| s.text.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rows[1][0].text, "c");
    }

    #[test]
    fn buckets_nearby_x_positions() {
        let spans = vec![span("a", 50.0, 700.0), span("b", 55.0, 680.0), span("c", 200.0, 680.0)];
        let rows = cluster_rows(&spans);
        assert_eq!(column_buckets(&rows, 10.0), vec![52.5, 200.0]);
    }

    #[test]
    fn builds_grid_with_blank_cells() {
        let spans = vec![
            span("Woche", 50.0, 700.0),
            span("Fleisch", 150.0, 700.0),
            span("Veggie", 300.0, 700.0),
            span("Gulasch", 150.0, 680.0),
            span("mit Reis", 152.0, 681.0),
        ];
        let grid = build_grid(&spans, 10.0);
        assert_eq!(grid.len(), 2);
        assert_eq!(
            grid[0],
            vec![
                Some("Woche".to_string()),
                Some("Fleisch".to_string()),
                Some("Veggie".to_string())
            ]
        );
        assert_eq!(grid[1], vec![None, Some("Gulasch mit Reis".to_string()), None]);
    }

    #[test]
    fn wide_gaps_become_blank_rows() {
        let spans = vec![
            span("Mo", 50.0, 700.0),
            span("Gulasch", 150.0, 700.0),
            span("mit Reis", 150.0, 688.0),
            span("Di", 50.0, 640.0),
            span("Fisch", 150.0, 640.0),
        ];
        let grid = build_grid(&spans, 10.0);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[1], vec![None, Some("mit Reis".to_string())]);
        assert_eq!(grid[2], vec![None, None]);
        assert_eq!(grid[3], vec![Some("Di".to_string()), Some("Fisch".to_string())]);
    }

    #[test]
    fn normalizes_ragged_rows() {
        let rows = vec![vec![Some("a".to_string())], vec![None, Some("c".to_string())]];
        let normalized = normalize_rows(&rows, 3);
        assert_eq!(normalized[0], vec![Some("a".to_string()), None, None]);
        assert_eq!(normalized[1], vec![None, Some("c".to_string()), None]);
    }
}
