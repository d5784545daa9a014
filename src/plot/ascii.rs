//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output:
//! - observed points: `o`
//! - fit line: `-`

use super::pad_range;
use super::scatter::ScatterPanel;
use crate::math::min_max;

/// Render one scatter panel (and its fit line, if any).
pub fn render_ascii_scatter(panel: &ScatterPanel, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = panel
        .x
        .iter()
        .zip(&panel.y)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let line = panel.fit_line.as_deref().unwrap_or(&[]);

    let xs: Vec<f64> = points.iter().chain(line).map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().chain(line).map(|p| p.1).collect();
    let (x_min, x_max) = min_max(&xs).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = min_max(&ys).unwrap_or((0.0, 1.0));
    let (x_min, x_max) = widen_if_flat(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so points overlay it.
    let mut prev = None;
    for &(x, y) in line {
        let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
        match prev {
            Some(from) => draw_line(&mut grid, from, cell, '-'),
            None => grid[cell.1][cell.0] = '-',
        }
        prev = Some(cell);
    }

    for &(x, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = format!(
        "{} vs {}: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n",
        panel.y_label, panel.x_label
    );
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    if let Some(note) = &panel.annotation {
        out.push_str(&note.replace('\n', " | "));
        out.push('\n');
    }
    out
}

fn widen_if_flat(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { pad_range(min, max, 0.05) }
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest y).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
        {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
