use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::artifacts::ensure_parent;
use crate::error::{Result, TrafficError};
use crate::metrics::TrainingHistory;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const LINE: Rgb<u8> = Rgb([31, 119, 180]);
const MARKER: Rgb<u8> = Rgb([214, 39, 40]);

const MARGIN: u32 = 40;
const GRID_LINES: u32 = 5;

/// Write `Episode,TotalReward` with one 1-based row per episode.
pub fn export_rewards_csv<P: AsRef<Path>>(history: &TrainingHistory, path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "Episode,TotalReward")?;
    for record in &history.episodes {
        writeln!(file, "{},{}", record.episode, record.total_reward)?;
    }
    file.flush()?;
    Ok(())
}

/// Render total reward per episode as a PNG line chart.
pub fn plot_rewards_png<P: AsRef<Path>>(
    history: &TrainingHistory,
    path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    let image = render_series(&history.rewards(), width, height)?;
    let path = path.as_ref();
    ensure_parent(path)?;
    image.save(path)?;
    Ok(())
}

/// Draw `values` into a fresh image: white background, grid, axes, polyline.
pub fn render_series(values: &[f32], width: u32, height: u32) -> Result<RgbImage> {
    if values.is_empty() {
        return Err(TrafficError::PlotError("no data to plot".to_string()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(TrafficError::PlotError("cannot plot non-finite values".to_string()));
    }
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return Err(TrafficError::PlotError(format!(
            "plot area {}x{} too small",
            width, height
        )));
    }

    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let (left, right) = (MARGIN, width - MARGIN);
    let (top, bottom) = (MARGIN, height - MARGIN);

    for i in 0..=GRID_LINES {
        let y = top + (bottom - top) * i / GRID_LINES;
        draw_line(&mut image, (left as i64, y as i64), (right as i64, y as i64), GRID);
        let x = left + (right - left) * i / GRID_LINES;
        draw_line(&mut image, (x as i64, top as i64), (x as i64, bottom as i64), GRID);
    }
    draw_line(&mut image, (left as i64, bottom as i64), (right as i64, bottom as i64), AXIS);
    draw_line(&mut image, (left as i64, top as i64), (left as i64, bottom as i64), AXIS);

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    // A flat series is drawn through the middle of the plot area.
    let span = if max - min > f32::EPSILON { max - min } else { 1.0 };
    let offset = if max - min > f32::EPSILON { 0.0 } else { 0.5 };

    let plot_w = (right - left) as f32;
    let plot_h = (bottom - top) as f32;
    let points: Vec<(i64, i64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let fx = if values.len() > 1 {
                i as f32 / (values.len() - 1) as f32
            } else {
                0.5
            };
            let fy = (v - min) / span + offset;
            (
                (left as f32 + fx * plot_w).round() as i64,
                (bottom as f32 - fy * plot_h).round() as i64,
            )
        })
        .collect();

    for pair in points.windows(2) {
        draw_line(&mut image, pair[0], pair[1], LINE);
    }
    for &(x, y) in &points {
        draw_marker(&mut image, x, y, MARKER);
    }
    Ok(image)
}

fn put(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham
fn draw_line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(image, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_marker(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    for dx in -1..=1 {
        for dy in -1..=1 {
            put(image, x + dx, y + dy, color);
        }
    }
}
