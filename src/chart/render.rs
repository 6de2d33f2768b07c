//! Chart rendering: PNG through image/imageproc, and a text sparkline

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::monitor::Thresholds;
use crate::types::vitals::VitalsSample;

use super::{series, value_range, ChartPoint, ChartViewport, Metric};

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Nothing to plot in the visible window")]
    Empty,

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub struct ChartRenderer {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub background: [u8; 4],
    pub frame: [u8; 4],
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            margin: 24,
            background: [255, 255, 255, 255],
            frame: [90, 90, 90, 255],
        }
    }
}

impl ChartRenderer {
    /// Draw the visible window of the chosen metrics on one shared value
    /// axis, with dimmed threshold lines, and encode as PNG.
    pub fn render_png(
        &self,
        samples: &[VitalsSample],
        viewport: &ChartViewport,
        metrics: &[Metric],
        thresholds: &Thresholds,
    ) -> Result<Vec<u8>, ChartError> {
        let (start, end) = viewport.window().ok_or(ChartError::Empty)?;

        let plotted: Vec<(Metric, Vec<ChartPoint>)> = metrics
            .iter()
            .map(|m| (*m, viewport.visible(&series(samples, *m))))
            .filter(|(_, points)| !points.is_empty())
            .collect();
        if plotted.is_empty() {
            return Err(ChartError::Empty);
        }

        let all_points: Vec<ChartPoint> = plotted.iter().flat_map(|(_, p)| p.iter().copied()).collect();
        let references: Vec<(Metric, f64)> = plotted
            .iter()
            .flat_map(|(m, _)| m.reference_lines(thresholds).into_iter().map(move |v| (*m, v)))
            .collect();
        let ref_values: Vec<f64> = references.iter().map(|(_, v)| *v).collect();
        let (lo, hi) = value_range(&all_points, &ref_values).ok_or(ChartError::Empty)?;

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, Rgba(self.background));
        let plot = self.plot_area();
        draw_hollow_rect_mut(&mut canvas, plot, Rgba(self.frame));

        let span_ms = (end - start).num_milliseconds() as f64;
        let x_of = |p: &ChartPoint| -> f32 {
            let frac = if span_ms > 0.0 {
                (p.timestamp - start).num_milliseconds() as f64 / span_ms
            } else {
                0.5
            };
            plot.left() as f32 + (frac * f64::from(plot.width() - 1)) as f32
        };
        let y_of = |v: f64| -> f32 {
            let frac = (v - lo) / (hi - lo);
            plot.bottom() as f32 - (frac * f64::from(plot.height() - 1)) as f32
        };

        for (metric, value) in &references {
            let y = y_of(*value);
            draw_line_segment_mut(
                &mut canvas,
                (plot.left() as f32, y),
                (plot.right() as f32, y),
                Rgba(lighten(metric.color())),
            );
        }

        for (metric, points) in &plotted {
            let color = Rgba(metric.color());
            for pair in points.windows(2) {
                draw_line_segment_mut(
                    &mut canvas,
                    (x_of(&pair[0]), y_of(pair[0].value)),
                    (x_of(&pair[1]), y_of(pair[1].value)),
                    color,
                );
            }
            for point in points {
                let center = (x_of(point).round() as i32, y_of(point.value).round() as i32);
                draw_filled_circle_mut(&mut canvas, center, 2, color);
            }
        }

        let mut output = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut std::io::Cursor::new(&mut output), ImageOutputFormat::Png)?;
        Ok(output)
    }

    fn plot_area(&self) -> Rect {
        let margin = self.margin.min(self.width / 4).min(self.height / 4);
        Rect::at(margin as i32, margin as i32)
            .of_size((self.width - 2 * margin).max(2), (self.height - 2 * margin).max(2))
    }
}

/// Blend two thirds of the way towards white
fn lighten([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let mix = |c: u8| c + ((255 - c) as u16 * 2 / 3) as u8;
    [mix(r), mix(g), mix(b), a]
}

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One block character per point, scaled between the series min and max
pub fn sparkline(points: &[ChartPoint]) -> String {
    let Some((lo, hi)) = points.iter().map(|p| p.value).fold(None, |acc: Option<(f64, f64)>, v| {
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    }) else {
        return String::new();
    };

    points
        .iter()
        .map(|p| {
            if hi <= lo {
                BARS[BARS.len() / 2]
            } else {
                let idx = ((p.value - lo) / (hi - lo) * (BARS.len() - 1) as f64).round() as usize;
                BARS[idx.min(BARS.len() - 1)]
            }
        })
        .collect()
}
