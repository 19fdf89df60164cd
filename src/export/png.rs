use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use phaseflow::config::{MarkerStyle, RenderConfig};
use phaseflow::{ColorLut, ColorMap, RenderableFrame};

/// Draws one band of one frame: field pixels plus amplitude-sized markers.
/// Row 0 of the field is the bottom image row.
pub struct FrameRenderer {
    render: RenderConfig,
    scalar_lut: ColorLut,
    band_luts: Vec<ColorLut>,
    /// Physical `(x_min, x_max, y_min, y_max)` covered by the field.
    extent: (f64, f64, f64, f64),
}

impl FrameRenderer {
    pub fn new(render: RenderConfig, colormaps: &[ColorMap], extent: (f64, f64, f64, f64)) -> Self {
        Self {
            scalar_lut: render.fixed_colormap.lut(),
            band_luts: colormaps.iter().map(|m| m.lut()).collect(),
            render,
            extent,
        }
    }

    fn to_pixel(&self, frame: &RenderableFrame, x: f64, y: f64) -> (i32, i32) {
        let (x0, x1, y0, y1) = self.extent;
        let u = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.5 };
        let v = if y1 > y0 { (y - y0) / (y1 - y0) } else { 0.5 };
        let px = (u * (frame.width - 1) as f64).round() as i32;
        let py = ((1.0 - v) * (frame.height - 1) as f64).round() as i32;
        (px, py)
    }

    pub fn render(&self, frame: &RenderableFrame, band_index: usize, path: &Path) -> Result<(), Box<dyn Error>> {
        let (w, h) = (frame.width, frame.height);
        let root = BitMapBackend::new(path, (w as u32, h as u32)).into_drawing_area();
        root.fill(&BLACK)?;

        let colors = match &frame.rgb {
            Some(rgb) => rgb.clone(),
            None => self.scalar_lut.map_autoscaled(&frame.field),
        };
        for row in 0..h {
            let py = (h - 1 - row) as i32;
            for col in 0..w {
                let [r, g, b] = colors[row * w + col];
                root.draw_pixel((col as i32, py), &RGBColor(r, g, b))?;
            }
        }

        let peak = frame
            .markers
            .iter()
            .map(|m| m.amplitude.abs())
            .filter(|a| a.is_finite())
            .fold(0.0_f64, f64::max);
        let amplitudes: Vec<f64> = frame.markers.iter().map(|m| m.amplitude).collect();
        let marker_colors = match self.render.marker_style {
            MarkerStyle::Fixed => vec![self.render.marker_color; amplitudes.len()],
            MarkerStyle::Colormap => self
                .band_luts
                .get(band_index)
                .unwrap_or(&self.scalar_lut)
                .map_autoscaled(&amplitudes),
        };
        for (marker, [r, g, b]) in frame.markers.iter().zip(marker_colors) {
            let scale = if peak > 0.0 { marker.amplitude.abs() / peak } else { 0.0 };
            let radius = ((scale * self.render.marker_radius as f64).round() as i32).max(1);
            let center = self.to_pixel(frame, marker.x, marker.y);
            root.draw(&Circle::new(center, radius, RGBColor(r, g, b).filled()))?;
        }

        root.present()?;
        Ok(())
    }
}
