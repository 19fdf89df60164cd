use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::core::band::Band;
use crate::core::colormap::{ColorMap, Rgb};
use crate::core::error::PipelineError;
use crate::core::field::{FieldConfig, FieldMode};
use crate::core::grid::{ChannelOrder, ElectrodeGrid};
use crate::core::interp::InterpolationMethod;
use crate::core::sequencer::PipelineConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    #[serde(default = "GridConfig::default_columns")]
    pub columns: usize,
    #[serde(default = "GridConfig::default_rows")]
    pub rows: usize,
    #[serde(default = "GridConfig::default_pitch")]
    pub pitch: f64,
    #[serde(default)]
    pub channel_order: ChannelOrder,
    /// Cell index (`row * columns + col`) per channel; overrides `channel_order`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_map: Option<Vec<usize>>,
}

impl GridConfig {
    fn default_columns() -> usize {
        8
    }
    fn default_rows() -> usize {
        4
    }
    fn default_pitch() -> f64 {
        2.0
    }

    pub fn build(&self) -> Result<ElectrodeGrid, PipelineError> {
        match &self.channel_map {
            Some(map) => ElectrodeGrid::with_channel_map(self.columns, self.rows, self.pitch, map),
            None => ElectrodeGrid::new(self.columns, self.rows, self.pitch, self.channel_order),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: Self::default_columns(),
            rows: Self::default_rows(),
            pitch: Self::default_pitch(),
            channel_order: ChannelOrder::default(),
            channel_map: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BandConfig {
    #[serde(default = "BandConfig::default_low_hz")]
    pub low_hz: f64,
    #[serde(default = "BandConfig::default_high_hz")]
    pub high_hz: f64,
    /// Required for every band in stacked mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colormap: Option<ColorMap>,
}

impl BandConfig {
    fn default_low_hz() -> f64 {
        12.0
    }
    fn default_high_hz() -> f64 {
        15.0
    }

    pub fn band(&self) -> Band {
        Band::new(self.low_hz, self.high_hz)
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            low_hz: Self::default_low_hz(),
            high_hz: Self::default_high_hz(),
            colormap: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSettings {
    #[serde(default = "FieldSettings::default_width")]
    pub width: usize,
    #[serde(default = "FieldSettings::default_height")]
    pub height: usize,
    #[serde(default = "FieldSettings::default_smoothing_kernel")]
    pub smoothing_kernel: usize,
    #[serde(default = "FieldSettings::default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default = "FieldSettings::default_display_gain")]
    pub display_gain: f64,
    #[serde(default = "FieldSettings::default_scalar_gain")]
    pub scalar_gain: f64,
    #[serde(default)]
    pub interpolation: InterpolationMethod,
}

impl FieldSettings {
    fn default_width() -> usize {
        700
    }
    fn default_height() -> usize {
        300
    }
    fn default_smoothing_kernel() -> usize {
        11
    }
    fn default_epsilon() -> f64 {
        1e-3
    }
    fn default_display_gain() -> f64 {
        2.0
    }
    fn default_scalar_gain() -> f64 {
        1.0
    }
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            smoothing_kernel: Self::default_smoothing_kernel(),
            epsilon: Self::default_epsilon(),
            mode: FieldMode::default(),
            display_gain: Self::default_display_gain(),
            scalar_gain: Self::default_scalar_gain(),
            interpolation: InterpolationMethod::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerStyle {
    /// Every marker drawn in `marker_color`.
    #[default]
    Fixed,
    /// Marker color follows the band's colormap at the marker amplitude.
    Colormap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub marker_style: MarkerStyle,
    #[serde(default = "RenderConfig::default_marker_color")]
    pub marker_color: Rgb,
    /// Largest marker radius in pixels, reached at the frame's peak |amplitude|.
    #[serde(default = "RenderConfig::default_marker_radius")]
    pub marker_radius: u32,
    /// Used to draw scalar-mode fields.
    #[serde(default)]
    pub fixed_colormap: ColorMap,
}

impl RenderConfig {
    fn default_marker_color() -> Rgb {
        [255, 255, 255]
    }
    fn default_marker_radius() -> u32 {
        8
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            marker_style: MarkerStyle::default(),
            marker_color: Self::default_marker_color(),
            marker_radius: Self::default_marker_radius(),
            fixed_colormap: ColorMap::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "ExportConfig::default_step")]
    pub step: f64,
    #[serde(default = "ExportConfig::default_out_dir")]
    pub out_dir: String,
    /// Frames buffered between the pipeline and the PNG writer.
    #[serde(default = "ExportConfig::default_queue_depth")]
    pub queue_depth: usize,
    #[serde(default)]
    pub parallel_bands: bool,
}

impl ExportConfig {
    fn default_step() -> f64 {
        1.0
    }
    fn default_out_dir() -> String {
        "frames".to_string()
    }
    fn default_queue_depth() -> usize {
        8
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            step: Self::default_step(),
            out_dir: Self::default_out_dir(),
            queue_depth: Self::default_queue_depth(),
            parallel_bands: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub field: FieldSettings,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default = "AppConfig::default_bands")]
    pub bands: Vec<BandConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            field: FieldSettings::default(),
            render: RenderConfig::default(),
            export: ExportConfig::default(),
            bands: Self::default_bands(),
        }
    }
}

impl AppConfig {
    fn default_bands() -> Vec<BandConfig> {
        vec![BandConfig::default()]
    }

    /// Library pipeline settings. Stacked mode needs a colormap on every band;
    /// scalar mode falls back to `render.fixed_colormap`.
    pub fn pipeline(&self) -> Result<PipelineConfig, PipelineError> {
        let mut colormaps = Vec::with_capacity(self.bands.len());
        for (i, band) in self.bands.iter().enumerate() {
            match (band.colormap, self.field.mode) {
                (Some(map), _) => colormaps.push(map),
                (None, FieldMode::Scalar) => colormaps.push(self.render.fixed_colormap),
                (None, FieldMode::Stacked) => {
                    return Err(PipelineError::InvalidConfig(format!(
                        "band {i} ({}) has no colormap; stacked mode needs one per band",
                        band.band()
                    )));
                }
            }
        }
        let config = PipelineConfig {
            bands: self.bands.iter().map(BandConfig::band).collect(),
            colormaps,
            field: FieldConfig {
                width: self.field.width,
                height: self.field.height,
                smoothing_kernel: self.field.smoothing_kernel,
                mode: self.field.mode,
                display_gain: self.field.display_gain,
                scalar_gain: self.field.scalar_gain,
                interpolation: self.field.interpolation,
            },
            epsilon: self.field.epsilon,
            parallel_bands: self.export.parallel_bands,
        };
        config.validate()?;
        Ok(config)
    }

    /// Strict load: missing, unreadable or malformed files are errors.
    pub fn load(path: &str) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| PipelineError::InvalidConfig(format!("failed to read {path}: {err}")))?;
        toml::from_str(&contents)
            .map_err(|err| PipelineError::InvalidConfig(format!("failed to parse {path}: {err}")))
    }

    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults (commented out) and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, Self::commented(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}; continuing with defaults"),
        }
        default_cfg
    }

    /// Comment out every key, keeping table headers so the layout stays visible.
    fn commented(text: &str) -> String {
        let mut commented = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                commented.push('\n');
            } else if trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('=') {
                commented.push_str(line);
                commented.push('\n');
            } else {
                commented.push_str("# ");
                commented.push_str(line);
                commented.push('\n');
            }
        }
        commented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "phaseflow_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.grid.columns, 8);
        assert_eq!(cfg.grid.rows, 4);
        assert_eq!(cfg.field.width, 700);
        assert_eq!(cfg.field.height, 300);
        assert_eq!(cfg.field.smoothing_kernel, 11);
        assert_eq!(cfg.field.display_gain, 2.0);
        assert_eq!(cfg.bands, vec![BandConfig::default()]);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[field]"), "should keep table headers");
        assert!(contents.contains("# width = 700"), "should write commented width");
        assert!(contents.contains("# epsilon = 0.001"), "should write commented epsilon");

        // The commented file parses back to the defaults.
        let reread = AppConfig::load(&path_str).expect("written defaults parse");
        assert_eq!(reread, AppConfig::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        let text = r#"
[grid]
columns = 4
rows = 2
channel_order = "row-major"

[field]
mode = "stacked"
display_gain = 1.2

[[bands]]
low_hz = 4.0
high_hz = 8.0
colormap = "hot"

[[bands]]
low_hz = 12.0
high_hz = 15.0
colormap = "winter"
"#;
        fs::write(&path, text).unwrap();

        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.grid.columns, 4);
        assert_eq!(cfg.grid.channel_order, ChannelOrder::RowMajor);
        assert_eq!(cfg.grid.pitch, 2.0);
        assert_eq!(cfg.field.mode, FieldMode::Stacked);
        assert_eq!(cfg.field.display_gain, 1.2);
        assert_eq!(cfg.bands.len(), 2);
        assert_eq!(cfg.bands[1].colormap, Some(ColorMap::Winter));

        let pipeline = cfg.pipeline().unwrap();
        assert_eq!(pipeline.colormaps, vec![ColorMap::Hot, ColorMap::Winter]);
        assert_eq!(pipeline.field.gain(), 1.2);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn stacked_mode_requires_colormaps() {
        let mut cfg = AppConfig::default();
        cfg.field.mode = FieldMode::Stacked;
        assert!(matches!(cfg.pipeline(), Err(PipelineError::InvalidConfig(_))));
        cfg.field.mode = FieldMode::Scalar;
        assert_eq!(cfg.pipeline().unwrap().colormaps, vec![ColorMap::Viridis]);
    }
}
