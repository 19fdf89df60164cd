//! Regular rectangular electrode lattice.
//!
//! Channels map one-to-one onto `(col, row)` cells. Rest positions sit on a
//! uniform lattice with spacing `pitch`, origin at cell (0, 0).

use serde::{Deserialize, Serialize};

use crate::core::error::PipelineError;

/// How channel numbers are laid onto the lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelOrder {
    /// Channel `c` sits at `row = c % rows`, `col = c / rows`.
    #[default]
    ColumnMajor,
    /// Channel `c` sits at `col = c % columns`, `row = c / columns`.
    RowMajor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElectrodeGrid {
    columns: usize,
    rows: usize,
    pitch: f64,
    /// `(col, row)` per channel.
    cells: Vec<(usize, usize)>,
    /// Channel per cell, indexed `row * columns + col`.
    channel_at: Vec<usize>,
}

impl ElectrodeGrid {
    pub fn new(
        columns: usize,
        rows: usize,
        pitch: f64,
        order: ChannelOrder,
    ) -> Result<Self, PipelineError> {
        Self::check_dims(columns, rows, pitch)?;
        let cells = (0..columns * rows)
            .map(|c| match order {
                ChannelOrder::ColumnMajor => (c / rows, c % rows),
                ChannelOrder::RowMajor => (c % columns, c / columns),
            })
            .collect();
        Self::from_cells(columns, rows, pitch, cells)
    }

    /// Explicit layout: `cell_of_channel[c]` is the linear cell index
    /// (`row * columns + col`) of channel `c`. Must be a permutation.
    pub fn with_channel_map(
        columns: usize,
        rows: usize,
        pitch: f64,
        cell_of_channel: &[usize],
    ) -> Result<Self, PipelineError> {
        Self::check_dims(columns, rows, pitch)?;
        let n = columns * rows;
        if cell_of_channel.len() != n {
            return Err(PipelineError::InvalidGrid(format!(
                "channel map has {} entries, grid has {n} cells",
                cell_of_channel.len()
            )));
        }
        let cells = cell_of_channel
            .iter()
            .map(|&cell| (cell % columns, cell / columns))
            .collect();
        Self::from_cells(columns, rows, pitch, cells)
    }

    fn check_dims(columns: usize, rows: usize, pitch: f64) -> Result<(), PipelineError> {
        if columns == 0 || rows == 0 {
            return Err(PipelineError::InvalidGrid(format!(
                "dimensions must be positive, got {columns}x{rows}"
            )));
        }
        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(PipelineError::InvalidGrid(format!(
                "pitch must be finite and positive, got {pitch}"
            )));
        }
        Ok(())
    }

    fn from_cells(
        columns: usize,
        rows: usize,
        pitch: f64,
        cells: Vec<(usize, usize)>,
    ) -> Result<Self, PipelineError> {
        let mut channel_at = vec![usize::MAX; columns * rows];
        for (ch, &(col, row)) in cells.iter().enumerate() {
            if col >= columns || row >= rows {
                return Err(PipelineError::InvalidGrid(format!(
                    "channel {ch} maps outside the lattice"
                )));
            }
            let slot = &mut channel_at[row * columns + col];
            if *slot != usize::MAX {
                return Err(PipelineError::InvalidGrid(format!(
                    "channels {} and {ch} share cell ({col}, {row})",
                    *slot
                )));
            }
            *slot = ch;
        }
        Ok(Self {
            columns,
            rows,
            pitch,
            cells,
            channel_at,
        })
    }

    /// Fails with `ChannelCountMismatch` unless `channels == columns * rows`.
    pub fn check_channel_count(&self, channels: usize) -> Result<(), PipelineError> {
        if channels != self.channel_count() {
            return Err(PipelineError::ChannelCountMismatch {
                channels,
                columns: self.columns,
                rows: self.rows,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cell(&self, ch: usize) -> (usize, usize) {
        self.cells[ch]
    }

    /// Rest position of a channel in physical units.
    #[inline]
    pub fn position(&self, ch: usize) -> (f64, f64) {
        let (col, row) = self.cells[ch];
        (col as f64 * self.pitch, row as f64 * self.pitch)
    }

    pub fn rest_positions(&self) -> Vec<(f64, f64)> {
        (0..self.channel_count()).map(|ch| self.position(ch)).collect()
    }

    /// Physical bounding box `(x_min, x_max, y_min, y_max)` of the rest lattice.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        (
            0.0,
            (self.columns - 1) as f64 * self.pitch,
            0.0,
            (self.rows - 1) as f64 * self.pitch,
        )
    }

    /// Lay a per-channel vector onto the lattice, row-major (`[row * columns + col]`).
    pub fn to_lattice(&self, per_channel: &[f64]) -> Vec<f64> {
        debug_assert_eq!(per_channel.len(), self.channel_count());
        self.channel_at.iter().map(|&ch| per_channel[ch]).collect()
    }

    /// Inverse of [`ElectrodeGrid::to_lattice`].
    pub fn from_lattice(&self, lattice: &[f64]) -> Vec<f64> {
        debug_assert_eq!(lattice.len(), self.channel_at.len());
        self.cells
            .iter()
            .map(|&(col, row)| lattice[row * self.columns + col])
            .collect()
    }
}
