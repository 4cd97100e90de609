//! Grid geometry: cell size, counts, parity offsets, and snapping.
//!
//! The map image is normalized so its longer side spans `max(columns, rows)`
//! world units divided down to one cell per grid step. Geometry is always
//! derived, either from a config (`from_dimensions`) or from a loaded grid
//! plane and its material (`from_plane`), never stored twice.
//!
//! Parity decides where lines fall. With an even count the plane's center sits
//! on a grid line, so lines are at multiples of the ratio (offset 0). With an
//! odd count the center sits mid-cell, so lines shift by half a cell. Tokens
//! snap to cell centers, half a cell away from the nearest line.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use crate::camera::Vec3;
use crate::consts::EPSILON;
use crate::error::SceneError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// World-space size of one cell.
    pub ratio: f64,
    pub columns: u32,
    pub rows: u32,
    /// World-space plane width (`columns * ratio`).
    pub width: f64,
    /// World-space plane height (`rows * ratio`).
    pub height: f64,
}

impl GridGeometry {
    /// Derive geometry from map pixel dimensions and cell counts.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidDimensions`] when any value is non-positive, when
    /// the map does not divide evenly into cells, or when cells are not square.
    pub fn from_dimensions(map_width: f64, map_height: f64, columns: u32, rows: u32) -> Result<Self, SceneError> {
        if columns == 0 || rows == 0 {
            return Err(SceneError::InvalidDimensions(format!("grid {columns}x{rows} has no cells")));
        }
        if !(map_width > 0.0 && map_height > 0.0) || !map_width.is_finite() || !map_height.is_finite() {
            return Err(SceneError::InvalidDimensions(format!("map {map_width}x{map_height} has no area")));
        }

        let cols = f64::from(columns);
        let rws = f64::from(rows);
        let cell_width = map_width / cols;
        let cell_height = map_height / rws;

        if !is_whole(cell_width) || !is_whole(cell_height) {
            return Err(SceneError::InvalidDimensions(format!(
                "map {map_width}x{map_height} does not divide into {columns}x{rows} cells"
            )));
        }
        if (cell_width - cell_height).abs() > EPSILON {
            return Err(SceneError::InvalidDimensions(format!(
                "cells are {cell_width}x{cell_height}, expected square"
            )));
        }

        let max_cells = cols.max(rws);
        let width = map_width / max_cells;
        let height = map_height / max_cells;
        Ok(Self { ratio: width / cols, columns, rows, width, height })
    }

    /// Recover geometry from a grid plane's size and its material ratio.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidDimensions`] when the ratio or plane is degenerate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_plane(width: f64, height: f64, ratio: f64) -> Result<Self, SceneError> {
        if !(ratio > 0.0 && width > 0.0 && height > 0.0) {
            return Err(SceneError::InvalidDimensions(format!(
                "grid plane {width}x{height} with ratio {ratio}"
            )));
        }
        let columns = (width / ratio).round();
        let rows = (height / ratio).round();
        if columns < 1.0 || rows < 1.0 || columns > f64::from(u32::MAX) || rows > f64::from(u32::MAX) {
            return Err(SceneError::InvalidDimensions(format!(
                "grid plane {width}x{height} with ratio {ratio}"
            )));
        }
        Ok(Self { ratio, columns: columns as u32, rows: rows as u32, width, height })
    }

    /// Line offset along x: `0` for an even column count, `ratio / 2` for odd.
    #[must_use]
    pub fn offset_x(&self) -> f64 {
        line_offset(self.columns, self.ratio)
    }

    /// Line offset along z: `0` for an even row count, `ratio / 2` for odd.
    #[must_use]
    pub fn offset_z(&self) -> f64 {
        line_offset(self.rows, self.ratio)
    }

    /// Snap a position to the nearest cell center. Each axis uses its own
    /// parity; height is untouched. Snapping is idempotent.
    #[must_use]
    pub fn snap(&self, p: Vec3) -> Vec3 {
        Vec3 {
            x: snap_axis(p.x, self.offset_x(), self.ratio),
            y: p.y,
            z: snap_axis(p.z, self.offset_z(), self.ratio),
        }
    }

    /// World x coordinates of every vertical grid line across a plane centered at `center_x`.
    #[must_use]
    pub fn lines_x(&self, center_x: f64) -> Vec<f64> {
        lines(center_x - self.width / 2.0, center_x + self.width / 2.0, self.offset_x(), self.ratio)
    }

    /// World z coordinates of every horizontal grid line across a plane centered at `center_z`.
    #[must_use]
    pub fn lines_z(&self, center_z: f64) -> Vec<f64> {
        lines(center_z - self.height / 2.0, center_z + self.height / 2.0, self.offset_z(), self.ratio)
    }
}

/// `0` for even counts, half a cell for odd counts.
#[must_use]
pub fn line_offset(count: u32, ratio: f64) -> f64 {
    if count % 2 == 0 { 0.0 } else { ratio / 2.0 }
}

fn snap_axis(v: f64, line_offset: f64, ratio: f64) -> f64 {
    let center = line_offset + ratio / 2.0;
    ((v - center) / ratio).round() * ratio + center
}

fn is_whole(v: f64) -> bool {
    (v - v.round()).abs() <= EPSILON * v.abs().max(1.0)
}

fn lines(min: f64, max: f64, offset: f64, ratio: f64) -> Vec<f64> {
    let mut out = Vec::new();
    if ratio <= 0.0 {
        return out;
    }
    let mut v = ((min - offset) / ratio).ceil() * ratio + offset;
    while v <= max + EPSILON {
        out.push(v);
        v += ratio;
    }
    out
}
