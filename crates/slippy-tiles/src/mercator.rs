// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Web Mercator projection for the slippy map tiling scheme.
//!
//! Integer helpers pick the tile that contains a coordinate; the
//! [`WebMercator`] helpers work in fractional tile units so callers can place
//! sub-tile positions on screen.

use std::f64::consts::PI;

/// Edge length of a raster tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level served by the tile source.
pub const MAX_ZOOM: u8 = 19;

/// Latitude bound of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.0511;

/// Number of tiles along one axis at `zoom` (`2^zoom`).
#[must_use]
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2_f64.powi(i32::from(zoom))
}

/// Column of the tile containing `lon` at `zoom`.
///
/// Longitudes outside `[-180, 180)` are not clamped and yield indices outside
/// the grid.
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "floored value, saturating cast")]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> i64 {
    WebMercator::lon_to_x(lon, zoom).floor() as i64
}

/// Row of the tile containing `lat` at `zoom`.
///
/// Valid for `[-MAX_LATITUDE, MAX_LATITUDE]`; the projection diverges at the
/// poles.
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "floored value, saturating cast")]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> i64 {
    WebMercator::lat_to_y(lat, zoom).floor() as i64
}

/// Web Mercator projection utilities in fractional tile units.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl WebMercator {
    /// Convert longitude to a fractional tile column.
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        (lon + 180.0) / 360.0 * tiles_per_axis(zoom)
    }

    /// Convert latitude to a fractional tile row.
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        y * tiles_per_axis(zoom)
    }

    /// Convert a fractional tile column back to longitude.
    #[must_use]
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        x / tiles_per_axis(zoom) * 360.0 - 180.0
    }

    /// Convert a fractional tile row back to latitude.
    #[must_use]
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = tiles_per_axis(zoom);
        (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
    }
}
