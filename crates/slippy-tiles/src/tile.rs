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

//! Tile identifiers.

use std::fmt;

/// Default OpenStreetMap raster tile endpoint.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Identifies a single raster tile in the slippy map grid.
///
/// A key can only be built through [`TileKey::new`], which keeps `x` and `y`
/// inside `[0, 2^zoom - 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    zoom: u8,
    x: u32,
    y: u32,
}

impl TileKey {
    /// Build a key, or `None` when either index falls outside the grid.
    #[must_use]
    pub fn new(zoom: u8, x: i64, y: i64) -> Option<Self> {
        let max = max_tile_index(zoom)?;
        if !(0..=max).contains(&x) || !(0..=max).contains(&y) {
            return None;
        }
        Some(Self {
            zoom,
            x: u32::try_from(x).ok()?,
            y: u32::try_from(y).ok()?,
        })
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    #[must_use]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Expand a URL template, substituting `{z}`, `{x}` and `{y}`.
    #[must_use]
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Largest valid index at `zoom` (`2^zoom - 1`), `None` past what fits a `u32` grid.
#[must_use]
pub fn max_tile_index(zoom: u8) -> Option<i64> {
    if zoom > 31 {
        return None;
    }
    Some((1_i64 << zoom) - 1)
}
