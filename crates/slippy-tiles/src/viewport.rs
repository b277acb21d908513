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

//! Visible tile planning.
//!
//! Given a view and the panel size in pixels, work out which tiles cover the
//! panel and where their top-left corners land on screen. Tiles are laid out
//! around the tile that contains the view center, whose corner sits on the
//! panel center. Tiles that would fall outside the grid are never planned.

use crate::mercator::{lat_to_tile_y, lon_to_tile_x, WebMercator, TILE_SIZE};
use crate::tile::TileKey;
use crate::view::ViewState;

/// Where one tile is drawn, in panel pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub key: TileKey,
    /// Left edge of the tile.
    pub screen_x: i64,
    /// Top edge of the tile.
    pub screen_y: i64,
}

/// Plan the tiles covering a `width` x `height` panel.
///
/// Placements are ordered column by column, top to bottom.
#[must_use]
pub fn plan_viewport(view: &ViewState, width: u32, height: u32) -> Vec<TilePlacement> {
    let zoom = view.zoom();
    let center_x = lon_to_tile_x(view.longitude(), zoom);
    let center_y = lat_to_tile_y(view.latitude(), zoom);

    let tile = i64::from(TILE_SIZE);
    let width = i64::from(width);
    let height = i64::from(height);

    // One extra tile on each side covers the partial tiles at the edges
    let tiles_x = width / tile + 2;
    let tiles_y = height / tile + 2;

    let mut placements = Vec::new();
    for dx in -tiles_x / 2..=tiles_x / 2 {
        for dy in -tiles_y / 2..=tiles_y / 2 {
            let Some(key) = TileKey::new(zoom, center_x + dx, center_y + dy) else {
                continue;
            };
            placements.push(TilePlacement {
                key,
                screen_x: width / 2 + dx * tile,
                screen_y: height / 2 + dy * tile,
            });
        }
    }
    placements
}

/// Latitude and longitude under a panel pixel, using the same layout as
/// [`plan_viewport`].
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "tile indices stay below 2^20")]
pub fn screen_to_lat_lon(
    view: &ViewState,
    width: u32,
    height: u32,
    screen_x: f64,
    screen_y: f64,
) -> (f64, f64) {
    let zoom = view.zoom();
    let tile = f64::from(TILE_SIZE);
    let center_x = lon_to_tile_x(view.longitude(), zoom) as f64;
    let center_y = lat_to_tile_y(view.latitude(), zoom) as f64;

    // The center tile's corner sits on the integer panel center
    let x = center_x + (screen_x - f64::from(width / 2)) / tile;
    let y = center_y + (screen_y - f64::from(height / 2)) / tile;
    (WebMercator::tile_to_lat(y, zoom), WebMercator::tile_to_lon(x, zoom))
}
