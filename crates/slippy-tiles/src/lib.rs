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

//! Slippy map tile math, viewport planning and raster tile fetching.
//!
//! The crate is split into small layers that can be used on their own:
//!
//! - **Projection**: [`lon_to_tile_x`], [`lat_to_tile_y`] and the fractional
//!   [`WebMercator`] helpers
//! - **View**: [`ViewState`] and the [`ViewEvent`] reducer for zoom and pan
//! - **Planning**: [`plan_viewport`] lists the tiles covering a panel and
//!   where they go on screen
//! - **Fetching**: the [`TileSource`] trait and the blocking
//!   [`HttpTileSource`]
//! - **Rendering**: [`render_viewport`] draws synchronously through a
//!   [`TileCanvas`]; [`TileLoader`] fetches in the background instead
//!
//! # Example
//!
//! ```
//! use slippy_tiles::{lat_to_tile_y, lon_to_tile_x, plan_viewport, ViewEvent, ViewState};
//!
//! assert_eq!(lon_to_tile_x(21.4254, 3), 4);
//! assert_eq!(lat_to_tile_y(41.9981, 3), 2);
//!
//! let view = ViewState::default().apply(ViewEvent::ZoomIn);
//! for placement in plan_viewport(&view, 800, 600) {
//!     println!("{} at {},{}", placement.key, placement.screen_x, placement.screen_y);
//! }
//! ```

pub mod loader;
pub mod mercator;
pub mod render;
pub mod source;
pub mod tile;
pub mod view;
pub mod viewport;

pub use loader::{TileLoader, TileState, DEFAULT_WORKERS};
pub use mercator::{
    lat_to_tile_y, lon_to_tile_x, tiles_per_axis, WebMercator, MAX_LATITUDE, MAX_ZOOM, TILE_SIZE,
};
pub use render::{render_viewport, RenderStats, TileCanvas};
pub use source::{
    FetchError, HttpSourceConfig, HttpTileSource, TileImage, TileSource, DEFAULT_USER_AGENT,
};
pub use tile::{max_tile_index, TileKey, OSM_TILE_URL};
pub use view::{
    clamp_latitude, wrap_longitude, ViewEvent, ViewState, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    DEFAULT_ZOOM,
};
pub use viewport::{plan_viewport, screen_to_lat_lon, TilePlacement};
