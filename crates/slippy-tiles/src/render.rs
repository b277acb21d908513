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

//! Synchronous viewport rendering.
//!
//! Every visible tile is fetched from the [`TileSource`] in turn and handed to
//! a [`TileCanvas`]. A tile that fails is logged and left blank; the rest of
//! the grid is still drawn.

use log::warn;

use crate::source::{TileImage, TileSource};
use crate::view::ViewState;
use crate::viewport::{plan_viewport, TilePlacement};

/// Drawing surface for tiles.
///
/// Implementations paint `image` with its top-left corner at the placement,
/// scaled to `TILE_SIZE` x `TILE_SIZE` pixels.
pub trait TileCanvas {
    fn draw_tile(&mut self, placement: &TilePlacement, image: &TileImage);
}

/// Outcome counts for one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    pub failed: usize,
    /// Tiles requested but not available yet (background loading only).
    pub pending: usize,
}

impl RenderStats {
    #[must_use]
    pub fn planned(&self) -> usize {
        self.drawn + self.failed + self.pending
    }
}

/// Fetch and draw every tile covering a `width` x `height` panel.
pub fn render_viewport<S, C>(
    view: &ViewState,
    width: u32,
    height: u32,
    source: &S,
    canvas: &mut C,
) -> RenderStats
where
    S: TileSource + ?Sized,
    C: TileCanvas + ?Sized,
{
    let mut stats = RenderStats::default();
    for placement in plan_viewport(view, width, height) {
        match source.fetch(placement.key) {
            Ok(image) => {
                canvas.draw_tile(&placement, &image);
                stats.drawn += 1;
            }
            Err(e) => {
                warn!("Failed to load tile {}: {}", placement.key, e);
                stats.failed += 1;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use crate::tile::TileKey;
    use image::RgbaImage;
    use std::sync::Mutex;

    /// Serves blank tiles and records every request; `broken` keys fail.
    #[derive(Default)]
    struct RecordingSource {
        requests: Mutex<Vec<TileKey>>,
        broken: Vec<TileKey>,
    }

    impl TileSource for RecordingSource {
        fn fetch(&self, key: TileKey) -> Result<TileImage, FetchError> {
            self.requests.lock().unwrap().push(key);
            if self.broken.contains(&key) {
                return Err(FetchError::Status { key, status: 503 });
            }
            Ok(TileImage::from(RgbaImage::new(256, 256)))
        }
    }

    #[derive(Default)]
    struct RecordingCanvas {
        drawn: Vec<TilePlacement>,
    }

    impl TileCanvas for RecordingCanvas {
        fn draw_tile(&mut self, placement: &TilePlacement, _image: &TileImage) {
            self.drawn.push(*placement);
        }
    }

    #[test]
    fn test_renders_every_planned_tile() {
        let view = ViewState::default();
        let source = RecordingSource::default();
        let mut canvas = RecordingCanvas::default();

        let stats = render_viewport(&view, 800, 600, &source, &mut canvas);

        assert_eq!(stats, RenderStats { drawn: 25, failed: 0, pending: 0 });
        assert_eq!(canvas.drawn, plan_viewport(&view, 800, 600));
    }

    #[test]
    fn test_out_of_grid_tiles_never_reach_the_source() {
        let view = ViewState::new(0.0, 0.0, 0);
        let source = RecordingSource::default();
        let mut canvas = RecordingCanvas::default();

        let stats = render_viewport(&view, 800, 600, &source, &mut canvas);

        assert_eq!(stats.planned(), 1);
        assert_eq!(*source.requests.lock().unwrap(), vec![TileKey::new(0, 0, 0).unwrap()]);
    }

    #[test]
    fn test_failed_tile_does_not_block_neighbours() {
        let view = ViewState::default();
        let broken = TileKey::new(3, 4, 2).unwrap();
        let source = RecordingSource {
            broken: vec![broken],
            ..Default::default()
        };
        let mut canvas = RecordingCanvas::default();

        let stats = render_viewport(&view, 800, 600, &source, &mut canvas);

        assert_eq!(stats.drawn, 24);
        assert_eq!(stats.failed, 1);
        assert!(canvas.drawn.iter().all(|p| p.key != broken));
        assert!(canvas.drawn.iter().any(|p| p.key == TileKey::new(3, 5, 2).unwrap()));
        assert!(canvas.drawn.iter().any(|p| p.key == TileKey::new(3, 4, 3).unwrap()));
    }

    #[test]
    fn test_all_failures_render_nothing() {
        let view = ViewState::new(0.0, 0.0, 1);
        let source = RecordingSource {
            broken: plan_viewport(&view, 300, 300).iter().map(|p| p.key).collect(),
            ..Default::default()
        };
        let mut canvas = RecordingCanvas::default();

        let stats = render_viewport(&view, 300, 300, &source, &mut canvas);

        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.failed, 4);
        assert!(canvas.drawn.is_empty());
    }
}
