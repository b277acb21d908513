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

//! The map panel: paints visible tiles and turns pointer input into view events.

use std::sync::Arc;

use log::{debug, info};
use slippy_tiles::{
    plan_viewport, render_viewport, screen_to_lat_lon, FetchError, HttpTileSource, RenderStats, TileKey, TileLoader,
    TileState, ViewEvent, ViewState,
};

use super::textures::{paint_tile, PainterCanvas, TileTextures};
use crate::config::{AppConfig, FetchMode};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(238, 238, 238);
const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Scroll distance in points per zoom step; one wheel notch on native.
const SCROLL_STEP: f32 = 40.0;

/// Where tile images come from while painting.
#[derive(Debug)]
enum TileFetcher {
    /// Fetch every visible tile inside the paint call.
    Blocking(HttpTileSource),
    /// Paint what has arrived; workers fetch the rest.
    Background {
        loader: TileLoader,
        textures: TileTextures,
    },
}

#[derive(Debug)]
pub struct MapPanel {
    fetcher: TileFetcher,
    last_stats: RenderStats,
    scroll: f32,
}

impl MapPanel {
    pub fn new(ctx: &egui::Context, config: &AppConfig) -> Result<Self, FetchError> {
        let source = HttpTileSource::new(config.http_source())?;
        info!("Fetching tiles from {}", source.url_template());

        let fetcher = match config.fetch_mode {
            FetchMode::Blocking => TileFetcher::Blocking(source),
            FetchMode::Background => {
                let repaint = ctx.clone();
                let loader = TileLoader::spawn(Arc::new(source), config.fetch_workers, move || {
                    repaint.request_repaint();
                });
                TileFetcher::Background {
                    loader,
                    textures: TileTextures::default(),
                }
            }
        };

        Ok(Self {
            fetcher,
            last_stats: RenderStats::default(),
            scroll: 0.0,
        })
    }

    /// Paint `view` into the remaining space of `ui` and collect this frame's input.
    pub fn show(&mut self, ui: &mut egui::Ui, view: &ViewState) -> Vec<ViewEvent> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, BACKGROUND);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "panel size in whole points")]
        let (width, height) = (rect.width() as u32, rect.height() as u32);

        let stats = match &mut self.fetcher {
            TileFetcher::Blocking(source) => {
                let mut canvas = PainterCanvas {
                    ctx: ui.ctx(),
                    painter: &painter,
                    origin: rect.min,
                };
                render_viewport(view, width, height, &*source, &mut canvas)
            }
            TileFetcher::Background { loader, textures } => {
                paint_loaded(ui.ctx(), &painter, rect.min, view, (width, height), loader, textures)
            }
        };
        if stats != self.last_stats {
            debug!(
                "Tiles at zoom {}: {} planned, {} drawn, {} pending, {} failed",
                view.zoom(),
                stats.planned(),
                stats.drawn,
                stats.pending,
                stats.failed
            );
            self.last_stats = stats;
        }

        painter.text(
            rect.right_bottom() + egui::vec2(-6.0, -4.0),
            egui::Align2::RIGHT_BOTTOM,
            ATTRIBUTION,
            egui::FontId::proportional(10.0),
            egui::Color32::from_black_alpha(180),
        );

        if let Some(pointer) = response.hover_pos() {
            let offset = pointer - rect.min;
            let (lat, lon) = screen_to_lat_lon(
                view,
                width,
                height,
                f64::from(offset.x),
                f64::from(offset.y),
            );
            painter.text(
                rect.left_top() + egui::vec2(6.0, 4.0),
                egui::Align2::LEFT_TOP,
                format!("{lat:.4}, {lon:.4}"),
                egui::FontId::monospace(11.0),
                egui::Color32::from_black_alpha(200),
            );
        }

        input_events(&mut self.scroll, ui, &response)
    }
}

fn paint_loaded(
    ctx: &egui::Context,
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &ViewState,
    (width, height): (u32, u32),
    loader: &TileLoader,
    textures: &mut TileTextures,
) -> RenderStats {
    let placements = plan_viewport(view, width, height);
    let keys: Vec<TileKey> = placements.iter().map(|p| p.key).collect();
    loader.request_visible(&keys);
    textures.retain_visible(&keys);

    let mut stats = RenderStats::default();
    for placement in &placements {
        let texture = match textures.get(placement.key) {
            Some(texture) => texture.id(),
            None => match loader.state(placement.key) {
                Some(TileState::Loaded(image)) => textures.upload(ctx, placement.key, &image).id(),
                Some(TileState::Failed | TileState::Loading) | None => continue,
            },
        };
        paint_tile(painter, origin, placement, texture);
        stats.drawn += 1;
    }
    debug_assert!(textures.len() <= keys.len());
    stats.pending = loader.pending_count();
    stats.failed = loader.failed_count();
    stats
}

/// Wheel steps zoom by one level while hovered; drags pan.
fn input_events(scroll: &mut f32, ui: &egui::Ui, response: &egui::Response) -> Vec<ViewEvent> {
    let mut events = Vec::new();

    if response.hovered() {
        let delta = ui.input(|i| i.raw_scroll_delta.y);
        events.extend(scroll_step(scroll, delta));
    }

    if response.dragged() {
        let delta = response.drag_delta();
        events.push(ViewEvent::Drag {
            dx: f64::from(delta.x),
            dy: f64::from(delta.y),
        });
    }

    events
}

/// Accumulate scroll until it covers a full step, so a trackpad swipe spread
/// over many frames zooms by its distance rather than its frame count.
fn scroll_step(accumulated: &mut f32, delta: f32) -> Option<ViewEvent> {
    if delta == 0.0 {
        return None;
    }
    if accumulated.signum() != delta.signum() {
        *accumulated = 0.0;
    }
    *accumulated += delta;
    if accumulated.abs() < SCROLL_STEP {
        return None;
    }
    let event = ViewEvent::from_scroll(*accumulated);
    *accumulated = 0.0;
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_notch_is_one_step() {
        let mut scroll = 0.0;
        assert_eq!(scroll_step(&mut scroll, SCROLL_STEP), Some(ViewEvent::ZoomIn));
        assert_eq!(scroll_step(&mut scroll, -SCROLL_STEP), Some(ViewEvent::ZoomOut));
        assert_eq!(scroll_step(&mut scroll, 0.0), None);
    }

    #[test]
    fn test_trackpad_swipe_zooms_by_distance() {
        let mut scroll = 0.0;
        let steps = (0..20)
            .filter_map(|_| scroll_step(&mut scroll, 4.0))
            .count();
        // 80 points of swipe over 20 frames
        assert_eq!(steps, 2);
    }

    #[test]
    fn test_direction_change_resets_accumulator() {
        let mut scroll = 0.0;
        assert_eq!(scroll_step(&mut scroll, 30.0), None);
        assert_eq!(scroll_step(&mut scroll, -30.0), None);
        assert_eq!(scroll_step(&mut scroll, -10.0), Some(ViewEvent::ZoomOut));
    }
}
