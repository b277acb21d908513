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

//! Tile image upload and painting helpers.

use std::collections::{HashMap, HashSet};

use egui::{ColorImage, Painter, Pos2, Rect, TextureHandle, TextureId, TextureOptions};
use slippy_tiles::{TileCanvas, TileImage, TileKey, TilePlacement, TILE_SIZE};

/// Convert a decoded tile into an egui image.
pub fn color_image(image: &TileImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}

fn texture_name(key: TileKey) -> String {
    format!("tile_{}_{}/{}", key.zoom(), key.x(), key.y())
}

/// Paint a texture at a tile placement, scaled to one tile.
pub fn paint_tile(painter: &Painter, origin: Pos2, placement: &TilePlacement, texture: TextureId) {
    #[allow(clippy::cast_precision_loss, reason = "screen offsets are small")]
    let min = origin + egui::vec2(placement.screen_x as f32, placement.screen_y as f32);
    #[allow(clippy::cast_precision_loss, reason = "tile size is 256")]
    let rect = Rect::from_min_size(min, egui::Vec2::splat(TILE_SIZE as f32));

    painter.image(
        texture,
        rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
}

/// GPU textures for the tiles currently on screen.
#[derive(Default)]
pub struct TileTextures {
    textures: HashMap<TileKey, TextureHandle>,
}

impl std::fmt::Debug for TileTextures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileTextures")
            .field("count", &self.textures.len())
            .finish()
    }
}

impl TileTextures {
    pub fn get(&self, key: TileKey) -> Option<&TextureHandle> {
        self.textures.get(&key)
    }

    /// Upload `image` for `key`, replacing any previous texture.
    pub fn upload(&mut self, ctx: &egui::Context, key: TileKey, image: &TileImage) -> &TextureHandle {
        let texture = ctx.load_texture(texture_name(key), color_image(image), TextureOptions::LINEAR);
        self.textures.insert(key, texture);
        &self.textures[&key]
    }

    /// Drop textures for tiles that left the view.
    pub fn retain_visible(&mut self, keys: &[TileKey]) {
        let visible: HashSet<TileKey> = keys.iter().copied().collect();
        self.textures.retain(|key, _| visible.contains(key));
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }
}

/// Canvas that uploads and paints each tile as it is handed over.
///
/// Textures live only for the current frame.
pub struct PainterCanvas<'a> {
    pub ctx: &'a egui::Context,
    pub painter: &'a Painter,
    pub origin: Pos2,
}

impl TileCanvas for PainterCanvas<'_> {
    fn draw_tile(&mut self, placement: &TilePlacement, image: &TileImage) {
        let texture = self.ctx.load_texture(
            texture_name(placement.key),
            color_image(image),
            TextureOptions::LINEAR,
        );
        paint_tile(self.painter, self.origin, placement, texture.id());
    }
}
