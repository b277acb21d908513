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

//! Top-level eframe application.

use slippy_tiles::{FetchError, ViewEvent, ViewState};

use crate::config::AppConfig;
use crate::map::MapPanel;

#[derive(Debug)]
pub struct MapViewerApp {
    view: ViewState,
    panel: MapPanel,
}

impl MapViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Result<Self, FetchError> {
        let view = config.initial_view();
        log::info!(
            "Map centered on {:.4}, {:.4} at zoom {} ({:?} fetching)",
            view.latitude(),
            view.longitude(),
            view.zoom(),
            config.fetch_mode
        );

        Ok(Self {
            view,
            panel: MapPanel::new(&cc.egui_ctx, config)?,
        })
    }
}

/// Fold a frame's input into the view.
fn apply_events(view: ViewState, events: Vec<ViewEvent>) -> ViewState {
    events.into_iter().fold(view, ViewState::apply)
}

impl eframe::App for MapViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let events = self.panel.show(ui, &self.view);
                if !events.is_empty() {
                    self.view = apply_events(self.view, events);
                    ctx.request_repaint();
                }
            });
    }
}
