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

//! Map view state and the input reducer.
//!
//! The viewer never mutates its view directly: every wheel step or drag is
//! turned into a [`ViewEvent`] and folded into a new [`ViewState`] through
//! [`ViewState::apply`]. The constructor and the reducer both keep the state
//! inside the Web Mercator bounds.

use crate::mercator::{tiles_per_axis, MAX_LATITUDE, MAX_ZOOM, TILE_SIZE};

/// Default center latitude (Bitola, North Macedonia).
pub const DEFAULT_LATITUDE: f64 = 41.9981;
/// Default center longitude.
pub const DEFAULT_LONGITUDE: f64 = 21.4254;
/// Zoom level the viewer starts at.
pub const DEFAULT_ZOOM: u8 = 3;

/// Center and zoom of the map panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    latitude: f64,
    longitude: f64,
    zoom: u8,
}

/// Input events understood by the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// One wheel notch toward the user's screen.
    ZoomIn,
    /// One wheel notch away.
    ZoomOut,
    /// Pointer drag by a pixel delta since the previous drag event.
    Drag { dx: f64, dy: f64 },
    /// Jump to a coordinate, keeping the zoom level.
    CenterOn { latitude: f64, longitude: f64 },
}

impl ViewEvent {
    /// Map a vertical scroll delta to a zoom step; positive scrolls up.
    #[must_use]
    pub fn from_scroll(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(Self::ZoomIn)
        } else if delta_y < 0.0 {
            Some(Self::ZoomOut)
        } else {
            None
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_ZOOM)
    }
}

impl ViewState {
    /// Create a view, clamping latitude and zoom and wrapping longitude.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, zoom: u8) -> Self {
        Self {
            latitude: clamp_latitude(latitude),
            longitude: wrap_longitude(longitude),
            zoom: zoom.min(MAX_ZOOM),
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Fold one input event into a new view.
    #[must_use]
    pub fn apply(self, event: ViewEvent) -> Self {
        match event {
            ViewEvent::ZoomIn => Self {
                zoom: self.zoom.saturating_add(1).min(MAX_ZOOM),
                ..self
            },
            ViewEvent::ZoomOut => Self {
                zoom: self.zoom.saturating_sub(1),
                ..self
            },
            ViewEvent::Drag { dx, dy } => self.dragged(dx, dy),
            ViewEvent::CenterOn {
                latitude,
                longitude,
            } => Self::new(latitude, longitude, self.zoom),
        }
    }

    fn dragged(self, dx: f64, dy: f64) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return self;
        }

        let scale = tiles_per_axis(self.zoom);
        let tile = f64::from(TILE_SIZE);
        let longitude = self.longitude - dx / tile * 360.0 / scale;
        let latitude = self.latitude + dy / tile * 180.0 / scale;

        Self {
            latitude: clamp_latitude(latitude),
            longitude: wrap_longitude(longitude),
            zoom: self.zoom,
        }
    }
}

/// Wrap a longitude into `[-180, 180)`; values already inside are untouched.
#[must_use]
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        longitude
    } else {
        let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        // rem_euclid rounds up to 360 for inputs a hair below -180
        if wrapped >= 180.0 {
            -180.0
        } else {
            wrapped
        }
    }
}

/// Clamp a latitude into the Web Mercator band.
#[must_use]
pub fn clamp_latitude(latitude: f64) -> f64 {
    latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}
