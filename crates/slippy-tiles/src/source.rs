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

//! Tile image sources.
//!
//! [`TileSource`] is the seam between the renderer and the network. The
//! production implementation, [`HttpTileSource`], issues one blocking GET per
//! tile and decodes the body with the `image` crate.

use std::time::Duration;

use image::RgbaImage;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::tile::{TileKey, OSM_TILE_URL};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("osm-viewer/", env!("CARGO_PKG_VERSION"));

/// Reasons a tile could not be produced.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tile {key} unavailable: HTTP {status}")]
    Status { key: TileKey, status: u16 },

    #[error("could not decode tile image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded raster tile in RGBA8.
#[derive(Clone)]
pub struct TileImage {
    pixels: RgbaImage,
}

impl std::fmt::Debug for TileImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish_non_exhaustive()
    }
}

impl TileImage {
    /// Decode an encoded image (PNG, JPEG, ...) into RGBA.
    pub fn decode(bytes: &[u8]) -> Result<Self, FetchError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from(decoded.to_rgba8()))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixel data, row-major, unpremultiplied RGBA.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

impl From<RgbaImage> for TileImage {
    fn from(pixels: RgbaImage) -> Self {
        Self { pixels }
    }
}

/// Something that can produce the image for a tile.
pub trait TileSource: Send + Sync {
    fn fetch(&self, key: TileKey) -> Result<TileImage, FetchError>;
}

/// Settings for [`HttpTileSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// URL with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Sent as the `User-Agent` header; tile servers reject anonymous clients.
    pub user_agent: String,
    /// Request timeout. `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

/// Blocking HTTP tile source.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: Client,
    url_template: String,
}

impl HttpTileSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url_template: config.url_template,
        })
    }

    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, key: TileKey) -> Result<TileImage, FetchError> {
        let url = key.url(&self.url_template);
        debug!("Downloading tile: {url}");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                key,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;
        TileImage::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(256, 256, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Serve a single HTTP response and hand back the raw request.
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/{{z}}/{{x}}/{{y}}.png"), handle)
    }

    fn source(url_template: String) -> HttpTileSource {
        HttpTileSource::new(HttpSourceConfig {
            url_template,
            user_agent: "osm-viewer-test/1.0".to_string(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn test_fetch_decodes_png() {
        let (template, server) = serve_once("200 OK", png_bytes());
        let key = TileKey::new(3, 4, 2).unwrap();

        let tile = source(template).fetch(key).unwrap();
        assert_eq!((tile.width(), tile.height()), (256, 256));
        assert_eq!(&tile.as_raw()[..4], &[10, 20, 30, 255]);

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /3/4/2.png HTTP/1.1"), "{request}");
        assert!(
            request.to_ascii_lowercase().contains("user-agent: osm-viewer-test/1.0"),
            "{request}"
        );
    }

    #[test]
    fn test_non_200_is_unavailable() {
        let (template, server) = serve_once("404 Not Found", Vec::new());
        let key = TileKey::new(1, 0, 1).unwrap();

        let err = source(template).fetch(key).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let (template, server) = serve_once("200 OK", b"not an image".to_vec());
        let key = TileKey::new(0, 0, 0).unwrap();

        let err = source(template).fetch(key).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn test_connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let key = TileKey::new(0, 0, 0).unwrap();
        let err = source(format!("http://{addr}/{{z}}/{{x}}/{{y}}.png"))
            .fetch(key)
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)), "{err}");
    }
}
