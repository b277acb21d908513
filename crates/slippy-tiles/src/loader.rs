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

//! Background tile loading.
//!
//! [`TileLoader`] moves tile fetches off the paint path. A small pool of
//! worker threads pulls keys from a channel and fetches them from a
//! [`TileSource`]; the caller polls [`TileLoader::state`] each frame and draws
//! nothing for tiles still loading. Only the currently visible set is kept:
//! every call to [`TileLoader::request_visible`] forgets tiles that left the
//! view, and workers skip queued keys that are no longer wanted.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use log::{debug, error, warn};

use crate::source::{TileImage, TileSource};
use crate::tile::TileKey;

/// Worker count used when the caller does not pick one. The OpenStreetMap
/// tile usage policy allows two connections per client.
pub const DEFAULT_WORKERS: usize = 2;

/// Load state of a visible tile.
#[derive(Debug, Clone)]
pub enum TileState {
    Loading,
    Loaded(Arc<TileImage>),
    Failed,
}

type TileMap = Arc<Mutex<HashMap<TileKey, TileState>>>;
type WakeFn = Arc<dyn Fn() + Send + Sync>;

/// Fetches visible tiles on background threads.
pub struct TileLoader {
    tiles: TileMap,
    queue: Sender<TileKey>,
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("tiles", &lock(&self.tiles).len())
            .finish_non_exhaustive()
    }
}

impl TileLoader {
    /// Start `workers` fetch threads (at least one).
    ///
    /// `wake` runs on a worker thread after each tile finishes; GUIs use it
    /// to schedule a repaint.
    pub fn spawn<F>(source: Arc<dyn TileSource>, workers: usize, wake: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let tiles: TileMap = Arc::new(Mutex::new(HashMap::new()));
        let (queue, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let wake: WakeFn = Arc::new(wake);

        for index in 0..workers.max(1) {
            let source = Arc::clone(&source);
            let tiles = Arc::clone(&tiles);
            let receiver = Arc::clone(&receiver);
            let wake = Arc::clone(&wake);

            let spawned = thread::Builder::new()
                .name(format!("tile-worker-{index}"))
                .spawn(move || worker_loop(&*source, &tiles, &receiver, &*wake));
            if let Err(e) = spawned {
                error!("Failed to start tile worker {index}: {e}");
            }
        }

        Self { tiles, queue }
    }

    /// Declare the tiles visible this frame.
    ///
    /// New keys are queued, keys no longer visible are dropped.
    pub fn request_visible(&self, keys: &[TileKey]) {
        let visible: HashSet<TileKey> = keys.iter().copied().collect();
        let mut tiles = lock(&self.tiles);
        tiles.retain(|key, _| visible.contains(key));

        for &key in keys {
            if let Entry::Vacant(entry) = tiles.entry(key) {
                if self.queue.send(key).is_ok() {
                    entry.insert(TileState::Loading);
                } else {
                    warn!("No tile workers running, tile {key} left blank");
                    entry.insert(TileState::Failed);
                }
            }
        }
    }

    /// Current state of a visible tile, `None` if it was never requested or
    /// has left the view.
    #[must_use]
    pub fn state(&self, key: TileKey) -> Option<TileState> {
        lock(&self.tiles).get(&key).cloned()
    }

    /// Visible tiles still waiting on a worker.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.tiles)
            .values()
            .filter(|state| matches!(state, TileState::Loading))
            .count()
    }

    /// Visible tiles whose fetch failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        lock(&self.tiles)
            .values()
            .filter(|state| matches!(state, TileState::Failed))
            .count()
    }
}

fn worker_loop(
    source: &dyn TileSource,
    tiles: &Mutex<HashMap<TileKey, TileState>>,
    receiver: &Mutex<Receiver<TileKey>>,
    wake: &(dyn Fn() + Send + Sync),
) {
    loop {
        // Channel closes when the loader is dropped
        let Ok(key) = lock(receiver).recv() else {
            break;
        };

        if !matches!(lock(tiles).get(&key), Some(TileState::Loading)) {
            debug!("Skipping tile {key}, no longer visible");
            continue;
        }

        let state = match source.fetch(key) {
            Ok(image) => TileState::Loaded(Arc::new(image)),
            Err(e) => {
                warn!("Failed to load tile {key}: {e}");
                TileState::Failed
            }
        };

        {
            let mut tiles = lock(tiles);
            match tiles.get_mut(&key) {
                Some(slot) => *slot = state,
                None => continue,
            }
        }
        wake();
    }
    debug!("Tile worker exiting");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use image::RgbaImage;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct FakeSource {
        requests: Mutex<Vec<TileKey>>,
        broken: Vec<TileKey>,
        /// Blocks the first fetch until a message arrives.
        gate: Mutex<Option<Receiver<()>>>,
    }

    impl TileSource for FakeSource {
        fn fetch(&self, key: TileKey) -> Result<TileImage, FetchError> {
            self.requests.lock().unwrap().push(key);
            if let Some(gate) = self.gate.lock().unwrap().take() {
                gate.recv().unwrap();
            }
            if self.broken.contains(&key) {
                return Err(FetchError::Status { key, status: 500 });
            }
            Ok(TileImage::from(RgbaImage::new(256, 256)))
        }
    }

    fn key(x: i64, y: i64) -> TileKey {
        TileKey::new(4, x, y).unwrap()
    }

    fn spawn(source: &Arc<FakeSource>, workers: usize) -> (TileLoader, Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        let loader = TileLoader::spawn(source.clone(), workers, move || {
            let _ = tx.send(());
        });
        (loader, rx)
    }

    #[test]
    fn test_loads_visible_tiles() {
        let source = Arc::new(FakeSource::default());
        let (loader, woken) = spawn(&source, 2);
        let keys = [key(1, 1), key(1, 2), key(2, 1)];

        loader.request_visible(&keys);
        for _ in &keys {
            woken.recv_timeout(WAIT).unwrap();
        }

        for k in keys {
            assert!(matches!(loader.state(k), Some(TileState::Loaded(_))), "{k}");
        }
        assert_eq!(loader.pending_count(), 0);
        assert_eq!(loader.failed_count(), 0);
    }

    #[test]
    fn test_failure_is_isolated() {
        let source = Arc::new(FakeSource {
            broken: vec![key(3, 3)],
            ..Default::default()
        });
        let (loader, woken) = spawn(&source, 1);

        loader.request_visible(&[key(3, 3), key(3, 4)]);
        woken.recv_timeout(WAIT).unwrap();
        woken.recv_timeout(WAIT).unwrap();

        assert!(matches!(loader.state(key(3, 3)), Some(TileState::Failed)));
        assert!(matches!(loader.state(key(3, 4)), Some(TileState::Loaded(_))));
        assert_eq!(loader.failed_count(), 1);
    }

    #[test]
    fn test_repeat_requests_fetch_once() {
        let source = Arc::new(FakeSource::default());
        let (loader, woken) = spawn(&source, 1);

        loader.request_visible(&[key(0, 0)]);
        woken.recv_timeout(WAIT).unwrap();
        loader.request_visible(&[key(0, 0)]);
        loader.request_visible(&[key(0, 0)]);

        assert_eq!(*source.requests.lock().unwrap(), vec![key(0, 0)]);
    }

    #[test]
    fn test_tiles_leaving_view_are_forgotten() {
        let source = Arc::new(FakeSource::default());
        let (loader, woken) = spawn(&source, 1);

        loader.request_visible(&[key(5, 5), key(5, 6)]);
        woken.recv_timeout(WAIT).unwrap();
        woken.recv_timeout(WAIT).unwrap();

        loader.request_visible(&[key(5, 6)]);
        assert!(loader.state(key(5, 5)).is_none());
        assert!(loader.state(key(5, 6)).is_some());
    }

    #[test]
    fn test_stale_queue_entries_skip_the_network() {
        let (release, gate) = mpsc::channel();
        let source = Arc::new(FakeSource {
            gate: Mutex::new(Some(gate)),
            ..Default::default()
        });
        let (loader, woken) = spawn(&source, 1);

        loader.request_visible(&[key(1, 1)]);
        loader.request_visible(&[key(1, 1), key(7, 7), key(8, 8)]);
        // Panned away before the worker reached the last two
        loader.request_visible(&[key(1, 1)]);
        release.send(()).unwrap();
        woken.recv_timeout(WAIT).unwrap();

        // Single worker drains the queue in order, so this fetch comes last
        loader.request_visible(&[key(1, 1), key(9, 9)]);
        woken.recv_timeout(WAIT).unwrap();

        assert_eq!(*source.requests.lock().unwrap(), vec![key(1, 1), key(9, 9)]);
    }
}
