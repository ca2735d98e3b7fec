//! In-memory registry of finalized clips.
//!
//! Exactly one clip is "current" at a time. Publishing a new clip replaces
//! the previous handle's reachability but does not revoke it: superseded
//! entries stay resident until [`ClipStore::revoke`] is called, matching
//! the object-URL behavior this recorder is modeled on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Clip;

/// Opaque reference to a finalized clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipHandle(u64);

impl ClipHandle {
    /// URI form of the handle, for display and logging.
    pub fn uri(&self) -> String {
        format!("clip://{}", self.0)
    }
}

/// Registry mapping handles to clip data.
#[derive(Debug, Default)]
pub struct ClipStore {
    next_id: u64,
    clips: HashMap<ClipHandle, Arc<Clip>>,
    current: Option<ClipHandle>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a finalized clip and make it the current one.
    pub fn publish(&mut self, clip: Clip) -> ClipHandle {
        let handle = ClipHandle(self.next_id);
        self.next_id += 1;
        self.clips.insert(handle, Arc::new(clip));
        self.current = Some(handle);
        handle
    }

    /// Handle of the most recently published clip, if any.
    pub fn current(&self) -> Option<ClipHandle> {
        self.current
    }

    /// The most recently published clip itself.
    pub fn current_clip(&self) -> Option<Arc<Clip>> {
        self.current.and_then(|handle| self.get(handle))
    }

    /// Resolve a handle. Superseded handles keep resolving until revoked.
    pub fn get(&self, handle: ClipHandle) -> Option<Arc<Clip>> {
        self.clips.get(&handle).cloned()
    }

    /// Drop a clip's data. Revoking the current clip leaves the store with
    /// no current clip.
    pub fn revoke(&mut self, handle: ClipHandle) {
        self.clips.remove(&handle);
        if self.current == Some(handle) {
            self.current = None;
        }
    }

    /// Number of clips still resident, superseded ones included.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn test_clip(samples: &[i16]) -> Clip {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        Clip::from_wav(cursor.into_inner()).unwrap()
    }

    #[test]
    fn publish_makes_clip_current() {
        let mut store = ClipStore::new();

        let handle = store.publish(test_clip(&[1, 2, 3]));

        assert_eq!(store.current(), Some(handle));
        assert_eq!(store.current_clip().unwrap().frames(), 3);
    }

    #[test]
    fn new_clip_replaces_current_without_revoking() {
        let mut store = ClipStore::new();

        let first = store.publish(test_clip(&[1]));
        let second = store.publish(test_clip(&[1, 2]));

        assert_ne!(first, second);
        assert_eq!(store.current(), Some(second));
        // The superseded clip stays resident until revoked.
        assert!(store.get(first).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn revoke_drops_data_and_clears_current() {
        let mut store = ClipStore::new();

        let first = store.publish(test_clip(&[1]));
        let second = store.publish(test_clip(&[1, 2]));

        store.revoke(first);
        assert!(store.get(first).is_none());
        assert_eq!(store.current(), Some(second));

        store.revoke(second);
        assert_eq!(store.current(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn revoke_unknown_handle_is_noop() {
        let mut store = ClipStore::new();

        let handle = store.publish(test_clip(&[1]));
        store.revoke(handle);
        store.revoke(handle);

        assert!(store.is_empty());
    }

    #[test]
    fn handles_render_as_uris() {
        let mut store = ClipStore::new();

        let first = store.publish(test_clip(&[1]));
        let second = store.publish(test_clip(&[2]));

        assert_eq!(first.uri(), "clip://0");
        assert_eq!(second.uri(), "clip://1");
    }
}
