use std::collections::{BTreeMap, HashMap, VecDeque};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::cache::{FrameId, Replacer};
use crate::config::LruKConfig;
use crate::error::{BufkitError, BufkitResult};

/// LRU-K replacement policy over a fixed set of buffer-pool frames.
///
/// Keeps the last `k` access timestamps of every tracked frame and evicts the
/// evictable frame with the largest backward k-distance. Frames with fewer
/// than `k` recorded accesses count as infinitely distant and are always
/// preferred as victims, oldest first access first.
#[derive(Debug)]
pub struct LruKReplacer {
    inner: Mutex<LruKState>,
}

#[derive(Debug)]
struct LruKState {
    num_frames: usize,
    k: usize,
    /// Logical clock; ticks once per recorded access.
    clock: u64,
    /// Tracked frames currently marked evictable.
    curr_size: usize,
    /// Capacity left after tracked-but-pinned frames are set aside. Admission
    /// of a new frame must evict once `curr_size` reaches this.
    max_size: usize,
    frames: HashMap<FrameId, FrameRecord>,
    /// Frames with fewer than k accesses, in order of first access.
    young: VecDeque<FrameId>,
    /// Frames with at least k accesses, keyed by their k-th most recent
    /// access timestamp. Keys are unique since the clock never repeats.
    aged: BTreeMap<u64, FrameId>,
}

#[derive(Debug)]
struct FrameRecord {
    /// Up to the last k access timestamps, oldest first.
    history: VecDeque<u64>,
    accesses: u64,
    evictable: bool,
}

impl LruKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self::new_with_config(LruKConfig { num_frames, k })
    }

    pub fn new_with_config(config: LruKConfig) -> Self {
        assert!(config.k > 0, "k must be greater than 0");
        LruKReplacer {
            inner: Mutex::new(LruKState {
                num_frames: config.num_frames,
                k: config.k,
                clock: 0,
                curr_size: 0,
                max_size: config.num_frames,
                frames: HashMap::new(),
                young: VecDeque::new(),
                aged: BTreeMap::new(),
            }),
        }
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&self, frame_id: FrameId) -> BufkitResult<()> {
        self.inner.lock().record_access(frame_id)
    }

    fn evict(&self) -> Option<FrameId> {
        self.inner.lock().evict()
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) -> BufkitResult<()> {
        self.inner.lock().set_evictable(frame_id, evictable)
    }

    fn remove(&self, frame_id: FrameId) -> BufkitResult<()> {
        self.inner.lock().remove(frame_id)
    }

    fn size(&self) -> usize {
        self.inner.lock().curr_size
    }
}

impl LruKState {
    fn record_access(&mut self, frame_id: FrameId) -> BufkitResult<()> {
        if frame_id >= self.num_frames {
            return Err(BufkitError::InvalidFrame(frame_id));
        }
        self.clock += 1;
        let now = self.clock;

        if !self.frames.contains_key(&frame_id) {
            // Admitting a brand-new frame; make room first if the pool is full.
            if self.curr_size == self.max_size {
                match self.evict() {
                    Some(victim) => {
                        debug!("evicted frame {} to admit frame {}", victim, frame_id)
                    }
                    None => warn!("admitting frame {} with every tracked frame pinned", frame_id),
                }
            }
            self.frames.insert(
                frame_id,
                FrameRecord {
                    history: VecDeque::with_capacity(self.k + 1),
                    accesses: 0,
                    evictable: true,
                },
            );
            self.curr_size += 1;
            self.young.push_back(frame_id);
        }

        let record = self
            .frames
            .get_mut(&frame_id)
            .expect("frame admitted above");
        record.accesses += 1;
        record.history.push_back(now);
        let stale = if record.history.len() > self.k {
            record.history.pop_front()
        } else {
            None
        };
        let accesses = record.accesses;
        let kth_oldest = *record.history.front().expect("timestamp just pushed");

        if accesses == self.k as u64 {
            // The k-th access fixes the frame's backward k-distance; it leaves
            // the young queue and is ordered by its oldest remembered access.
            if let Some(pos) = self.young.iter().position(|f| *f == frame_id) {
                self.young.remove(pos);
            }
            self.aged.insert(kth_oldest, frame_id);
        } else if accesses > self.k as u64 {
            // The oldest remembered access aged out; re-key within the aged set.
            let stale = stale.expect("history held k timestamps");
            self.aged.remove(&stale);
            self.aged.insert(kth_oldest, frame_id);
        }
        Ok(())
    }

    fn evict(&mut self) -> Option<FrameId> {
        let mut victim = None;
        // Young frames have infinite backward k-distance and go first, FIFO
        // by first access.
        for frame_id in self.young.iter() {
            if self.frames[frame_id].evictable {
                victim = Some(*frame_id);
                break;
            }
        }
        if victim.is_none() {
            // Ascending k-th timestamp order: the smallest key is the frame
            // whose k-th most recent access is furthest in the past.
            for frame_id in self.aged.values() {
                if self.frames[frame_id].evictable {
                    victim = Some(*frame_id);
                    break;
                }
            }
        }
        let frame_id = victim?;
        self.forget(frame_id);
        self.curr_size -= 1;
        Some(frame_id)
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) -> BufkitResult<()> {
        let record = match self.frames.get_mut(&frame_id) {
            Some(record) => record,
            None => return Ok(()),
        };
        if record.evictable == evictable {
            return Ok(());
        }
        record.evictable = evictable;
        if evictable {
            self.curr_size += 1;
            self.max_size += 1;
        } else {
            self.curr_size -= 1;
            self.max_size -= 1;
        }
        Ok(())
    }

    fn remove(&mut self, frame_id: FrameId) -> BufkitResult<()> {
        if frame_id >= self.num_frames {
            return Err(BufkitError::InvalidFrame(frame_id));
        }
        match self.frames.get(&frame_id) {
            None => Ok(()),
            Some(record) if !record.evictable => Err(BufkitError::NotEvictable(frame_id)),
            Some(_) => {
                self.forget(frame_id);
                self.curr_size -= 1;
                Ok(())
            }
        }
    }

    /// Drop all state held for `frame_id`. Does not touch the size counters.
    fn forget(&mut self, frame_id: FrameId) {
        if let Some(record) = self.frames.remove(&frame_id) {
            if record.accesses < self.k as u64 {
                if let Some(pos) = self.young.iter().position(|f| *f == frame_id) {
                    self.young.remove(pos);
                }
            } else if let Some(kth_oldest) = record.history.front() {
                self.aged.remove(kth_oldest);
            }
        }
    }
}
