//! Drives the replacer and the hash table together the way a buffer-pool
//! manager would: the table maps page ids to frames, the replacer decides
//! which frame to reclaim when the pool runs out.

use bufkit::{BufkitError, ExtendibleHashTable, FrameId, LruKReplacer, Replacer};

type PageId = u64;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn pool_reclaims_coldest_frame() {
    init_logging();
    const POOL_SIZE: usize = 3;

    let replacer = LruKReplacer::new(POOL_SIZE, 2);
    let page_table: ExtendibleHashTable<PageId, FrameId> = ExtendibleHashTable::new(2);

    // Pages 10, 20, 30 land in frames 0, 1, 2 and are immediately unpinned.
    for (frame_id, page_id) in [10u64, 20, 30].into_iter().enumerate() {
        page_table.insert(page_id, frame_id).unwrap();
        replacer.record_access(frame_id).unwrap();
    }
    assert_eq!(replacer.size(), POOL_SIZE);

    // Page 10 is hot: a second access graduates its frame out of the
    // young set.
    let frame = page_table.find(&10).unwrap();
    replacer.record_access(frame).unwrap();

    // Pool is full when page 40 arrives; the victim must be frame 1
    // (page 20, coldest single-access frame).
    let victim = replacer.evict().expect("an unpinned frame exists");
    assert_eq!(victim, 1);
    assert!(page_table.remove(&20));
    page_table.insert(40, victim).unwrap();
    replacer.record_access(victim).unwrap();

    assert_eq!(page_table.find(&20), None);
    assert_eq!(page_table.find(&40), Some(1));

    // Pin page 30; it must not be chosen, and deleting it outright is
    // refused until it is unpinned.
    let pinned = page_table.find(&30).unwrap();
    replacer.set_evictable(pinned, false).unwrap();
    assert_eq!(replacer.remove(pinned), Err(BufkitError::NotEvictable(pinned)));

    // Remaining candidates: frame 1 (young) then frame 0 (aged).
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), Some(0));
    assert_eq!(replacer.evict(), None);

    // Unpinning page 30 makes its frame reclaimable again.
    replacer.set_evictable(pinned, true).unwrap();
    assert_eq!(replacer.evict(), Some(pinned));
}

#[test]
fn page_delete_forgets_frame_and_mapping() {
    init_logging();

    let replacer = LruKReplacer::new(4, 2);
    let page_table: ExtendibleHashTable<PageId, FrameId> = ExtendibleHashTable::new(2);

    page_table.insert(7, 0).unwrap();
    replacer.record_access(0).unwrap();
    page_table.insert(8, 1).unwrap();
    replacer.record_access(1).unwrap();

    // Deleting page 7 removes both its mapping and its eviction bookkeeping.
    let frame = page_table.find(&7).unwrap();
    replacer.remove(frame).unwrap();
    assert!(page_table.remove(&7));

    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), None);
}

#[test]
fn many_pages_cycle_through_small_pool() {
    init_logging();
    const POOL_SIZE: usize = 8;

    let replacer = LruKReplacer::new(POOL_SIZE, 2);
    let page_table: ExtendibleHashTable<PageId, FrameId> = ExtendibleHashTable::new(4);
    // frame -> resident page, mirroring the pool's frame metadata
    let mut resident: Vec<Option<PageId>> = vec![None; POOL_SIZE];
    let mut free_frames: Vec<FrameId> = (0..POOL_SIZE).collect();

    for page_id in 0..64u64 {
        let frame_id = match free_frames.pop() {
            Some(free) => free,
            None => {
                let victim = replacer.evict().expect("every frame is unpinned");
                let old_page = resident[victim].take().expect("victim held a page");
                assert!(page_table.remove(&old_page));
                victim
            }
        };
        page_table.insert(page_id, frame_id).unwrap();
        resident[frame_id] = Some(page_id);
        replacer.record_access(frame_id).unwrap();
    }

    // Exactly the pool-sized suffix of pages is still mapped, each to the
    // frame that claims to hold it.
    let mapped: Vec<PageId> = (0..64u64)
        .filter(|page_id| page_table.find(page_id).is_some())
        .collect();
    assert_eq!(mapped.len(), POOL_SIZE);
    for page_id in mapped {
        let frame_id = page_table.find(&page_id).unwrap();
        assert_eq!(resident[frame_id], Some(page_id));
    }
    assert_eq!(replacer.size(), POOL_SIZE);
}
