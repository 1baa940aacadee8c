//! Decoded Instruction Buffer (DIB).
//!
//! A small set-associative table of recently decoded code windows. An IFETCH
//! entry whose window hits skips both the instruction cache and the decode
//! latency. Windows are `ip >> log2(window_size)`; replacement is LRU, with a
//! per-set usage stack (index 0 is MRU, the last index is LRU).
//!
//! # Performance
//!
//! - **Time Complexity:** `check_hit()` and `fill_cache()` are O(W) in the associativity.
//! - **Space Complexity:** O(S × W).

/// One DIB way.
#[derive(Clone, Copy, Debug, Default)]
struct DibEntry {
    tag: u64,
    valid: bool,
}

/// Decoded Instruction Buffer.
#[derive(Clone, Debug)]
pub struct Dib {
    shift: u32,
    sets: usize,
    entries: Vec<DibEntry>,
    usage: Vec<Vec<usize>>,
    hits: u64,
    misses: u64,
}

impl Dib {
    /// Creates an empty DIB.
    ///
    /// # Arguments
    ///
    /// * `window_size` - Bytes of code covered by one entry. Must be a power of 2.
    /// * `sets` - Number of sets. Must be a power of 2.
    /// * `ways` - Associativity.
    pub fn new(window_size: u64, sets: usize, ways: usize) -> Self {
        Self {
            shift: window_size.trailing_zeros(),
            sets,
            entries: vec![DibEntry::default(); sets * ways],
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
            hits: 0,
            misses: 0,
        }
    }

    #[inline]
    fn ways(&self) -> usize {
        self.entries.len() / self.sets
    }

    #[inline]
    fn locate(&self, ip: u64) -> (u64, usize) {
        let tag = ip >> self.shift;
        let set = (tag as usize) & (self.sets - 1);
        (tag, set)
    }

    fn find(&self, set: usize, tag: u64) -> Option<usize> {
        let ways = self.ways();
        self.entries[set * ways..(set + 1) * ways]
            .iter()
            .position(|e| e.valid && e.tag == tag)
    }

    fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&w| w == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// Looks up the window containing `ip`, refreshing its recency on a hit.
    ///
    /// # Returns
    ///
    /// `true` if the window was recently decoded.
    pub fn check_hit(&mut self, ip: u64) -> bool {
        let (tag, set) = self.locate(ip);
        if let Some(way) = self.find(set, tag) {
            self.touch(set, way);
            self.hits += 1;
            true
        } else {
            self.misses += 1;
            false
        }
    }

    /// Records that the window containing `ip` was decoded.
    ///
    /// A present window is refreshed; otherwise the set's LRU way is replaced.
    /// Filling with `used == false` drops the window instead.
    ///
    /// # Arguments
    ///
    /// * `ip` - Instruction pointer of the decoded instruction.
    /// * `used` - Whether the window should be marked valid.
    pub fn fill_cache(&mut self, ip: u64, used: bool) {
        let (tag, set) = self.locate(ip);
        let ways = self.ways();
        let way = match self.find(set, tag) {
            Some(way) => way,
            None if !used => return,
            None => self.usage[set].last().copied().unwrap_or(0),
        };
        self.entries[set * ways + way] = DibEntry { tag, valid: used };
        if used {
            self.touch(set, way);
        }
    }

    /// Lookups that hit.
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that missed.
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}
