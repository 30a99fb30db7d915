//! Fixed-capacity node arena with hash-consing.
//!
//! Cells are addressed by `usize` indices; index 0 is a sentinel and never
//! holds a value. Every bucket is an intrusive singly-linked chain threaded
//! through the `next` field of the cells, so a lookup never allocates.

use std::cmp::min;
use std::ops::Index;

use crate::utils::MyHash;

#[derive(Clone, Default)]
struct Cell<T> {
    value: T,
    next: usize,
    occupied: bool,
}

pub struct Table<T> {
    cells: Vec<Cell<T>>,
    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the first *possibly* free cell.
    min_free: usize,
    /// Index of the last cell ever handed out.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
}

impl<T: Default> Table<T> {
    /// Create a new table with `2^bits` cells.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut cells: Vec<Cell<T>> = Vec::with_capacity(capacity);
        cells.resize_with(capacity, Cell::default);
        cells[0].occupied = true;

        let buckets_size = 1 << min(bits, 16);

        Self {
            cells,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            min_free: 1,
            last_index: 0,
            real_size: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Index of the last cell ever handed out.
    pub fn size(&self) -> usize {
        self.last_index
    }

    /// Number of live cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.cells[index].value
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.cells[index].occupied
    }

    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.cells[index].next
    }

    pub fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.cells[index].next = next;
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket(&self, i: usize) -> usize {
        self.buckets[i]
    }

    pub fn set_bucket(&mut self, i: usize, index: usize) {
        self.buckets[i] = index;
    }

    /// Reserve a free cell and return its index.
    ///
    /// The arena never grows: running out of cells is fatal.
    pub(crate) fn alloc(&mut self) -> usize {
        let index = (self.min_free..=self.last_index)
            .find(|&i| !self.cells[i].occupied)
            .unwrap_or(self.last_index + 1);

        if index >= self.capacity() {
            panic!("Storage is full ({} cells)", self.capacity());
        }

        self.last_index = self.last_index.max(index);
        self.cells[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;

        index
    }

    /// Release the cell at the given index. The caller unlinks it from its bucket.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert!(self.cells[index].occupied, "Cell {} is already free", index);

        self.cells[index].occupied = false;
        self.min_free = min(self.min_free, index);
        self.real_size -= 1;
    }

    fn add(&mut self, value: T) -> usize {
        let index = self.alloc();
        self.cells[index].value = value;
        self.cells[index].next = 0;
        index
    }
}

impl<T: MyHash + Eq> Table<T> {
    pub fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Return the index of a cell holding `value`, inserting it if absent.
    pub fn put(&mut self, value: T) -> usize {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            let i = self.add(value);
            self.buckets[bucket_index] = i;
            return i;
        }

        loop {
            if &value == self.value(index) {
                return index;
            }
            let next = self.next(index);
            if next == 0 {
                let i = self.add(value);
                self.set_next(index, i);
                return i;
            }
            index = next;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
