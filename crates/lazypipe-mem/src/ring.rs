//! Fixed-capacity ring keeping the most recent N elements.

use crate::error::{require_capacity, Result};

enum Shape<T> {
    /// Still growing; no slot has been overwritten yet.
    Filling(Vec<T>),
    /// Every slot taken; pushes overwrite `oldest` unconditionally.
    Full { slots: Box<[T]>, oldest: usize },
}

pub struct CircularBuffer<T> {
    capacity: usize,
    shape: Shape<T>,
}

impl<T> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        require_capacity("circular buffer", capacity)?;
        Ok(Self {
            capacity,
            shape: Shape::Filling(Vec::new()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        match &self.shape {
            Shape::Filling(items) => items.len(),
            Shape::Full { .. } => self.capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        matches!(self.shape, Shape::Full { .. })
    }

    /// Append `item`, returning the element it displaced once full.
    pub fn push(&mut self, item: T) -> Option<T> {
        match &mut self.shape {
            Shape::Full { slots, oldest } => {
                let evicted = std::mem::replace(&mut slots[*oldest], item);
                *oldest = (*oldest + 1) % self.capacity;
                return Some(evicted);
            }
            Shape::Filling(items) => {
                items.push(item);
                if items.len() < self.capacity {
                    return None;
                }
            }
        }
        let shape = std::mem::replace(&mut self.shape, Shape::Filling(Vec::new()));
        if let Shape::Filling(items) = shape {
            self.shape = Shape::Full {
                slots: items.into_boxed_slice(),
                oldest: 0,
            };
        }
        None
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (slice, oldest): (&[T], usize) = match &self.shape {
            Shape::Filling(items) => (items.as_slice(), 0),
            Shape::Full { slots, oldest } => (&slots[..], *oldest),
        };
        let count = slice.len();
        (0..count).map(move |step| &slice[(oldest + step) % count])
    }

    /// Drain into a vector, oldest first.
    pub fn into_vec(self) -> Vec<T> {
        match self.shape {
            Shape::Filling(items) => items,
            Shape::Full { slots, oldest } => {
                let mut items = slots.into_vec();
                items.rotate_left(oldest);
                items
            }
        }
    }

    pub fn clear(&mut self) {
        self.shape = Shape::Filling(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(CircularBuffer::<u8>::new(0).is_err());
    }

    #[test]
    fn keeps_the_last_n_in_order() {
        let mut ring = CircularBuffer::new(3).unwrap();
        for c in ['a', 'b', 'c', 'd', 'e'] {
            ring.push(c);
        }
        assert!(ring.is_full());
        assert_eq!(ring.iter().copied().collect::<String>(), "cde");
        assert_eq!(ring.into_vec(), vec!['c', 'd', 'e']);
    }

    #[test]
    fn reports_evictions() {
        let mut ring = CircularBuffer::new(2).unwrap();
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), Some(1));
        ring.clear();
        assert!(ring.is_empty());
    }

    proptest! {
        #[test]
        fn matches_the_input_suffix(input in proptest::collection::vec(any::<i32>(), 0..64), cap in 1usize..10) {
            let mut ring = CircularBuffer::new(cap).unwrap();
            for x in &input {
                ring.push(*x);
            }
            let keep = cap.min(input.len());
            let expected = input[input.len() - keep..].to_vec();
            prop_assert_eq!(ring.iter().copied().collect::<Vec<_>>(), expected.clone());
            prop_assert_eq!(ring.into_vec(), expected);
        }
    }
}
