//! Bounded top-K selection.
//!
//! The kept items live in a max-heap ordered worst-first: the root is the
//! worst item still kept, so deciding whether a newcomer belongs is a single
//! comparison. `cmp(a, b) == Less` means `a` ranks before (is better than) `b`.

use std::cmp::Ordering;

use crate::error::{require_capacity, Result};

enum Kept<T> {
    /// K == 1: a single best item, no heap.
    Single(Option<T>),
    Heap(Vec<T>),
}

pub struct BoundedTopK<T, C> {
    k: usize,
    cmp: C,
    kept: Kept<T>,
}

impl<T, C> BoundedTopK<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new(k: usize, cmp: C) -> Result<Self> {
        require_capacity("top-k", k)?;
        let kept = if k == 1 {
            Kept::Single(None)
        } else {
            Kept::Heap(Vec::with_capacity(k.min(1024)))
        };
        Ok(Self { k, cmp, kept })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        match &self.kept {
            Kept::Single(best) => best.is_some() as usize,
            Kept::Heap(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The worst of the kept items.
    pub fn peek_worst(&self) -> Option<&T> {
        match &self.kept {
            Kept::Single(best) => best.as_ref(),
            Kept::Heap(heap) => heap.first(),
        }
    }

    /// Offer `item`. Returns whether it was kept.
    pub fn push(&mut self, item: T) -> bool {
        let cmp = &self.cmp;
        match &mut self.kept {
            Kept::Single(best) => match best {
                Some(current) if cmp(&item, current) != Ordering::Less => false,
                _ => {
                    *best = Some(item);
                    true
                }
            },
            Kept::Heap(heap) => {
                if heap.len() < self.k {
                    heap.push(item);
                    let last = heap.len() - 1;
                    sift_up(heap, last, cmp);
                    true
                } else if cmp(&item, &heap[0]) == Ordering::Less {
                    heap[0] = item;
                    sift_down(heap, 0, cmp);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Best first.
    pub fn into_sorted(self) -> Vec<T> {
        match self.kept {
            Kept::Single(best) => best.into_iter().collect(),
            Kept::Heap(mut heap) => {
                let mut out = Vec::with_capacity(heap.len());
                while !heap.is_empty() {
                    let last = heap.len() - 1;
                    heap.swap(0, last);
                    if let Some(worst) = heap.pop() {
                        out.push(worst);
                    }
                    sift_down(&mut heap, 0, &self.cmp);
                }
                out.reverse();
                out
            }
        }
    }
}

fn worse<T, C: Fn(&T, &T) -> Ordering>(cmp: &C, a: &T, b: &T) -> bool {
    cmp(a, b) == Ordering::Greater
}

fn sift_up<T, C: Fn(&T, &T) -> Ordering>(heap: &mut [T], mut i: usize, cmp: &C) {
    while i > 0 {
        let parent = (i - 1) / 2;
        if !worse(cmp, &heap[i], &heap[parent]) {
            break;
        }
        heap.swap(i, parent);
        i = parent;
    }
}

fn sift_down<T, C: Fn(&T, &T) -> Ordering>(heap: &mut [T], mut i: usize, cmp: &C) {
    let len = heap.len();
    loop {
        let (l, r) = (2 * i + 1, 2 * i + 2);
        let mut worst = i;
        if l < len && worse(cmp, &heap[l], &heap[worst]) {
            worst = l;
        }
        if r < len && worse(cmp, &heap[r], &heap[worst]) {
            worst = r;
        }
        if worst == i {
            return;
        }
        heap.swap(i, worst);
        i = worst;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn asc(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn keeps_the_three_smallest() {
        let mut top = BoundedTopK::new(3, asc).unwrap();
        for x in [5, 3, 8, 1, 9, 2] {
            top.push(x);
        }
        assert_eq!(top.len(), 3);
        assert_eq!(top.peek_worst(), Some(&3));
        assert_eq!(top.into_sorted(), vec![1, 2, 3]);
    }

    #[test]
    fn single_slot_tracks_the_best() {
        let mut top = BoundedTopK::new(1, |a: &i32, b: &i32| b.cmp(a)).unwrap();
        assert!(top.push(4));
        assert!(!top.push(2));
        assert!(top.push(7));
        assert!(!top.push(7));
        assert_eq!(top.into_sorted(), vec![7]);
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(BoundedTopK::new(0, asc).is_err());
    }

    proptest! {
        #[test]
        fn equals_sort_then_take(input in proptest::collection::vec(-50i32..50, 0..80), k in 1usize..12) {
            let mut top = BoundedTopK::new(k, asc).unwrap();
            for x in &input {
                top.push(*x);
            }
            let mut expected = input.clone();
            expected.sort();
            expected.truncate(k);
            prop_assert_eq!(top.into_sorted(), expected);
        }
    }
}
