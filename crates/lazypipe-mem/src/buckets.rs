//! Sorted equivalence-class buckets (order-statistics clustering).
//!
//! Buckets are kept sorted by pivot (a bucket's first member). `cmp` decides
//! both order and equivalence: `Equal` joins a bucket.

use std::cmp::Ordering;

use crate::error::{require_capacity, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<T> {
    members: Vec<T>,
}

impl<T> Bucket<T> {
    fn new(pivot: T) -> Self {
        Self {
            members: vec![pivot],
        }
    }

    pub fn pivot(&self) -> &T {
        &self.members[0]
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn into_members(self) -> Vec<T> {
        self.members
    }
}

/// Outcome of [`Segregator::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to an existing bucket.
    Joined(usize),
    /// Started a new bucket at this position.
    Opened(usize),
    /// Started a new bucket at this position after evicting the last one.
    Evicted(usize),
    /// Replaced the only allowed bucket.
    Replaced,
    /// Bucket full, or the item ranks after every kept bucket.
    Dropped,
}

pub struct Segregator<T, C> {
    cmp: C,
    max_buckets: Option<usize>,
    bucket_size: Option<usize>,
    buckets: Vec<Bucket<T>>,
}

impl<T, C> Segregator<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// `None` leaves a dimension unbounded; `Some(0)` is rejected.
    pub fn new(cmp: C, max_buckets: Option<usize>, bucket_size: Option<usize>) -> Result<Self> {
        if let Some(n) = max_buckets {
            require_capacity("segregate max_buckets", n)?;
        }
        if let Some(n) = bucket_size {
            require_capacity("segregate bucket_size", n)?;
        }
        Ok(Self {
            cmp,
            max_buckets,
            bucket_size,
            buckets: Vec::new(),
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Members across every bucket.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket<T>] {
        &self.buckets
    }

    pub fn insert(&mut self, item: T) -> Placement {
        let cmp = &self.cmp;
        let found = self
            .buckets
            .binary_search_by(|bucket| cmp(bucket.pivot(), &item));

        let pos = match found {
            Ok(pos) => {
                let bucket = &mut self.buckets[pos];
                if self.bucket_size.map_or(true, |cap| bucket.len() < cap) {
                    bucket.members.push(item);
                    return Placement::Joined(pos);
                }
                return Placement::Dropped;
            }
            Err(pos) => pos,
        };

        match self.max_buckets {
            Some(max) if self.buckets.len() >= max => {
                if max == 1 {
                    if pos == 0 {
                        self.buckets[0] = Bucket::new(item);
                        return Placement::Replaced;
                    }
                    return Placement::Dropped;
                }
                if pos >= self.buckets.len() {
                    return Placement::Dropped;
                }
                self.buckets.pop();
                self.buckets.insert(pos, Bucket::new(item));
                #[cfg(feature = "tracing")]
                tracing::trace!(pos, buckets = self.buckets.len(), "segregate: evicted last bucket");
                Placement::Evicted(pos)
            }
            _ => {
                self.buckets.insert(pos, Bucket::new(item));
                Placement::Opened(pos)
            }
        }
    }

    pub fn into_buckets(self) -> Vec<Bucket<T>> {
        self.buckets
    }
}
