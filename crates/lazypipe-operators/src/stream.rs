//! Pull-path plumbing: fallible item iterators and helpers over them.

use lazypipe_core::Item;

use crate::traits::OpError;

pub type ItemStream = Box<dyn Iterator<Item = Result<Item, OpError>>>;

pub fn from_items(items: Vec<Item>) -> ItemStream {
    Box::new(items.into_iter().map(Ok))
}

pub fn empty() -> ItemStream {
    Box::new(std::iter::empty())
}

/// Keep `Ok` items passing `keep`; errors always pass.
pub fn filter_ok<F>(input: ItemStream, mut keep: F) -> ItemStream
where
    F: FnMut(&Item) -> bool + 'static,
{
    Box::new(input.filter(move |r| r.as_ref().map_or(true, |item| keep(item))))
}

pub fn map_ok<F>(input: ItemStream, mut f: F) -> ItemStream
where
    F: FnMut(Item) -> Result<Item, OpError> + 'static,
{
    Box::new(input.map(move |r| r.and_then(&mut f)))
}

/// Run `finish` over the whole input on first pull, then yield its result.
///
/// Used by buffering stages. An error (from the input or from `finish`)
/// is yielded once and ends the stream.
pub fn deferred<F>(input: ItemStream, finish: F) -> ItemStream
where
    F: FnOnce(ItemStream) -> Result<Vec<Item>, OpError> + 'static,
{
    Box::new(Deferred::Pending(Some((input, Box::new(finish)))))
}

type Finisher = Box<dyn FnOnce(ItemStream) -> Result<Vec<Item>, OpError>>;

enum Deferred {
    Pending(Option<(ItemStream, Finisher)>),
    Draining(std::vec::IntoIter<Item>),
    Done,
}

impl Iterator for Deferred {
    type Item = Result<Item, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self {
                Deferred::Pending(pending) => {
                    let (input, finish) = pending.take()?;
                    match finish(input) {
                        Ok(items) => *self = Deferred::Draining(items.into_iter()),
                        Err(e) => {
                            *self = Deferred::Done;
                            return Some(Err(e));
                        }
                    }
                }
                Deferred::Draining(items) => return items.next().map(Ok),
                Deferred::Done => return None,
            }
        }
    }
}

/// Collect every item, stopping at the first error.
pub fn collect_all(input: ItemStream) -> Result<Vec<Item>, OpError> {
    input.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_runs_once_on_first_pull() {
        let input = from_items(lazypipe_core::item::indexed([3, 1, 2]));
        let mut out = deferred(input, |s| {
            let mut items = collect_all(s)?;
            items.reverse();
            Ok(items)
        });
        let first = out.next().unwrap().unwrap();
        assert_eq!(first.value, lazypipe_core::Value::I64(2));
        assert_eq!(out.count(), 2);
    }

    #[test]
    fn deferred_surfaces_input_errors() {
        let input: ItemStream = Box::new(
            vec![Ok(Item::new(0, 1)), Err(OpError::Exec("boom".into()))].into_iter(),
        );
        let mut out = deferred(input, collect_all);
        assert!(matches!(out.next(), Some(Err(OpError::Exec(_)))));
        assert!(out.next().is_none());
    }
}
