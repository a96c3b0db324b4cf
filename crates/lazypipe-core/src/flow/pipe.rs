use crate::error::{Error, Result};
use crate::id::StageId;

/// Cursor state over a stage chain of length `terminal`.
///
/// - `head`: where the next raw item enters.
/// - `stack`: saved heads, one per suspended feed (lockstep with `Source`).
/// - `heads`: short-lived saved heads for `swap_head`/`restore_head`.
#[derive(Debug, Clone)]
pub struct Pipe {
    head: StageId,
    stack: Vec<StageId>,
    heads: Vec<StageId>,
    terminal: StageId,
}

impl Pipe {
    pub fn new(stages: usize) -> Self {
        Self {
            head: StageId::new(0),
            stack: Vec::new(),
            heads: Vec::new(),
            terminal: StageId::new(stages),
        }
    }

    pub fn head(&self) -> StageId {
        self.head
    }

    pub fn terminal(&self) -> StageId {
        self.terminal
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn has_frames(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn set_head(&mut self, id: StageId) -> Result<()> {
        self.check(id)?;
        self.head = id;
        Ok(())
    }

    /// Save the current head for resumption, then move it to `next`.
    pub fn push_frame(&mut self, next: StageId) -> Result<()> {
        self.check(next)?;
        self.stack.push(self.head);
        self.head = next;
        Ok(())
    }

    pub fn pop_frame(&mut self) -> Option<StageId> {
        let head = self.stack.pop()?;
        self.head = head;
        Some(head)
    }

    pub fn clear_frames(&mut self) {
        self.stack.clear();
        self.heads.clear();
    }

    pub fn swap_head(&mut self, op: StageId) -> Result<()> {
        self.check(op)?;
        self.heads.push(self.head);
        self.head = op;
        Ok(())
    }

    pub fn restore_head(&mut self) -> Result<()> {
        match self.heads.pop() {
            Some(head) => {
                self.head = head;
                Ok(())
            }
            None => Err(Error::Structural(
                "restore_head called without a matching swap_head".into(),
            )),
        }
    }

    /// Remove stage `id` from the chain and shift every cursor past it.
    pub fn splice_out(&mut self, id: StageId) -> Result<()> {
        if id >= self.terminal {
            return Err(Error::Structural(format!(
                "cannot forget {id}: the terminal is {}",
                self.terminal
            )));
        }
        let shift = |c: &mut StageId| {
            if *c > id {
                *c = StageId::new(c.get() - 1);
            }
        };
        shift(&mut self.head);
        self.stack.iter_mut().for_each(shift);
        self.heads.iter_mut().for_each(shift);
        self.terminal = StageId::new(self.terminal.get() - 1);
        Ok(())
    }

    fn check(&self, id: StageId) -> Result<()> {
        if id > self.terminal {
            Err(Error::Structural(format!(
                "{id} is past the terminal {}",
                self.terminal
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_lifo() {
        let mut pipe = Pipe::new(4);
        pipe.push_frame(StageId::new(2)).unwrap();
        pipe.push_frame(StageId::new(3)).unwrap();
        assert_eq!(pipe.head(), StageId::new(3));
        assert_eq!(pipe.pop_frame(), Some(StageId::new(2)));
        assert_eq!(pipe.pop_frame(), Some(StageId::new(0)));
        assert_eq!(pipe.pop_frame(), None);
    }

    #[test]
    fn swap_and_restore_pair_up() {
        let mut pipe = Pipe::new(3);
        pipe.swap_head(StageId::new(1)).unwrap();
        assert_eq!(pipe.head(), StageId::new(1));
        pipe.restore_head().unwrap();
        assert_eq!(pipe.head(), StageId::new(0));
        assert!(pipe.restore_head().unwrap_err().is_structural());
    }

    #[test]
    fn splice_shifts_cursors_after_the_removed_stage() {
        let mut pipe = Pipe::new(4);
        pipe.set_head(StageId::new(3)).unwrap();
        pipe.push_frame(StageId::new(1)).unwrap();
        pipe.splice_out(StageId::new(1)).unwrap();
        assert_eq!(pipe.head(), StageId::new(1));
        assert_eq!(pipe.terminal(), StageId::new(3));
        assert_eq!(pipe.pop_frame(), Some(StageId::new(2)));
    }

    #[test]
    fn cursors_cannot_pass_the_terminal() {
        let mut pipe = Pipe::new(2);
        assert!(pipe.set_head(StageId::new(2)).is_ok());
        assert!(pipe.set_head(StageId::new(3)).unwrap_err().is_structural());
        assert!(pipe.splice_out(StageId::new(2)).unwrap_err().is_structural());
    }
}
