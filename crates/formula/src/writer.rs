/// Attempted write would cross the opposite cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("writing {requested} bytes needs more than the {remaining} left of a {capacity}-byte buffer")]
pub struct CapacityError {
    pub requested: usize,
    pub remaining: usize,
    pub capacity: usize,
}

/// Fixed-capacity text buffer filled from both ends at once.
///
/// The head cursor appends forward from the start; the tail cursor appends
/// backward from the end. [`TwoEndedWriter::finish`] slides the tail half down
/// against the head half, reusing the one allocation made up front.
#[derive(Debug)]
pub struct TwoEndedWriter {
    buffer: Vec<u8>,
    head: usize,
    tail: usize,
}

impl TwoEndedWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            head: 0,
            tail: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn remaining(&self) -> usize {
        self.tail - self.head
    }

    pub fn append_front(&mut self, text: &str) -> Result<(), CapacityError> {
        self.reserve(text.len())?;
        let end = self.head + text.len();
        self.buffer[self.head..end].copy_from_slice(text.as_bytes());
        self.head = end;
        Ok(())
    }

    /// Writes `text` immediately before everything already appended at the back.
    pub fn append_back(&mut self, text: &str) -> Result<(), CapacityError> {
        self.reserve(text.len())?;
        let start = self.tail - text.len();
        self.buffer[start..self.tail].copy_from_slice(text.as_bytes());
        self.tail = start;
        Ok(())
    }

    pub fn finish(self) -> String {
        let Self {
            mut buffer,
            head,
            tail,
        } = self;
        let back_len = buffer.len() - tail;
        buffer.copy_within(tail.., head);
        buffer.truncate(head + back_len);
        String::from_utf8(buffer).expect("both halves hold whole UTF-8 fragments")
    }

    fn reserve(&self, requested: usize) -> Result<(), CapacityError> {
        if requested > self.remaining() {
            return Err(CapacityError {
                requested,
                remaining: self.remaining(),
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_front_and_back_halves() {
        let mut writer = TwoEndedWriter::with_capacity(16);
        writer.append_front("ab").unwrap();
        writer.append_back("yz").unwrap();
        writer.append_back("wx").unwrap();
        writer.append_front("cd").unwrap();
        assert_eq!(writer.remaining(), 8);
        assert_eq!(writer.finish(), "abcdwxyz");
    }

    #[test]
    fn exact_fit_leaves_no_gap() {
        let mut writer = TwoEndedWriter::with_capacity(4);
        writer.append_back("34").unwrap();
        writer.append_front("12").unwrap();
        assert_eq!(writer.remaining(), 0);
        assert_eq!(writer.finish(), "1234");
    }

    #[test]
    fn refuses_to_cross_cursors() {
        let mut writer = TwoEndedWriter::with_capacity(5);
        writer.append_front("abc").unwrap();
        let err = writer.append_back("xyz").unwrap_err();
        assert_eq!(
            err,
            CapacityError {
                requested: 3,
                remaining: 2,
                capacity: 5,
            }
        );
        writer.append_back("yz").unwrap();
        assert_eq!(writer.finish(), "abcyz");
    }
}
