/// Double-buffered column for a single per-particle attribute.
///
/// The column has a fixed length for its whole lifetime. Reading always
/// happens from the `cur` buffer, writing into `nxt`, and `swap_buffers`
/// flips their roles once every element of the tick has been written.
pub struct Column<T> {
    cur: Vec<T>,
    nxt: Vec<T>,
}

impl<T: Clone> Column<T> {
    /// Create a column whose both buffers start out as copies of `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            nxt: values.clone(),
            cur: values,
        }
    }
}

impl<T> Column<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.cur.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cur.is_empty()
    }

    /// Borrow the committed (read) buffer.
    #[inline]
    pub fn read(&self) -> &[T] {
        &self.cur
    }

    /// Borrow the committed and write buffers together.
    pub fn slice_rw(&mut self) -> (&[T], &mut [T]) {
        (&self.cur, &mut self.nxt)
    }

    /// Swap current/next buffers at the end of a tick.
    #[inline]
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.nxt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_invisible_until_swap() {
        let mut column = Column::from_vec(vec![1, 2, 3]);

        {
            let (read, write) = column.slice_rw();
            for (next, cur) in write.iter_mut().zip(read) {
                *next = cur * 10;
            }
        }
        assert_eq!(column.read(), &[1, 2, 3]);

        column.swap_buffers();
        assert_eq!(column.read(), &[10, 20, 30]);
        assert_eq!(column.len(), 3);
    }

    #[test]
    fn unwritten_rows_keep_the_older_generation() {
        let mut column = Column::from_vec(vec![0u32; 4]);
        column.slice_rw().1[2] = 7;
        column.swap_buffers();
        assert_eq!(column.read(), &[0, 0, 7, 0]);

        // Row 2 was only written into the generation that is now committed.
        column.swap_buffers();
        assert_eq!(column.read(), &[0, 0, 0, 0]);
        assert!(!column.is_empty());
    }
}
