use super::records::Records;
use super::row::Row;

/// Forward-only cursor over a dataset's rows in storage order.
/// Each traversal gets its own cursor; the dataset keeps no position.
pub struct Rows<'a> {
    records: &'a Records,
    next: usize,
    len: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(records: &'a Records) -> Self {
        Self {
            records,
            next: 0,
            len: records.len(),
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.next >= self.len {
            return None;
        }
        let row = self.records.row(self.next);
        self.next += 1;
        row
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}
