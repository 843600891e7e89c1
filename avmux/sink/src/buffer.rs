/*!
    Per-stream storage for elementary data that has not been parsed yet.
*/

use std::io;

/**
    Growable byte buffer with a consumed-offset cursor.

    Bytes before the cursor have been consumed by the demuxer and may be
    discarded. Discarding happens lazily: an append that would otherwise
    have to grow the allocation first moves the unconsumed tail to the
    front of the buffer.
*/
#[derive(Debug, Default)]
pub struct StreamBuffer {
    data: Vec<u8>,
    pos: usize,
    appended: u64,
}

impl StreamBuffer {
    /**
        Create an empty buffer.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Create an empty buffer that can hold `capacity` bytes before growing.
    */
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /**
        Append bytes to the end of the buffer.

        Compacts first when the cursor is past the start and the append
        would not fit in the current allocation.
    */
    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        if self.pos > 0 && self.data.len() + bytes.len() > self.data.capacity() {
            self.compact();
        }

        self.data.extend_from_slice(bytes);
        self.appended += bytes.len() as u64;
    }

    /**
        Drop every consumed byte, moving the unconsumed tail to offset zero
        and resetting the cursor.
    */
    pub fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.data.copy_within(self.pos.., 0);
        self.data.truncate(self.data.len() - self.pos);
        self.pos = 0;
    }

    /**
        Advance the cursor by `n` bytes.

        # Panics

        Panics if `n` exceeds the number of unconsumed bytes.
    */
    pub fn consume(&mut self, n: usize) {
        let remaining = self.remaining();
        assert!(
            n <= remaining,
            "cannot consume {n} bytes, only {remaining} remaining"
        );
        self.pos += n;
    }

    /**
        Move the cursor back to an earlier position, un-consuming bytes.

        Only positions recorded since the last append are meaningful,
        since an append may compact the buffer.

        # Panics

        Panics if `pos` lies past the current cursor.
    */
    pub fn rewind(&mut self, pos: usize) {
        assert!(pos <= self.pos, "cannot rewind forward to {pos}");
        self.pos = pos;
    }

    /**
        Number of unconsumed bytes.
    */
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /**
        Returns true if there are no unconsumed bytes.
    */
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /**
        Current cursor position within the stored bytes.
    */
    pub fn position(&self) -> usize {
        self.pos
    }

    /**
        Number of stored bytes, consumed or not.
    */
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /**
        Size of the current allocation.
    */
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /**
        Total number of bytes ever appended.
    */
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    /**
        The unconsumed bytes.
    */
    pub fn unconsumed(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /**
        Borrow the unconsumed bytes as a reader. Everything read through it
        advances this buffer's cursor.
    */
    pub fn reader(&mut self) -> InputReader<'_> {
        InputReader {
            data: &self.data,
            start: self.pos,
            pos: &mut self.pos,
        }
    }
}

/**
    Cursor view over the unconsumed bytes of a [`StreamBuffer`].

    Handed to a demuxer for the duration of a single probe or read call.
*/
#[derive(Debug)]
pub struct InputReader<'a> {
    data: &'a [u8],
    start: usize,
    pos: &'a mut usize,
}

impl<'a> InputReader<'a> {
    /**
        Number of bytes still available.
    */
    pub fn remaining(&self) -> usize {
        self.data.len() - *self.pos
    }

    /**
        Number of bytes consumed through this reader.
    */
    pub fn consumed(&self) -> usize {
        *self.pos - self.start
    }

    /**
        All bytes still available, without consuming them.
    */
    pub fn peek(&self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        &data[*self.pos..]
    }

    /**
        Consume `n` bytes.

        # Panics

        Panics if fewer than `n` bytes remain.
    */
    pub fn consume(&mut self, n: usize) {
        let remaining = self.remaining();
        assert!(
            n <= remaining,
            "cannot consume {n} bytes, only {remaining} remaining"
        );
        *self.pos += n;
    }

    /**
        Read exactly `n` bytes, advancing the position.

        Returns `None` without consuming anything when fewer than `n`
        bytes are available.
    */
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.peek()[..n];
        *self.pos += n;
        Some(slice)
    }

    /**
        Read a fixed-size byte array, advancing the position.
    */
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Some(arr)
    }
}

impl io::Read for InputReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.peek()[..n]);
        *self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn append_and_consume() {
        let mut buf = StreamBuffer::new();
        buf.append(&[1, 2, 3, 4]);
        assert_eq!(buf.remaining(), 4);

        buf.consume(3);
        assert_eq!(buf.remaining(), 1);
        assert_eq!(buf.unconsumed(), &[4]);
        assert!(!buf.is_empty());

        buf.consume(1);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_append_is_noop() {
        let mut buf = StreamBuffer::new();
        buf.append(&[]);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.total_appended(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot consume 3 bytes, only 2 remaining")]
    fn over_consume_panics() {
        let mut buf = StreamBuffer::new();
        buf.append(&[1, 2]);
        buf.consume(3);
    }

    #[test]
    fn append_within_capacity_does_not_compact() {
        let mut buf = StreamBuffer::with_capacity(16);
        buf.append(&[1, 2, 3, 4]);
        buf.consume(2);
        buf.append(&[5, 6]);

        assert_eq!(buf.position(), 2);
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.unconsumed(), &[3, 4, 5, 6]);
    }

    #[test]
    fn append_past_capacity_compacts_first() {
        let mut buf = StreamBuffer::with_capacity(4);
        buf.append(&[1, 2, 3, 4]);
        let capacity = buf.capacity();
        buf.consume(3);

        let extra = vec![9u8; capacity - 1];
        buf.append(&extra);

        // The unconsumed byte moved to the front and the new bytes fit
        // into the existing allocation.
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.len(), capacity);
        assert_eq!(buf.capacity(), capacity);
        assert_eq!(buf.unconsumed()[0], 4);
        assert_eq!(&buf.unconsumed()[1..], extra.as_slice());
    }

    #[test]
    fn compact_without_consumed_bytes_is_noop() {
        let mut buf = StreamBuffer::new();
        buf.append(&[1, 2, 3]);
        buf.compact();
        assert_eq!(buf.unconsumed(), &[1, 2, 3]);
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn rewind_restores_consumed_bytes() {
        let mut buf = StreamBuffer::new();
        buf.append(&[1, 2, 3, 4]);
        buf.consume(1);
        let mark = buf.position();
        buf.consume(2);
        buf.rewind(mark);
        assert_eq!(buf.unconsumed(), &[2, 3, 4]);
    }

    #[test]
    fn total_appended_counts_every_byte() {
        let mut buf = StreamBuffer::with_capacity(2);
        buf.append(&[1, 2]);
        buf.consume(2);
        buf.append(&[3, 4, 5]);
        assert_eq!(buf.total_appended(), 5);
        assert_eq!(buf.remaining(), 3);
    }

    #[test]
    fn reader_advances_buffer() {
        let mut buf = StreamBuffer::new();
        buf.append(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);

        {
            let mut reader = buf.reader();
            assert_eq!(reader.peek(), &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
            let arr: [u8; 2] = reader.read_array().unwrap();
            assert_eq!(arr, [0xAA, 0xBB]);
            assert!(reader.read_bytes(4).is_none());
            reader.consume(1);
            assert_eq!(reader.consumed(), 3);
            assert_eq!(reader.remaining(), 2);
        }

        assert_eq!(buf.unconsumed(), &[0xDD, 0xEE]);
    }

    #[test]
    fn reader_implements_read() {
        let mut buf = StreamBuffer::new();
        buf.append(b"hello");

        let mut out = [0u8; 8];
        let n = buf.reader().read(&mut out).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&out[..n], b"hello");
        assert!(buf.is_empty());

        assert_eq!(buf.reader().read(&mut out).unwrap(), 0);
    }
}
