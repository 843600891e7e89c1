/*!
    Container output accumulation.
*/

/**
    Append-only buffer receiving the bytes a container writer produces.

    Writers append to it whenever they emit container data; the caller
    drains it with [`OutputBuffer::take`], which swaps the storage out
    instead of copying it.
*/
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /**
        Create an empty output buffer.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Append encoded container bytes.
    */
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /**
        Take everything produced so far, leaving the buffer empty.
    */
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /**
        Returns true if there are bytes waiting to be taken.
    */
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /**
        Number of bytes waiting to be taken.
    */
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /**
        Returns true if no bytes are waiting.
    */
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
