/*!
    In-memory AVIO plumbing.

    Demuxers read from the unconsumed bytes of a stream buffer, exposed to
    FFmpeg for the duration of one call. Writers append everything FFmpeg
    emits to a byte vector that is moved into the engine's output buffer.
*/

use std::os::raw::{c_int, c_void};
use std::{ptr, slice};

use ffmpeg_next::ffi;

use avmux_types::{Error, Result};

use crate::convert::{again_code, eof_code};

/// Size of the buffers handed to AVIO contexts.
pub(crate) const IO_BUFFER_SIZE: usize = 4096;

/**
    What a read reports once the exposed bytes run out.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Exhaustion {
    /// End of file, so probing stops instead of waiting for bytes.
    EndOfFile,
    /// Try again, so parsers keep their state for the next call.
    TryAgain,
}

/**
    Bytes exposed to a read-side AVIO context during one demuxer call.
*/
#[derive(Debug)]
pub(crate) struct PendingInput {
    data: *const u8,
    len: usize,
    consumed: usize,
    exhausted: bool,
    on_exhausted: Exhaustion,
}

impl PendingInput {
    pub(crate) fn new() -> Self {
        Self {
            data: ptr::null(),
            len: 0,
            consumed: 0,
            exhausted: false,
            on_exhausted: Exhaustion::EndOfFile,
        }
    }

    /**
        Expose `data` until the matching [`PendingInput::finish`].
    */
    pub(crate) fn begin(&mut self, data: &[u8], on_exhausted: Exhaustion) {
        self.data = data.as_ptr();
        self.len = data.len();
        self.consumed = 0;
        self.exhausted = false;
        self.on_exhausted = on_exhausted;
    }

    /**
        Stop exposing bytes, returning how many were read.
    */
    pub(crate) fn finish(&mut self) -> usize {
        self.data = ptr::null();
        self.len = 0;
        std::mem::take(&mut self.consumed)
    }

    /**
        Returns true if a read found no bytes left since the last `begin`.
    */
    pub(crate) fn exhausted(&self) -> bool {
        self.exhausted
    }

    /**
        Copy exposed bytes into `out`, returning `None` once none are left.
    */
    fn read_into(&mut self, out: &mut [u8]) -> Option<usize> {
        let available = self.len - self.consumed;
        if available == 0 || self.data.is_null() {
            self.exhausted = true;
            return None;
        }
        let n = available.min(out.len());
        // SAFETY: `data` stays valid for `len` bytes between begin and finish
        let source = unsafe { slice::from_raw_parts(self.data.add(self.consumed), n) };
        out[..n].copy_from_slice(source);
        self.consumed += n;
        Some(n)
    }
}

unsafe extern "C" fn read_input(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    if opaque.is_null() || buf.is_null() || buf_size <= 0 {
        return eof_code();
    }
    let pending = unsafe { &mut *opaque.cast::<PendingInput>() };
    let out = unsafe { slice::from_raw_parts_mut(buf, buf_size as usize) };
    match pending.read_into(out) {
        Some(n) => n as c_int,
        None => match pending.on_exhausted {
            Exhaustion::EndOfFile => eof_code(),
            Exhaustion::TryAgain => again_code(),
        },
    }
}

unsafe extern "C" fn write_output(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int {
    if opaque.is_null() {
        return eof_code();
    }
    let sink = unsafe { &mut *opaque.cast::<Vec<u8>>() };
    if !buf.is_null() && buf_size > 0 {
        sink.extend_from_slice(unsafe { slice::from_raw_parts(buf, buf_size as usize) });
    }
    buf_size
}

/**
    Allocate a non-seekable read context over `input`.

    # Safety

    `input` must outlive the returned context.
*/
pub(crate) unsafe fn alloc_read_context(input: *mut PendingInput) -> Result<*mut ffi::AVIOContext> {
    unsafe { alloc_context(input.cast(), false) }
}

/**
    Allocate a non-seekable write context appending to `sink`.

    # Safety

    `sink` must outlive the returned context.
*/
pub(crate) unsafe fn alloc_write_context(sink: *mut Vec<u8>) -> Result<*mut ffi::AVIOContext> {
    unsafe { alloc_context(sink.cast(), true) }
}

unsafe fn alloc_context(opaque: *mut c_void, write: bool) -> Result<*mut ffi::AVIOContext> {
    let buffer = unsafe { ffi::av_malloc(IO_BUFFER_SIZE) }.cast::<u8>();
    if buffer.is_null() {
        return Err(Error::backend("failed to allocate I/O buffer"));
    }

    let context = unsafe {
        if write {
            ffi::avio_alloc_context(
                buffer,
                IO_BUFFER_SIZE as c_int,
                1,
                opaque,
                None,
                Some(write_output),
                None,
            )
        } else {
            ffi::avio_alloc_context(
                buffer,
                IO_BUFFER_SIZE as c_int,
                0,
                opaque,
                Some(read_input),
                None,
                None,
            )
        }
    };

    if context.is_null() {
        unsafe { ffi::av_free(buffer.cast()) };
        return Err(Error::backend("failed to allocate I/O context"));
    }
    unsafe { (*context).seekable = 0 };
    Ok(context)
}

/**
    Free an AVIO context and its buffer, nulling the pointer.

    # Safety

    `context` must be null or a context from this module that no format
    context still uses.
*/
pub(crate) unsafe fn free_context(context: &mut *mut ffi::AVIOContext) {
    if context.is_null() {
        return;
    }
    unsafe {
        // FFmpeg may have replaced the buffer; free whatever it holds now
        ffi::av_freep(ptr::addr_of_mut!((**context).buffer).cast());
        ffi::avio_context_free(context);
    }
}
