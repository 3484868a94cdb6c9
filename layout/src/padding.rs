//! Alignment padding.
//!
//! An `Align[T]` field holds no data. Its length is derived from its own offset every time it is
//! queried, so it stays correct as the fields before it are built.

/// Returns the number of zero bytes needed to move `offset` up to the next multiple of `align`.
///
/// Returns 0 when `offset` is already aligned, and always 0 for an alignment of 0.
pub fn length(align: usize, offset: usize) -> usize {
    if align == 0 {
        return 0;
    }
    (align - offset % align) % align
}
