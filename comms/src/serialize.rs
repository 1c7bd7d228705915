use std::io;

/// A type that can be written into a frame of the application layer protocol.
pub trait Serialize<'a> {
    /// Writes the serialized form of `self` into `buf`.
    ///
    /// # Arguments
    /// * `buf` - The frame buffer, it may already contain a prefix that must be kept.
    ///
    /// # Returns
    /// An optional trailing slice that will be written after `buf` without being copied,
    /// or an io error if `self` couldn't be serialized.
    fn serialize(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>>;
}
