//! The fixed-size packet buffer bound to each descriptor slot.

use core::ops::{Deref, DerefMut};
use nic_platform::VirtualAddress;

/// The size in bytes of the packet buffer in each descriptor slot.
/// Must match the buffer size programmed into the device's receive control.
pub const PKT_BUF_SIZE: usize = 2048;

/// The largest standard Ethernet frame; always fits in one packet buffer,
/// which is why one descriptor per packet suffices.
pub const MAX_FRAME_SIZE: usize = 1518;

const _: () = assert!(MAX_FRAME_SIZE <= PKT_BUF_SIZE);

/// A buffer holding the payload of one frame.
/// Auto-dereferences into a byte slice over its underlying memory.
#[repr(C)]
pub struct PacketBuffer {
    bytes: [u8; PKT_BUF_SIZE],
}

impl PacketBuffer {
    pub fn new() -> PacketBuffer {
        PacketBuffer { bytes: [0; PKT_BUF_SIZE] }
    }

    /// The virtual address of the start of this buffer,
    /// used to derive the physical address bound into its descriptor.
    pub fn starting_vaddr(&self) -> VirtualAddress {
        VirtualAddress::new(self.bytes.as_ptr() as usize)
    }
}

impl Default for PacketBuffer {
    fn default() -> PacketBuffer {
        PacketBuffer::new()
    }
}

impl Deref for PacketBuffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for PacketBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
