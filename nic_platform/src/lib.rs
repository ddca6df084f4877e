//! The boundary between the e1000 driver and the environment hosting it.
//!
//! The driver does not enumerate the PCI bus, touch page tables, or talk to
//! the scheduler; those concerns belong to whatever kernel embeds it. This
//! crate defines the narrow seams through which the driver reaches them:
//! address newtypes, the MMIO mapping and address-translation primitive,
//! the platform interrupt-controller acknowledge, and the scheduler's
//! "mark runnable" hook used to wake a consumer blocked on receive.

#![cfg_attr(not(test), no_std)]

use core::fmt;
use core::ops::Add;
use core::ptr::NonNull;

/// A physical memory address, e.g., one programmed into a device register.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct PhysicalAddress(usize);

impl PhysicalAddress {
    pub const fn new(addr: usize) -> PhysicalAddress {
        PhysicalAddress(addr)
    }

    pub const fn value(&self) -> usize {
        self.0
    }
}

impl Add<usize> for PhysicalAddress {
    type Output = PhysicalAddress;
    fn add(self, rhs: usize) -> PhysicalAddress {
        PhysicalAddress(self.0 + rhs)
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p{:#X}", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A virtual memory address usable by the CPU.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct VirtualAddress(usize);

impl VirtualAddress {
    pub const fn new(addr: usize) -> VirtualAddress {
        VirtualAddress(addr)
    }

    pub const fn value(&self) -> usize {
        self.0
    }
}

impl Add<usize> for VirtualAddress {
    type Output = VirtualAddress;
    fn add(self, rhs: usize) -> VirtualAddress {
        VirtualAddress(self.0 + rhs)
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{:#X}", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The kernel's memory-mapping primitives, supplied to the driver at attach.
///
/// `virt_to_phys` must be valid for the driver's descriptor rings and packet
/// buffers, which the environment must back with physically contiguous
/// memory (an identity-mapped kernel heap satisfies this).
pub trait MemoryMapper {
    /// Maps `size_in_bytes` of the device's register space starting at the
    /// physical address `paddr`, returning the start of the virtual window.
    ///
    /// The mapping must remain valid for the lifetime of the device.
    fn map_mmio(
        &mut self,
        paddr: PhysicalAddress,
        size_in_bytes: usize,
    ) -> Result<NonNull<u8>, &'static str>;

    /// Translates a virtual address of driver-owned memory into the physical
    /// address the device's DMA engine should use.
    fn virt_to_phys(&self, vaddr: VirtualAddress) -> PhysicalAddress;
}

/// The platform interrupt controller's end-of-interrupt acknowledge,
/// invoked by the driver's interrupt handler after the device-level ack.
pub trait InterruptController {
    fn eoi(&mut self);
}

/// The scheduler-side half of the receive wakeup path: marks the one task
/// blocked waiting for received packets as runnable again.
pub trait RxWaker: Send + Sync {
    fn wake(&self);
}
