//! Fixed-capacity circular descriptor rings shared between the driver and a
//! DMA-capable NIC.
//!
//! Each ring owns an array of `N` descriptors plus a parallel array of `N`
//! packet buffers. Ownership of a slot alternates strictly between software
//! and hardware and is signaled only by the descriptor-done (DD) status bit:
//! software may touch a slot only after checking that bit, and hands the
//! slot back to the device by clearing it and then advancing the tail
//! register. The tail index itself lives in the device register and is read
//! back on every operation; the rings keep no shadow copy of it.
//!
//! The only mutating operations a ring exposes are [`TxRing::try_submit`]
//! and [`RxRing::try_consume`], so the flag-check-before-touch discipline
//! cannot be bypassed from outside this crate. Both return immediately with
//! a backpressure value ([`RingFull`] / [`RingEmpty`]) instead of blocking;
//! retry and drop policy belongs to the caller.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod descriptors;
mod buffer;

pub use crate::buffer::{PacketBuffer, MAX_FRAME_SIZE, PKT_BUF_SIZE};

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem::size_of;
use core::ptr::{read_volatile, write_volatile};
use crate::descriptors::{
    LegacyRxDescriptor, LegacyTxDescriptor, RX_STATUS_DD, RX_STATUS_EOP, TX_CMD_EOP, TX_STATUS_DD,
};
use log::trace;
use nic_platform::{MemoryMapper, PhysicalAddress, VirtualAddress};

/// Returned by [`TxRing::try_submit`] when every slot is hardware-owned.
/// This is ordinary steady-state backpressure, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingFull;

/// Returned by [`RxRing::try_consume`] when no slot holds a new packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingEmpty;

/// The driver-side handle to a queue's tail register, which mirrors the
/// ring's tail index into the device.
#[derive(Clone, Copy, Debug)]
pub struct TailRegister(VirtualAddress);

impl TailRegister {
    /// `addr` must be the virtual address of the queue's mapped TDT/RDT register.
    pub fn new(addr: VirtualAddress) -> TailRegister {
        TailRegister(addr)
    }

    fn read(&self) -> u32 {
        unsafe { read_volatile(self.0.value() as *const u32) }
    }

    fn write(&self, val: u32) {
        unsafe { write_volatile(self.0.value() as *mut u32, val) }
    }
}

/// The transmit descriptor ring and its packet buffers.
pub struct TxRing<const N: usize> {
    /// Transmit descriptors, in hardware-readable memory.
    descs: Box<[LegacyTxDescriptor]>,
    /// The packet buffers bound to the descriptors, index for index.
    bufs: Box<[PacketBuffer]>,
    /// Handle to the TDT register; advancing it publishes descriptors.
    tdt: TailRegister,
    base_paddr: PhysicalAddress,
}

impl<const N: usize> TxRing<N> {
    /// Allocates the descriptor and buffer arrays and binds each descriptor
    /// to its buffer's physical address. Every slot starts software-owned
    /// (DD pre-set), matching a device whose head and tail both start at 0.
    ///
    /// This does not touch any register; programming the ring's base/length
    /// and zeroing head/tail is the attach sequence's job.
    pub fn new<M: MemoryMapper>(tdt: TailRegister, mapper: &M) -> TxRing<N> {
        let bufs: Box<[PacketBuffer]> = (0..N)
            .map(|_| PacketBuffer::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let descs: Box<[LegacyTxDescriptor]> = bufs
            .iter()
            .map(|buf| LegacyTxDescriptor::new(mapper.virt_to_phys(buf.starting_vaddr())))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let base_paddr =
            mapper.virt_to_phys(VirtualAddress::new(descs.as_ptr() as usize));
        TxRing { descs, bufs, tdt, base_paddr }
    }

    /// The physical address of the first descriptor, for TDBAL/TDBAH.
    pub fn base_paddr(&self) -> PhysicalAddress {
        self.base_paddr
    }

    /// The byte length of the descriptor array, for TDLEN.
    pub fn len_in_bytes(&self) -> u32 {
        (N * size_of::<LegacyTxDescriptor>()) as u32
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Queues one frame for transmission.
    ///
    /// Reads the current tail index from the TDT register and checks the DD
    /// bit of that slot. If set, the slot is software-owned: the frame is
    /// copied into the slot's packet buffer, DD is cleared (handing the slot
    /// to the device) and end-of-packet is set, and finally the tail register
    /// is advanced by one modulo the capacity; that last write is what
    /// publishes the descriptor to the device, so it must come after all
    /// descriptor and buffer writes. If DD is clear the device has not yet
    /// finished with the slot and `RingFull` is returned with nothing mutated.
    ///
    /// # Panics
    /// If `frame` is larger than one packet buffer. Such a frame can never be
    /// sent through a single legacy descriptor, so this is a caller bug, not
    /// backpressure.
    pub fn try_submit(&mut self, frame: &[u8]) -> Result<(), RingFull> {
        assert!(
            frame.len() <= PKT_BUF_SIZE,
            "tx frame of {} bytes exceeds the {}-byte packet buffer",
            frame.len(),
            PKT_BUF_SIZE,
        );

        let tail = self.tdt.read() as usize;
        let desc = &mut self.descs[tail];
        let status = desc.status.read();
        if status & TX_STATUS_DD == 0 {
            return Err(RingFull);
        }

        self.bufs[tail][..frame.len()].copy_from_slice(frame);
        desc.length.write(frame.len() as u16);
        desc.cmd.write(desc.cmd.read() | TX_CMD_EOP);
        desc.status.write(status & !TX_STATUS_DD);

        trace!("tx: slot {} <- {} bytes", tail, frame.len());
        self.tdt.write(((tail + 1) % N) as u32);
        Ok(())
    }
}

/// The receive descriptor ring and its packet buffers.
pub struct RxRing<const N: usize> {
    /// Receive descriptors, in hardware-writable memory.
    descs: Box<[LegacyRxDescriptor]>,
    /// The packet buffers bound to the descriptors, index for index.
    bufs: Box<[PacketBuffer]>,
    /// Handle to the RDT register; advancing it republishes consumed slots.
    rdt: TailRegister,
    base_paddr: PhysicalAddress,
}

impl<const N: usize> RxRing<N> {
    /// Allocates the descriptor and buffer arrays and binds each descriptor
    /// to its buffer's physical address. Every slot starts hardware-owned
    /// (status clear), ready for the device to fill.
    pub fn new<M: MemoryMapper>(rdt: TailRegister, mapper: &M) -> RxRing<N> {
        let bufs: Box<[PacketBuffer]> = (0..N)
            .map(|_| PacketBuffer::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let descs: Box<[LegacyRxDescriptor]> = bufs
            .iter()
            .map(|buf| LegacyRxDescriptor::new(mapper.virt_to_phys(buf.starting_vaddr())))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let base_paddr =
            mapper.virt_to_phys(VirtualAddress::new(descs.as_ptr() as usize));
        RxRing { descs, bufs, rdt, base_paddr }
    }

    /// The physical address of the first descriptor, for RDBAL/RDBAH.
    pub fn base_paddr(&self) -> PhysicalAddress {
        self.base_paddr
    }

    /// The byte length of the descriptor array, for RDLEN.
    pub fn len_in_bytes(&self) -> u32 {
        (N * size_of::<LegacyRxDescriptor>()) as u32
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Takes the next received frame out of the ring, if one is present.
    ///
    /// The candidate slot is one past the current RDT value, i.e. the next
    /// slot the device would have filled (the tail trails the device's head
    /// by the full ring). If that slot's DD bit is clear there is no new
    /// packet and `RingEmpty` is returned with nothing mutated, the tail
    /// register included. Otherwise the packet is copied into `dst`, DD and
    /// EOP are cleared (returning the slot to hardware ownership), and the
    /// tail register is advanced to the candidate index, which is what
    /// republishes the slot as hardware-writable.
    ///
    /// Returns the number of bytes copied. `dst` must be at least
    /// [`PKT_BUF_SIZE`] bytes.
    ///
    /// # Panics
    /// If the slot reports DD without EOP. The receive buffers are sized to
    /// hold any full frame and long-packet reception is disabled, so a
    /// multi-descriptor frame means the device and driver disagree about the
    /// ring's configuration; continuing would hand out truncated data.
    pub fn try_consume(&mut self, dst: &mut [u8]) -> Result<usize, RingEmpty> {
        let tail = self.rdt.read() as usize;
        let cur = (tail + 1) % N;
        let desc = &mut self.descs[cur];
        let status = desc.status.read();
        if status & RX_STATUS_DD == 0 {
            return Err(RingEmpty);
        }
        assert!(
            status & RX_STATUS_EOP != 0,
            "rx slot {} has DD without EOP; multi-descriptor frames are unsupported",
            cur,
        );

        let length = desc.length.read() as usize;
        dst[..length].copy_from_slice(&self.bufs[cur][..length]);
        desc.status.write(status & !(RX_STATUS_DD | RX_STATUS_EOP));

        trace!("rx: slot {} -> {} bytes", cur, length);
        self.rdt.write(cur as u32);
        Ok(length)
    }
}
