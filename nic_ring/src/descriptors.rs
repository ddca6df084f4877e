//! Legacy transmit and receive descriptor layouts used by e1000-family
//! Intel ethernet cards, per the 82540 software developer's manual.
//!
//! Each descriptor is a 16-byte record shared with the device's DMA engine;
//! the base of a descriptor array must be 16-byte aligned, which the
//! `align(16)` on each descriptor type guarantees for any allocation of them.

use core::fmt;
use nic_platform::PhysicalAddress;
use volatile::Volatile;

/// This struct is a Legacy Transmit Descriptor.
/// There is one instance of this struct per transmit buffer slot.
#[repr(C, align(16))]
pub struct LegacyTxDescriptor {
    /// The starting physical address of the transmit buffer
    pub phys_addr: Volatile<u64>,
    /// Length of the packet to transmit, in bytes
    pub length: Volatile<u16>,
    pub cso: Volatile<u8>,
    pub cmd: Volatile<u8>,
    pub status: Volatile<u8>,
    pub css: Volatile<u8>,
    pub special: Volatile<u16>,
}

impl LegacyTxDescriptor {
    /// Creates a transmit descriptor bound to the packet buffer at `buf_paddr`.
    ///
    /// The slot starts out software-owned: report-status is requested, legacy
    /// (non-extended) mode is selected, and the DD status bit is pre-set so
    /// the first submission finds the slot free.
    pub fn new(buf_paddr: PhysicalAddress) -> LegacyTxDescriptor {
        LegacyTxDescriptor {
            phys_addr: Volatile::new(buf_paddr.value() as u64),
            length: Volatile::new(0),
            cso: Volatile::new(0),
            cmd: Volatile::new(TX_CMD_RS & !TX_CMD_DEXT),
            status: Volatile::new(TX_STATUS_DD),
            css: Volatile::new(0),
            special: Volatile::new(0),
        }
    }
}

impl fmt::Debug for LegacyTxDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{addr: {:#X}, length: {}, cmd: {}, status: {}}}",
            self.phys_addr.read(), self.length.read(), self.cmd.read(), self.status.read())
    }
}

/// This struct is a Legacy Receive Descriptor.
/// There is one instance of this struct per receive buffer slot.
#[repr(C, align(16))]
pub struct LegacyRxDescriptor {
    /// The starting physical address of the receive buffer
    pub phys_addr: Volatile<u64>,
    /// Length of the received packet written by the device, in bytes
    pub length: Volatile<u16>,
    pub checksum: Volatile<u16>,
    pub status: Volatile<u8>,
    pub errors: Volatile<u8>,
    pub special: Volatile<u16>,
}

impl LegacyRxDescriptor {
    /// Creates a receive descriptor bound to the packet buffer at `buf_paddr`,
    /// with a cleared status so the slot starts out hardware-owned.
    pub fn new(buf_paddr: PhysicalAddress) -> LegacyRxDescriptor {
        LegacyRxDescriptor {
            phys_addr: Volatile::new(buf_paddr.value() as u64),
            length: Volatile::new(0),
            checksum: Volatile::new(0),
            status: Volatile::new(0),
            errors: Volatile::new(0),
            special: Volatile::new(0),
        }
    }
}

impl fmt::Debug for LegacyRxDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{addr: {:#X}, length: {}, status: {}, errors: {}}}",
            self.phys_addr.read(), self.length.read(), self.status.read(), self.errors.read())
    }
}

const _: () = assert!(core::mem::size_of::<LegacyTxDescriptor>() == 16);
const _: () = assert!(core::mem::size_of::<LegacyRxDescriptor>() == 16);
const _: () = assert!(core::mem::align_of::<LegacyTxDescriptor>() == 16);
const _: () = assert!(core::mem::align_of::<LegacyRxDescriptor>() == 16);

/* Legacy transmit descriptor bits */
/// Tx Command: End of Packet
pub const TX_CMD_EOP:       u8 = 1 << 0;
/// Tx Command: Report Status
pub const TX_CMD_RS:        u8 = 1 << 3;
/// Tx Command: Extended descriptor format; left clear for legacy mode
pub const TX_CMD_DEXT:      u8 = 1 << 5;
/// Tx Status: Descriptor Done
pub const TX_STATUS_DD:     u8 = 1 << 0;

/* Legacy receive descriptor bits */
/// Rx Status: Descriptor Done
pub const RX_STATUS_DD:     u8 = 1 << 0;
/// Rx Status: End of Packet
pub const RX_STATUS_EOP:    u8 = 1 << 1;
