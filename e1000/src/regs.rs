//! This file contains the structs that are used to access device registers
//! and configuration values to write to registers.
//!
//! The registers are divided into multiple structs because we need to separate
//! out the receive and transmit queue registers and store them separately in
//! a per-queue struct. Though the e1000 device only has 1 pair of receive and
//! transmit queues, we still structure the design this way to be able to use
//! code shared by all network drivers.
//!
//! The 4 structs which cover the registers of the entire memory-mapped region are:
//! * `E1000Registers`
//! * `E1000RxRegisters`
//! * `E1000TxRegisters`
//! * `E1000MacRegisters`

use volatile::{ReadOnly, Volatile};

/// Size in bytes of the whole e1000 register window; a BAR smaller than this
/// cannot cover the MAC-address registers at its far end.
pub const REGISTER_WINDOW_SIZE: usize = 0x20000;

pub const GENERAL_REGISTERS_SIZE_BYTES: usize = 8192;
pub const RX_REGISTERS_SIZE_BYTES: usize = 4096;
pub const TX_REGISTERS_SIZE_BYTES: usize = 4096;
pub const MAC_REGISTERS_SIZE_BYTES: usize = 114_688;

/// The layout in memory of the first set of e1000 registers.
#[repr(C)]
pub struct E1000Registers {
    /// Device control register
    pub ctrl:                       Volatile<u32>,          // 0x0
    _padding0:                      [u8; 4],                // 0x4 - 0x7
    pub status:                     ReadOnly<u32>,          // 0x8
    _padding1:                      [u8; 8],                // 0xC - 0x13

    /// EEPROM read register: address/start in the low half,
    /// done/data in the high half
    pub eerd:                       Volatile<u32>,          // 0x14
    _padding2:                      [u8; 168],              // 0x18 - 0xBF

    /// Interrupt cause read register; causes are acknowledged
    /// by writing their bits back (write-one-to-clear)
    pub icr:                        Volatile<u32>,          // 0xC0
    _padding3:                      [u8; 12],               // 0xC4 - 0xCF
    /// Interrupt mask set register
    pub ims:                        Volatile<u32>,          // 0xD0
    _padding4:                      [u8; 44],               // 0xD4 - 0xFF

    /// Receive control register
    pub rctl:                       Volatile<u32>,          // 0x100
    _padding5:                      [u8; 764],              // 0x104 - 0x3FF

    /// Transmit control register
    pub tctl:                       Volatile<u32>,          // 0x400
    _padding6:                      [u8; 12],               // 0x404 - 0x40F
    /// Transmit inter-packet-gap register
    pub tipg:                       Volatile<u32>,          // 0x410
    _padding7:                      [u8; 7148],             // 0x414 - 0x1FFF

} // 2 4KiB pages

const _: () = assert!(core::mem::size_of::<E1000Registers>() == GENERAL_REGISTERS_SIZE_BYTES);

/// The layout in memory of e1000 receive registers.
#[repr(C)]
pub struct E1000RxRegisters {
    _padding8:                      [u8; 2048],             // 0x2000 - 0x27FF

    pub rx_regs:                    RegistersRx,            // 0x2800
    _padding9:                      [u8; 2020],             // 0x281C - 0x2FFF
} // 1 4KiB page

const _: () = assert!(core::mem::size_of::<E1000RxRegisters>() == RX_REGISTERS_SIZE_BYTES);

/// The layout in memory of e1000 transmit registers.
#[repr(C)]
pub struct E1000TxRegisters {
    _padding10:                     [u8; 2048],             // 0x3000 - 0x37FF

    pub tx_regs:                    RegistersTx,            // 0x3800
    _padding11:                     [u8; 2020],             // 0x381C - 0x3FFF
} // 1 4KiB page

const _: () = assert!(core::mem::size_of::<E1000TxRegisters>() == TX_REGISTERS_SIZE_BYTES);

/// The layout in memory of the e1000 multicast-table and MAC address registers.
#[repr(C)]
pub struct E1000MacRegisters {
    _padding12:                     [u8; 4608],             // 0x4000 - 0x51FF

    /// The multicast table array, zeroed at attach because
    /// multicast filtering is unused.
    pub mta:                        [Volatile<u32>; 128],   // 0x5200 - 0x53FF
    /// The lower (least significant) 32 bits of the NIC's MAC hardware address.
    pub ral:                        Volatile<u32>,          // 0x5400
    /// The higher (most significant) 32 bits of the NIC's MAC hardware address.
    pub rah:                        Volatile<u32>,          // 0x5404
    _padding13:                     [u8; 109_560],          // 0x5408 - 0x1FFFF
    // End of all register structs should be at offset 0x20000 (128 KiB in total size).
} // 28 4KiB pages

const _: () = assert!(core::mem::size_of::<E1000MacRegisters>() == MAC_REGISTERS_SIZE_BYTES);

// check that the sum of all the register structs is equal to the size of the
// e1000 register window (128 KiB).
const _: () = assert!(
    core::mem::size_of::<E1000Registers>()
    + core::mem::size_of::<E1000RxRegisters>()
    + core::mem::size_of::<E1000TxRegisters>()
    + core::mem::size_of::<E1000MacRegisters>()
    == REGISTER_WINDOW_SIZE
);

/// Struct that holds registers related to one receive queue.
#[repr(C)]
pub struct RegistersRx {
    /// The lower (least significant) 32 bits of the physical address of the array of receive descriptors.
    pub rdbal:                      Volatile<u32>,          // 0x2800
    /// The higher (most significant) 32 bits of the physical address of the array of receive descriptors.
    pub rdbah:                      Volatile<u32>,          // 0x2804
    /// The length in bytes of the array of receive descriptors.
    pub rdlen:                      Volatile<u32>,          // 0x2808
    _padding0:                      [u8; 4],                // 0x280C - 0x280F
    /// The receive descriptor head index, owned by the device.
    pub rdh:                        Volatile<u32>,          // 0x2810
    _padding1:                      [u8; 4],                // 0x2814 - 0x2817
    /// The receive descriptor tail index, advanced by software as slots are consumed.
    pub rdt:                        Volatile<u32>,          // 0x2818
}

/// Struct that holds registers related to one transmit queue.
#[repr(C)]
pub struct RegistersTx {
    /// The lower (least significant) 32 bits of the physical address of the array of transmit descriptors.
    pub tdbal:                      Volatile<u32>,          // 0x3800
    /// The higher (most significant) 32 bits of the physical address of the array of transmit descriptors.
    pub tdbah:                      Volatile<u32>,          // 0x3804
    /// The length in bytes of the array of transmit descriptors.
    pub tdlen:                      Volatile<u32>,          // 0x3808
    _padding0:                      [u8; 4],                // 0x380C - 0x380F
    /// The transmit descriptor head index, owned by the device.
    pub tdh:                        Volatile<u32>,          // 0x3810
    _padding1:                      [u8; 4],                // 0x3814 - 0x3817
    /// The transmit descriptor tail index, advanced by software as packets are queued.
    pub tdt:                        Volatile<u32>,          // 0x3818
}

// CTRL commands
/// Set link up
pub const CTRL_SLU:                 u32 = 1 << 6;

// EERD fields
/// Start an EEPROM read
pub const EERD_START:               u32 = 1 << 0;
/// The requested EEPROM word is present in the data field
pub const EERD_DONE:                u32 = 1 << 4;
/// Offset of the word-address field
pub const EERD_ADDR_SHIFT:          u32 = 8;
/// Offset of the 16-bit data field
pub const EERD_DATA_SHIFT:          u32 = 16;

// TCTL commands
/// Transmit Enable
pub const TCTL_EN:                  u32 = 1 << 1;
/// Pad Short Packets
pub const TCTL_PSP:                 u32 = 1 << 3;
/// Collision Threshold
pub const TCTL_CT_SHIFT:            u32 = 4;
/// Collision Distance
pub const TCTL_COLD_SHIFT:          u32 = 12;

// TIPG fields
/// IPG Transmit Time
pub const TIPG_IPGT_SHIFT:          u32 = 0;
/// IPG Receive Time 1
pub const TIPG_IPGR1_SHIFT:         u32 = 10;
/// IPG Receive Time 2
pub const TIPG_IPGR2_SHIFT:         u32 = 20;

// RCTL commands
/// Receiver Enable
pub const RCTL_EN:                  u32 = 1 << 1;
/// Long Packet Reception Enable; left clear because jumbo frames are
/// unsupported and each receive buffer must hold a whole frame
pub const RCTL_LPE:                 u32 = 1 << 5;
/// No loopback
pub const RCTL_LBM_NONE:            u32 = 0 << 6;
/// Broadcast Accept Mode
pub const RCTL_BAM:                 u32 = 1 << 15;
/// Receive buffer size of 2048 bytes
pub const RCTL_BSIZE_2048:          u32 = 0 << 16;
/// Strip Ethernet CRC
pub const RCTL_SECRC:               u32 = 1 << 26;

// RAH fields
/// The receive address is valid
pub const RAH_AV:                   u32 = 1 << 31;
