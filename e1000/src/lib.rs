//! Driver for the Intel e1000 (82540-family) ethernet NIC, covering the
//! QEMU/Bochs/VirtualBox-emulated device.
//!
//! The driver owns two descriptor rings shared with the device's DMA engine
//! (32 transmit slots, 128 receive slots, one 2048-byte packet buffer each)
//! and exposes non-blocking [`transmit`](E1000Nic::transmit) and
//! [`receive`](E1000Nic::receive) primitives on top of them. A consumer that
//! would rather block than poll registers a waker in the driver's
//! [`RxWaitCell`] and yields; the receive-timer interrupt handler wakes it.
//!
//! Everything the driver does not own sits behind the `nic_platform` traits:
//! PCI enumeration and BAR discovery, MMIO mapping, the platform interrupt
//! controller, and the scheduler. A single `E1000Nic` value owns all device
//! state; it is constructed once per device by [`E1000Nic::init`] and passed
//! by reference to whoever needs it, rather than living in a global.

#![cfg_attr(not(test), no_std)]

#[macro_use] extern crate log;
extern crate alloc;

mod eeprom;
mod regs;
mod waiter;

pub use crate::eeprom::EEPROM_NUM_MAC_WORDS;
pub use crate::waiter::RxWaitCell;
pub use nic_ring::{RingEmpty, RingFull, MAX_FRAME_SIZE, PKT_BUF_SIZE};

use alloc::sync::Arc;
use bit_field::BitField;
use core::ptr::addr_of;
use nic_platform::{InterruptController, MemoryMapper, PhysicalAddress, VirtualAddress};
use nic_ring::{RxRing, TailRegister, TxRing};
use crate::regs::*;

/// Vendor ID for Intel
pub const INTEL_VEND:       u16 = 0x8086;
/// Device ID for the e1000 QEMU, Bochs, and VirtualBox emulated NICs
pub const E1000_DEV:        u16 = 0x100E;

const E1000_NUM_TX_DESC:    usize = 32;
const E1000_NUM_RX_DESC:    usize = 128;

// The device requires each ring's byte length to be a multiple of 128.
const _: () = assert!((E1000_NUM_TX_DESC * 16) % 128 == 0);
const _: () = assert!((E1000_NUM_RX_DESC * 16) % 128 == 0);

/// Interrupt type: Receive Timer Interrupt
const INT_RX:               u32 = 0x80;

/// Tunable attach-time settings.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How many times to poll EERD for completion of one EEPROM word read
    /// before giving up on the device.
    pub eeprom_poll_attempts: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config { eeprom_poll_attempts: 100_000 }
    }
}

/// Struct representing an e1000 network interface card.
pub struct E1000Nic {
    /// MMIO base address of the register window
    mem_base: PhysicalAddress,
    /// The MAC address words as read out of the EEPROM at attach
    mac_eeprom: [u16; EEPROM_NUM_MAC_WORDS],
    /// Transmit ring with descriptors and packet buffers
    tx_ring: TxRing<E1000_NUM_TX_DESC>,
    /// Receive ring with descriptors and packet buffers
    rx_ring: RxRing<E1000_NUM_RX_DESC>,
    /// memory-mapped general control registers
    regs: &'static mut E1000Registers,
    /// memory-mapped receive queue registers
    rx_regs: &'static mut E1000RxRegisters,
    /// memory-mapped transmit queue registers
    tx_regs: &'static mut E1000TxRegisters,
    /// memory-mapped multicast-table and MAC address registers
    mac_regs: &'static mut E1000MacRegisters,
    /// Registration slot for the consumer waiting on received packets
    rx_wait: Arc<RxWaitCell>,
}

impl core::fmt::Debug for E1000Nic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("E1000Nic")
            .field("mem_base", &self.mem_base)
            .finish_non_exhaustive()
    }
}

impl E1000Nic {
    /// Initializes the e1000 NIC whose register window starts at the given
    /// BAR physical address, and returns the driver value owning it.
    ///
    /// The caller (the bus layer) must already have enabled the device and
    /// its bus mastering; this function performs the order-sensitive
    /// remainder: map registers, bring the link up, read the MAC from the
    /// EEPROM, then program the transmit and receive sides in that order,
    /// since receive-address programming consumes the EEPROM words and both
    /// queues must be fully described to the device before being enabled.
    pub fn init<M: MemoryMapper>(
        mem_base: PhysicalAddress,
        bar_size: usize,
        mapper: &mut M,
        config: Config,
    ) -> Result<E1000Nic, &'static str> {
        if bar_size < REGISTER_WINDOW_SIZE {
            error!("e1000::init(): BAR of {} bytes is smaller than the register window", bar_size);
            return Err("e1000::init(): BAR too small for the e1000 register window");
        }

        let (regs, rx_regs, tx_regs, mac_regs) = Self::map_e1000_regs(mem_base, mapper)?;

        Self::start_link(regs);

        let mac_eeprom = eeprom::read_mac_from_eeprom(regs, config.eeprom_poll_attempts)?;
        debug!("e1000::init(): EEPROM MAC words: {:04x?}", mac_eeprom);

        // ==================== Transmit initialization ====================
        // The ring is created first so its physical location can be
        // programmed into the descriptor base/length registers.
        let tdt_addr = VirtualAddress::new(addr_of!(tx_regs.tx_regs.tdt) as usize);
        let tx_ring = TxRing::new(TailRegister::new(tdt_addr), mapper);

        tx_regs.tx_regs.tdbal.write(tx_ring.base_paddr().value() as u32);
        tx_regs.tx_regs.tdbah.write(0);
        tx_regs.tx_regs.tdlen.write(tx_ring.len_in_bytes());
        tx_regs.tx_regs.tdh.write(0);
        tx_regs.tx_regs.tdt.write(0);

        regs.tctl.write(
            TCTL_EN
            | TCTL_PSP
            | (0x10 << TCTL_CT_SHIFT)
            | (0x40 << TCTL_COLD_SHIFT)
        );
        regs.tipg.write(
            (0xA << TIPG_IPGT_SHIFT)
            | (0x8 << TIPG_IPGR1_SHIFT)
            | (0xC << TIPG_IPGR2_SHIFT)
        );

        // ==================== Receive initialization =====================
        // Publish the MAC into the receive-address registers: the first two
        // EEPROM words packed into RAL, the third plus the valid bit in RAH.
        mac_regs.ral.write((mac_eeprom[0] as u32) | ((mac_eeprom[1] as u32) << 16));
        mac_regs.rah.write((mac_eeprom[2] as u32) | RAH_AV);

        // Multicast filtering is unused; the table must still be zeroed.
        for entry in mac_regs.mta.iter_mut() {
            entry.write(0);
        }

        let rdt_addr = VirtualAddress::new(addr_of!(rx_regs.rx_regs.rdt) as usize);
        let rx_ring = RxRing::new(TailRegister::new(rdt_addr), mapper);

        rx_regs.rx_regs.rdbal.write(rx_ring.base_paddr().value() as u32);
        rx_regs.rx_regs.rdbah.write(0);
        rx_regs.rx_regs.rdlen.write(rx_ring.len_in_bytes());
        rx_regs.rx_regs.rdh.write(0);
        // The tail trails the head by the full ring: every slot except the
        // one the device fills next is receive-ready.
        rx_regs.rx_regs.rdt.write((E1000_NUM_RX_DESC - 1) as u32);

        regs.ims.write(INT_RX);
        // 2048-byte buffers, no loopback, strip the CRC, and leave
        // long-packet reception disabled so one slot always holds a whole
        // frame.
        regs.rctl.write(RCTL_EN | RCTL_LBM_NONE | RCTL_BSIZE_2048 | RCTL_SECRC);

        debug!("e1000::init(): initialized NIC at {}", mem_base);
        Ok(E1000Nic {
            mem_base,
            mac_eeprom,
            tx_ring,
            rx_ring,
            regs,
            rx_regs,
            tx_regs,
            mac_regs,
            rx_wait: Arc::new(RxWaitCell::new()),
        })
    }

    /// Maps the E1000 register structs onto the device's register window.
    /// The window is split into four mappings so that the receive and
    /// transmit queue registers can be handed to their queues separately.
    fn map_e1000_regs<M: MemoryMapper>(
        mem_base: PhysicalAddress,
        mapper: &mut M,
    ) -> Result<(
        &'static mut E1000Registers,
        &'static mut E1000RxRegisters,
        &'static mut E1000TxRegisters,
        &'static mut E1000MacRegisters,
    ), &'static str> {
        let nic_regs = mapper.map_mmio(mem_base, GENERAL_REGISTERS_SIZE_BYTES)?;
        let nic_rx_regs = mapper.map_mmio(
            mem_base + GENERAL_REGISTERS_SIZE_BYTES,
            RX_REGISTERS_SIZE_BYTES,
        )?;
        let nic_tx_regs = mapper.map_mmio(
            mem_base + GENERAL_REGISTERS_SIZE_BYTES + RX_REGISTERS_SIZE_BYTES,
            TX_REGISTERS_SIZE_BYTES,
        )?;
        let nic_mac_regs = mapper.map_mmio(
            mem_base + GENERAL_REGISTERS_SIZE_BYTES + RX_REGISTERS_SIZE_BYTES + TX_REGISTERS_SIZE_BYTES,
            MAC_REGISTERS_SIZE_BYTES,
        )?;

        // The mapper guarantees each window covers the requested size and
        // stays mapped for the lifetime of the device, which is what the
        // 'static on these references means.
        unsafe {
            Ok((
                &mut *nic_regs.cast::<E1000Registers>().as_ptr(),
                &mut *nic_rx_regs.cast::<E1000RxRegisters>().as_ptr(),
                &mut *nic_tx_regs.cast::<E1000TxRegisters>().as_ptr(),
                &mut *nic_mac_regs.cast::<E1000MacRegisters>().as_ptr(),
            ))
        }
    }

    /// Sets the link up.
    fn start_link(regs: &mut E1000Registers) {
        let val = regs.ctrl.read();
        regs.ctrl.write(val | CTRL_SLU);
    }

    /// Queues one frame for transmission. Returns immediately:
    /// `Err(RingFull)` means every transmit slot is still owned by the
    /// device, and it is the caller's job to retry or drop the frame (the
    /// network stack above this driver retries a bounded number of times
    /// and then drops).
    ///
    /// # Panics
    /// If `frame` exceeds [`PKT_BUF_SIZE`] bytes; see [`TxRing::try_submit`].
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), RingFull> {
        self.tx_ring.try_submit(frame)
    }

    /// Copies the next received frame into `dst` and returns its length.
    /// Returns immediately with `Err(RingEmpty)` when no packet is pending;
    /// a caller that would rather block should register with
    /// [`rx_wait_cell`](Self::rx_wait_cell) and yield instead of spinning.
    ///
    /// `dst` must be at least [`PKT_BUF_SIZE`] bytes.
    pub fn receive(&mut self, dst: &mut [u8]) -> Result<usize, RingEmpty> {
        self.rx_ring.try_consume(dst)
    }

    /// The MAC address as currently programmed into the receive-address
    /// registers, not the cached EEPROM words.
    pub fn mac_address(&self) -> [u8; 6] {
        let low = self.mac_regs.ral.read();
        let high = self.mac_regs.rah.read();
        [
            low.get_bits(0..8) as u8,
            low.get_bits(8..16) as u8,
            low.get_bits(16..24) as u8,
            low.get_bits(24..32) as u8,
            high.get_bits(0..8) as u8,
            high.get_bits(8..16) as u8,
        ]
    }

    /// The raw EEPROM words the receive-address registers were programmed
    /// from at attach.
    pub fn eeprom_mac(&self) -> [u16; EEPROM_NUM_MAC_WORDS] {
        self.mac_eeprom
    }

    /// The physical base address of this device's register window.
    pub fn mem_base(&self) -> PhysicalAddress {
        self.mem_base
    }

    /// The device-owned transmit head index, read back for diagnostics.
    pub fn tx_head(&self) -> u32 {
        self.tx_regs.tx_regs.tdh.read()
    }

    /// The device-owned receive head index, read back for diagnostics.
    pub fn rx_head(&self) -> u32 {
        self.rx_regs.rx_regs.rdh.read()
    }

    /// The registration cell a consumer uses to block until received data
    /// is available.
    pub fn rx_wait_cell(&self) -> Arc<RxWaitCell> {
        Arc::clone(&self.rx_wait)
    }

    /// The main interrupt handling routine for the e1000 NIC.
    /// This should be invoked from the actual interrupt handler entry point.
    ///
    /// Wakes the waiting consumer (if one is registered) on a receive-timer
    /// interrupt, then acknowledges the interrupt at both the device
    /// (write-one-to-clear into ICR) and the platform interrupt controller.
    /// The acknowledgements happen whether or not anyone was waiting, or the
    /// device would reassert the interrupt forever.
    pub fn handle_interrupt(&mut self, int_ctlr: &mut dyn InterruptController) {
        let cause = self.regs.icr.read();

        if cause & INT_RX == INT_RX {
            if !self.rx_wait.notify() {
                trace!("e1000::handle_interrupt(): receive interrupt with no waiting consumer");
            }
        } else {
            error!("e1000::handle_interrupt(): unhandled interrupt! cause: {:#X}", cause);
        }

        self.regs.icr.write(INT_RX);
        int_ctlr.eoi();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr::{copy_nonoverlapping, read_volatile, write_volatile, NonNull};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;
    use std::thread::{self, JoinHandle};

    // Register offsets as the device documents them, used by the test-side
    // device model so it observes exactly what hardware would.
    const OFF_CTRL: usize = 0x0;
    const OFF_EERD: usize = 0x14;
    const OFF_ICR: usize = 0xC0;
    const OFF_IMS: usize = 0xD0;
    const OFF_RCTL: usize = 0x100;
    const OFF_TCTL: usize = 0x400;
    const OFF_TIPG: usize = 0x410;
    const OFF_RDBAL: usize = 0x2800;
    const OFF_RDLEN: usize = 0x2808;
    const OFF_RDH: usize = 0x2810;
    const OFF_RDT: usize = 0x2818;
    const OFF_TDBAL: usize = 0x3800;
    const OFF_TDLEN: usize = 0x3808;
    const OFF_TDH: usize = 0x3810;
    const OFF_TDT: usize = 0x3818;
    const OFF_MTA: usize = 0x5200;
    const OFF_RAL: usize = 0x5400;
    const OFF_RAH: usize = 0x5404;

    const TEST_MAC_WORDS: [u16; 3] = [0x1100, 0x3322, 0x5544];

    fn rd(base: usize, off: usize) -> u32 {
        unsafe { read_volatile((base + off) as *const u32) }
    }

    fn wr(base: usize, off: usize, val: u32) {
        unsafe { write_volatile((base + off) as *mut u32, val) }
    }

    /// A zeroed 128 KiB register window standing in for the mapped BAR.
    /// Leaked so the driver's 'static register references stay valid.
    fn alloc_register_window() -> usize {
        let window = vec![0u32; REGISTER_WINDOW_SIZE / 4].into_boxed_slice();
        Box::leak(window).as_mut_ptr() as usize
    }

    /// Identity mapping: the "physical" BAR address of the test window is
    /// its host address, and ring memory translates to itself.
    struct IdentityMapper;

    impl MemoryMapper for IdentityMapper {
        fn map_mmio(
            &mut self,
            paddr: PhysicalAddress,
            _size_in_bytes: usize,
        ) -> Result<NonNull<u8>, &'static str> {
            NonNull::new(paddr.value() as *mut u8).ok_or("null mapping")
        }

        fn virt_to_phys(&self, vaddr: VirtualAddress) -> PhysicalAddress {
            PhysicalAddress::new(vaddr.value())
        }
    }

    /// Services the EERD request/poll protocol the way the device would:
    /// when a read request appears, answer it by setting the done bit and
    /// the requested word in the data field.
    fn spawn_eeprom_model(
        base: usize,
        words: [u16; 3],
        stop: StdArc<AtomicBool>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let eerd = (base + OFF_EERD) as *mut u32;
            while !stop.load(Ordering::Relaxed) {
                let val = unsafe { read_volatile(eerd) };
                if val & EERD_START != 0 && val & EERD_DONE == 0 {
                    let word = ((val >> EERD_ADDR_SHIFT) & 0xFF) as usize;
                    assert!(word < words.len(), "EEPROM read past the MAC words");
                    let data = words[word] as u32;
                    unsafe { write_volatile(eerd, (data << EERD_DATA_SHIFT) | EERD_DONE) };
                }
                thread::yield_now();
            }
        })
    }

    /// Runs the full attach sequence against the given register window,
    /// with the EEPROM model answering the MAC reads.
    fn run_attach(base: usize, words: [u16; 3]) -> Result<E1000Nic, &'static str> {
        let stop = StdArc::new(AtomicBool::new(false));
        let model = spawn_eeprom_model(base, words, StdArc::clone(&stop));
        let nic = E1000Nic::init(
            PhysicalAddress::new(base),
            REGISTER_WINDOW_SIZE,
            &mut IdentityMapper,
            Config { eeprom_poll_attempts: 1_000_000_000 },
        );
        stop.store(true, Ordering::Relaxed);
        model.join().unwrap();
        nic
    }

    fn attach() -> (E1000Nic, usize) {
        let base = alloc_register_window();
        (run_attach(base, TEST_MAC_WORDS).expect("attach failed"), base)
    }

    /// The DMA engine's view of the rings: walks the descriptor arrays
    /// through the base-address registers exactly as the hardware would.
    struct DeviceModel {
        base: usize,
        tx_head: usize,
        rx_head: usize,
    }

    impl DeviceModel {
        fn new(base: usize) -> DeviceModel {
            DeviceModel { base, tx_head: 0, rx_head: 0 }
        }

        /// Consumes every descriptor between the head and TDT, returning
        /// the transmitted frames in order and marking each slot done.
        fn complete_tx(&mut self) -> Vec<Vec<u8>> {
            let tdbal = rd(self.base, OFF_TDBAL) as usize;
            let tdt = rd(self.base, OFF_TDT) as usize;
            let mut frames = Vec::new();
            while self.tx_head != tdt {
                let desc = (tdbal + 16 * self.tx_head) as *mut u8;
                unsafe {
                    let buf = read_volatile(desc as *const u64) as *const u8;
                    let len = read_volatile(desc.add(8) as *const u16) as usize;
                    let status = read_volatile(desc.add(12));
                    assert_eq!(status & 0x1, 0, "driver published a slot it still owns");
                    let mut frame = vec![0u8; len];
                    copy_nonoverlapping(buf, frame.as_mut_ptr(), len);
                    write_volatile(desc.add(12), status | 0x1);
                    frames.push(frame);
                }
                self.tx_head = (self.tx_head + 1) % 32;
            }
            frames
        }

        /// Fills the next receive slot with `frame` and flags it DD+EOP.
        fn deliver(&mut self, frame: &[u8]) {
            let rdbal = rd(self.base, OFF_RDBAL) as usize;
            let desc = (rdbal + 16 * self.rx_head) as *mut u8;
            unsafe {
                let buf = read_volatile(desc as *const u64) as *mut u8;
                copy_nonoverlapping(frame.as_ptr(), buf, frame.len());
                write_volatile(desc.add(8) as *mut u16, frame.len() as u16);
                write_volatile(desc.add(12), 0x1 | 0x2);
            }
            self.rx_head = (self.rx_head + 1) % 128;
        }
    }

    struct CountingWaker(AtomicUsize);

    impl nic_platform::RxWaker for CountingWaker {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingIntCtlr(usize);

    impl InterruptController for CountingIntCtlr {
        fn eoi(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn register_struct_offsets() {
        use memoffset::offset_of;
        assert_eq!(offset_of!(E1000Registers, ctrl), OFF_CTRL);
        assert_eq!(offset_of!(E1000Registers, status), 0x8);
        assert_eq!(offset_of!(E1000Registers, eerd), OFF_EERD);
        assert_eq!(offset_of!(E1000Registers, icr), OFF_ICR);
        assert_eq!(offset_of!(E1000Registers, ims), OFF_IMS);
        assert_eq!(offset_of!(E1000Registers, rctl), OFF_RCTL);
        assert_eq!(offset_of!(E1000Registers, tctl), OFF_TCTL);
        assert_eq!(offset_of!(E1000Registers, tipg), OFF_TIPG);
        assert_eq!(offset_of!(E1000RxRegisters, rx_regs), OFF_RDBAL - 0x2000);
        assert_eq!(offset_of!(E1000TxRegisters, tx_regs), OFF_TDBAL - 0x3000);
        assert_eq!(offset_of!(RegistersRx, rdh), OFF_RDH - OFF_RDBAL);
        assert_eq!(offset_of!(RegistersRx, rdt), OFF_RDT - OFF_RDBAL);
        assert_eq!(offset_of!(RegistersTx, tdh), OFF_TDH - OFF_TDBAL);
        assert_eq!(offset_of!(RegistersTx, tdt), OFF_TDT - OFF_TDBAL);
        assert_eq!(offset_of!(E1000MacRegisters, mta), OFF_MTA - 0x4000);
        assert_eq!(offset_of!(E1000MacRegisters, ral), OFF_RAL - 0x4000);
        assert_eq!(offset_of!(E1000MacRegisters, rah), OFF_RAH - 0x4000);
    }

    #[test]
    fn attach_programs_the_device() {
        let base = alloc_register_window();
        // Pre-dirty everything attach must zero or overwrite.
        wr(base, OFF_TDH, 5);
        wr(base, OFF_RDH, 7);
        wr(base, OFF_RDT, 9);
        wr(base, OFF_MTA + 4 * 64, 0xDEAD_BEEF);

        let nic = run_attach(base, TEST_MAC_WORDS).expect("attach failed");

        assert_ne!(rd(base, OFF_CTRL) & CTRL_SLU, 0);

        // Transmit side.
        assert_eq!(
            rd(base, OFF_TCTL),
            TCTL_EN | TCTL_PSP | (0x10 << TCTL_CT_SHIFT) | (0x40 << TCTL_COLD_SHIFT)
        );
        assert_eq!(
            rd(base, OFF_TIPG),
            (0xA << TIPG_IPGT_SHIFT) | (0x8 << TIPG_IPGR1_SHIFT) | (0xC << TIPG_IPGR2_SHIFT)
        );
        let tdbal = rd(base, OFF_TDBAL);
        assert_ne!(tdbal, 0);
        assert_eq!(tdbal % 16, 0);
        assert_eq!(rd(base, OFF_TDLEN), 32 * 16);
        assert_eq!(rd(base, OFF_TDH), 0);
        assert_eq!(rd(base, OFF_TDT), 0);

        // Receive side.
        assert_eq!(rd(base, OFF_RAL), 0x3322_1100);
        assert_eq!(rd(base, OFF_RAH), 0x5544 | RAH_AV);
        for i in 0..128 {
            assert_eq!(rd(base, OFF_MTA + 4 * i), 0, "MTA[{}] not zeroed", i);
        }
        let rdbal = rd(base, OFF_RDBAL);
        assert_ne!(rdbal, 0);
        assert_eq!(rdbal % 16, 0);
        assert_eq!(rd(base, OFF_RDLEN), 128 * 16);
        assert_eq!(rd(base, OFF_RDH), 0);
        assert_eq!(rd(base, OFF_RDT), 127);
        assert_eq!(rd(base, OFF_IMS), 0x80);
        assert_eq!(rd(base, OFF_RCTL), RCTL_EN | RCTL_SECRC);

        assert_eq!(nic.eeprom_mac(), TEST_MAC_WORDS);
        assert_eq!(nic.tx_head(), 0);
        assert_eq!(nic.rx_head(), 0);
    }

    #[test]
    fn mac_address_round_trips_through_registers() {
        let (nic, _base) = attach();
        assert_eq!(nic.mac_address(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn attach_fails_on_undersized_bar() {
        let base = alloc_register_window();
        let err = E1000Nic::init(
            PhysicalAddress::new(base),
            REGISTER_WINDOW_SIZE - 1,
            &mut IdentityMapper,
            Config::default(),
        )
        .unwrap_err();
        assert!(err.contains("BAR"));
    }

    #[test]
    fn attach_fails_when_eeprom_never_completes() {
        // No EEPROM model servicing the window: the bounded poll must give
        // up instead of spinning forever.
        let base = alloc_register_window();
        let err = E1000Nic::init(
            PhysicalAddress::new(base),
            REGISTER_WINDOW_SIZE,
            &mut IdentityMapper,
            Config { eeprom_poll_attempts: 1000 },
        )
        .unwrap_err();
        assert!(err.contains("EEPROM"));
    }

    #[test]
    fn loopback_is_fifo_and_byte_exact() {
        let (mut nic, base) = attach();
        let mut dev = DeviceModel::new(base);

        // Nothing delivered yet.
        let mut dst = [0u8; PKT_BUF_SIZE];
        assert_eq!(nic.receive(&mut dst), Err(RingEmpty));

        let frames: Vec<Vec<u8>> = (0..8u8)
            .map(|i| (0..60 + 7 * i as usize).map(|b| b as u8 ^ (i * 31)).collect())
            .collect();
        for frame in &frames {
            nic.transmit(frame).unwrap();
        }

        let sent = dev.complete_tx();
        assert_eq!(sent, frames);

        for frame in &sent {
            dev.deliver(frame);
        }
        for frame in &frames {
            let len = nic.receive(&mut dst).unwrap();
            assert_eq!(&dst[..len], &frame[..]);
        }
        assert_eq!(nic.receive(&mut dst), Err(RingEmpty));
    }

    #[test]
    fn transmit_backpressure_until_device_catches_up() {
        let (mut nic, base) = attach();
        let mut dev = DeviceModel::new(base);

        for i in 0..32u8 {
            nic.transmit(&[i; 60]).unwrap();
        }
        assert_eq!(nic.transmit(&[0xFF; 60]), Err(RingFull));
        assert_eq!(rd(base, OFF_TDT), 0);

        let drained = dev.complete_tx();
        assert_eq!(drained.len(), 32);
        nic.transmit(&[0xFF; 60]).unwrap();
        assert_eq!(rd(base, OFF_TDT), 1);
    }

    #[test]
    fn rx_interrupt_wakes_the_one_waiter_and_acks_once() {
        let (mut nic, base) = attach();
        let waker = StdArc::new(CountingWaker(AtomicUsize::new(0)));
        let mut int_ctlr = CountingIntCtlr(0);

        let cell = nic.rx_wait_cell();
        cell.register(waker.clone()).unwrap();
        // Only one consumer may wait at a time.
        assert!(cell.register(waker.clone()).is_err());

        // The device raises the receive-timer interrupt (alongside an
        // unrelated cause bit, which must not confuse the ack).
        wr(base, OFF_ICR, INT_RX | 0x4);
        nic.handle_interrupt(&mut int_ctlr);

        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
        assert_eq!(int_ctlr.0, 1);
        // Exactly the receive-timer cause was written back to ICR.
        assert_eq!(rd(base, OFF_ICR), INT_RX);
        // The waiting flag was cleared, so a consumer may register again.
        cell.register(waker.clone()).unwrap();
    }

    #[test]
    fn rx_interrupt_with_no_waiter_still_acks() {
        let (mut nic, base) = attach();
        let mut int_ctlr = CountingIntCtlr(0);
        wr(base, OFF_ICR, INT_RX);
        nic.handle_interrupt(&mut int_ctlr);
        assert_eq!(int_ctlr.0, 1);
        assert_eq!(rd(base, OFF_ICR), INT_RX);
    }
}
