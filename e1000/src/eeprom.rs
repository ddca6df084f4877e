//! One-shot read of the factory-programmed MAC address out of the EEPROM.

use core::hint::spin_loop;

use crate::regs::{E1000Registers, EERD_ADDR_SHIFT, EERD_DATA_SHIFT, EERD_DONE, EERD_START};

/// The MAC address occupies the first 3 16-bit words of the EEPROM.
pub const EEPROM_NUM_MAC_WORDS: usize = 3;

/// Reads the NIC's MAC address from the EEPROM, one 16-bit word at a time.
///
/// For each word this writes the address-shift-encoded word index together
/// with the start-read flag into EERD, then polls EERD until the device
/// reports completion. Completion is polled at most `poll_attempts` times per
/// word; the device normally answers within a handful of reads, so running
/// out means the device is absent or wedged and an error is returned rather
/// than spinning forever.
///
/// Runs during attach, before the receive-address registers are programmed
/// from the returned words.
pub fn read_mac_from_eeprom(
    regs: &mut E1000Registers,
    poll_attempts: usize,
) -> Result<[u16; EEPROM_NUM_MAC_WORDS], &'static str> {
    let mut mac = [0u16; EEPROM_NUM_MAC_WORDS];

    for (word, dest) in mac.iter_mut().enumerate() {
        regs.eerd.write(((word as u32) << EERD_ADDR_SHIFT) | EERD_START);

        let mut val = regs.eerd.read();
        let mut attempts = 0;
        while val & EERD_DONE == 0 {
            attempts += 1;
            if attempts >= poll_attempts {
                return Err("e1000: EEPROM read did not complete");
            }
            spin_loop();
            val = regs.eerd.read();
        }
        *dest = (val >> EERD_DATA_SHIFT) as u16;

        // The register must be cleared between words,
        // or the device keeps returning the previous value.
        regs.eerd.write(0);
    }

    Ok(mac)
}
