//! Bus scan diagnostic: which 7-bit addresses ACK an empty write.

use core::fmt::Write;

use embedded_hal::i2c::I2c;

/// Every non-reserved 7-bit address fits.
pub type ScanResult = heapless::Vec<u8, 128>;

/// Probe addresses `0x01..=0x7E` and collect the ones that answer.
pub fn scan<I: I2c>(bus: &mut I) -> ScanResult {
    let mut found = ScanResult::new();
    for addr in 1u8..0x7F {
        if bus.write(addr, &[]).is_ok() {
            // Capacity is 128, the loop visits 126 addresses.
            let _ = found.push(addr);
        }
    }
    found
}

/// Human-readable report for one bus:
///
/// ```text
/// [I2C] Scanning Bus1 (21/22)...
///   Found 0x62
///   Found 0x68
/// ```
pub fn render(bus_label: &str, found: &[u8]) -> String {
    let mut out = String::with_capacity(32 + found.len() * 14);
    let _ = writeln!(out, "[I2C] Scanning {bus_label}...");
    for addr in found {
        let _ = writeln!(out, "  Found 0x{addr:02X}");
    }
    out
}
