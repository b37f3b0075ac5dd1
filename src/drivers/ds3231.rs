//! Maxim DS3231 battery-backed RTC.
//!
//! Time registers 0x00..=0x06 are BCD.  The chip keeps whatever wall time
//! it was set to; this firmware stores local time.  The century bit in the
//! month register extends the two-digit year past 2099.

use embedded_hal::i2c::I2c;

use crate::clock::calendar::CalendarTime;
use crate::error::ClockError;

pub const DS3231_ADDR: u8 = 0x68;

const REG_SECONDS: u8 = 0x00;
const REG_CONTROL: u8 = 0x0E;
const REG_STATUS: u8 = 0x0F;

const CONTROL_INTCN: u8 = 1 << 2;
const CONTROL_RS_MASK: u8 = 0b0001_1000;
const STATUS_OSF: u8 = 1 << 7;
const STATUS_EN32KHZ: u8 = 1 << 3;

const HOUR_12H: u8 = 1 << 6;
const HOUR_PM: u8 = 1 << 5;
const MONTH_CENTURY: u8 = 1 << 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ds3231Error<E> {
    I2c(E),
    /// Registers decoded to something that is not a calendar time.
    BadRegisters,
}

impl<E> From<Ds3231Error<E>> for ClockError {
    fn from(e: Ds3231Error<E>) -> Self {
        match e {
            Ds3231Error::I2c(_) => ClockError::Unavailable,
            Ds3231Error::BadRegisters => ClockError::InvalidCalendar,
        }
    }
}

pub struct Ds3231<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds3231<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Whether the chip answers on the bus at all.
    pub fn probe(&mut self) -> bool {
        self.read_register(REG_STATUS).is_ok()
    }

    pub fn read_calendar(&mut self) -> Result<CalendarTime, Ds3231Error<I2C::Error>> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(DS3231_ADDR, &[REG_SECONDS], &mut regs)
            .map_err(Ds3231Error::I2c)?;
        decode_time(&regs).ok_or(Ds3231Error::BadRegisters)
    }

    pub fn set_calendar(&mut self, cal: &CalendarTime) -> Result<(), Ds3231Error<I2C::Error>> {
        let regs = encode_time(cal).ok_or(Ds3231Error::BadRegisters)?;
        let mut frame = [0u8; 8];
        frame[0] = REG_SECONDS;
        frame[1..].copy_from_slice(&regs);
        self.i2c.write(DS3231_ADDR, &frame).map_err(Ds3231Error::I2c)?;
        // Setting the time is what makes the oscillator flag meaningful again.
        let status = self.read_register(REG_STATUS)?;
        self.write_register(REG_STATUS, status & !STATUS_OSF)
    }

    /// Oscillator-stop flag: the chip lost power and its time is garbage.
    pub fn lost_power(&mut self) -> Result<bool, Ds3231Error<I2C::Error>> {
        Ok(self.read_register(REG_STATUS)? & STATUS_OSF != 0)
    }

    /// Turn off the 32 kHz output and the square wave.  Neither pin is
    /// wired and both add bus noise next to the SCD41.
    pub fn quiet_outputs(&mut self) -> Result<(), Ds3231Error<I2C::Error>> {
        let status = self.read_register(REG_STATUS)?;
        self.write_register(REG_STATUS, status & !STATUS_EN32KHZ)?;
        let control = self.read_register(REG_CONTROL)?;
        self.write_register(REG_CONTROL, (control | CONTROL_INTCN) & !CONTROL_RS_MASK)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Ds3231Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(DS3231_ADDR, &[reg], &mut buf)
            .map_err(Ds3231Error::I2c)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Ds3231Error<I2C::Error>> {
        self.i2c
            .write(DS3231_ADDR, &[reg, value])
            .map_err(Ds3231Error::I2c)
    }
}

fn bcd_to_bin(v: u8) -> Option<u8> {
    let (hi, lo) = (v >> 4, v & 0x0F);
    (hi <= 9 && lo <= 9).then_some(hi * 10 + lo)
}

fn bin_to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

/// Registers 0x00..=0x06 to calendar fields.  Range-checks each field but
/// leaves day-of-month validity to [`CalendarTime::to_epoch`].
pub(crate) fn decode_time(regs: &[u8; 7]) -> Option<CalendarTime> {
    let second = bcd_to_bin(regs[0] & 0x7F)?;
    let minute = bcd_to_bin(regs[1] & 0x7F)?;
    let hour = if regs[2] & HOUR_12H != 0 {
        let h12 = bcd_to_bin(regs[2] & 0x1F)?;
        if !(1..=12).contains(&h12) {
            return None;
        }
        let pm = regs[2] & HOUR_PM != 0;
        (h12 % 12) + if pm { 12 } else { 0 }
    } else {
        bcd_to_bin(regs[2] & 0x3F)?
    };
    // regs[3] is the day of week; the date fields carry everything needed.
    let day = bcd_to_bin(regs[4] & 0x3F)?;
    let month = bcd_to_bin(regs[5] & 0x1F)?;
    let century: u16 = if regs[5] & MONTH_CENTURY != 0 { 2100 } else { 2000 };
    let year = century + u16::from(bcd_to_bin(regs[6])?);

    let in_range = second < 60
        && minute < 60
        && hour < 24
        && (1..=31).contains(&day)
        && (1..=12).contains(&month);
    in_range.then_some(CalendarTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Calendar fields to registers (24 h mode).  Only 2000..=2199 fits.
pub(crate) fn encode_time(cal: &CalendarTime) -> Option<[u8; 7]> {
    if !(2000..=2199).contains(&cal.year) {
        return None;
    }
    let weekday = cal.weekday()?;
    let (century, yy) = if cal.year >= 2100 {
        (MONTH_CENTURY, cal.year - 2100)
    } else {
        (0, cal.year - 2000)
    };
    Some([
        bin_to_bcd(cal.second),
        bin_to_bcd(cal.minute),
        bin_to_bcd(cal.hour),
        weekday,
        bin_to_bcd(cal.day),
        bin_to_bcd(cal.month) | century,
        bin_to_bcd(yy as u8),
    ])
}
