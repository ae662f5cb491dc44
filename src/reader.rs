//! The bounds-checked reader the section checkers are built on.
//!
//! [`ReadCtx`] is a sliding cursor over one debug section. A failed read
//! never advances the cursor and never touches bytes past the window end,
//! so a checker can report the failure with the cursor still pointing at
//! the offending offset. Sub-cursors narrow the window without copying;
//! compilation units use them so that unit-local offsets come out right.
//!
//! LEB128 decoding is done here rather than with a decoding crate because
//! the checker cares about more than the value: an encoding that spends a
//! whole extra byte group on sign-fill payload is flagged as bloat, and
//! anything past ten groups is refused outright.

use std::error;
use std::fmt::{self, Debug};
use std::io::Write;
use std::result;

use crate::common::Format;
use crate::endianity::Endianity;
use crate::message::{Reporter, MC_ACC_BLOAT, MC_IMPACT_3, MC_LEB128};

/// A structural defect that is fatal to the unit being parsed.
///
/// Everything that can be reported and parsed past goes through the
/// [`Reporter`](crate::message::Reporter) instead and does not surface
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Hit the end of the section window before it was expected.
    UnexpectedEof,
    /// An unsigned LEB128 value was truncated or overflowed 64 bits.
    BadUnsignedLeb128,
    /// A signed LEB128 value was truncated or ran past ten byte groups.
    BadSignedLeb128,
    /// An initial length field used an escape value this checker does not
    /// know.
    UnknownLengthEscape(u32),
    /// The unit version is outside the supported range.
    UnknownVersion(u16),
    /// An abbreviation tag above `DW_TAG_hi_user`.
    InvalidTag,
    /// An abbreviation has-children byte that is neither 0 nor 1.
    InvalidHasChildren(u8),
    /// An attribute name above `DW_AT_hi_user`.
    InvalidAttributeName,
    /// An attribute form of zero or above `DW_FORM_indirect`.
    InvalidAttributeForm,
    /// `DW_FORM_indirect` resolved to `DW_FORM_indirect` again.
    IndirectFormCycle,
    /// A DIE used an abbreviation code its table does not declare.
    UnknownAbbreviation(u64),
    /// A read width other than 1, 2, 4, or 8 bytes.
    UnsupportedAddressSize(u8),
}

impl Error {
    /// A short description of the error.
    pub fn description(&self) -> &str {
        match *self {
            Error::UnexpectedEof => "Hit the end of the section window before it was expected",
            Error::BadUnsignedLeb128 => {
                "An unsigned LEB128 value was truncated or overflowed 64 bits"
            }
            Error::BadSignedLeb128 => {
                "A signed LEB128 value was truncated or ran past ten byte groups"
            }
            Error::UnknownLengthEscape(_) => "Found an unknown initial length escape value",
            Error::UnknownVersion(_) => "The unit version is outside the supported range",
            Error::InvalidTag => "Found an abbreviation tag above DW_TAG_hi_user",
            Error::InvalidHasChildren(_) => {
                "The abbreviation's has-children byte was neither 0 nor 1"
            }
            Error::InvalidAttributeName => "Found an attribute name above DW_AT_hi_user",
            Error::InvalidAttributeForm => {
                "Found an attribute form of zero or above DW_FORM_indirect"
            }
            Error::IndirectFormCycle => "DW_FORM_indirect resolved to DW_FORM_indirect again",
            Error::UnknownAbbreviation(_) => {
                "A DIE used an abbreviation code its table does not declare"
            }
            Error::UnsupportedAddressSize(_) => "The read width is not supported",
        }
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl error::Error for Error {}

/// The result of a parse; `Err` aborts the current structural unit.
pub type Result<T> = result::Result<T, Error>;

/// The DWARF64 initial length escape.
pub const DWARF64_LENGTH: u32 = 0xffff_ffff;
/// The smallest reserved initial length value.
pub const LENGTH_ESCAPE_LO: u32 = 0xffff_ff00;

/// A bounds-checked cursor over (a window of) one section's bytes.
///
/// Positions handed across the API are absolute indices into the whole
/// section slice; [`ReadCtx::offset`] is relative to the window start, so
/// a sub-cursor opened at a unit boundary yields unit-local offsets.
#[derive(Debug, Clone)]
pub struct ReadCtx<'input, Endian>
where
    Endian: Endianity,
{
    data: &'input [u8],
    endian: Endian,
    begin: usize,
    end: usize,
    pos: usize,
}

impl<'input, Endian> ReadCtx<'input, Endian>
where
    Endian: Endianity,
{
    /// Construct a cursor over a whole section.
    pub fn new(data: &'input [u8], endian: Endian) -> ReadCtx<'input, Endian> {
        ReadCtx {
            data,
            endian,
            begin: 0,
            end: data.len(),
            pos: 0,
        }
    }

    /// Narrow to the absolute window `[begin, end)` without copying. The
    /// new cursor starts at `begin`.
    pub fn sub(&self, begin: usize, end: usize) -> ReadCtx<'input, Endian> {
        assert!(begin <= end && end <= self.data.len());
        ReadCtx {
            data: self.data,
            endian: self.endian,
            begin,
            end,
            pos: begin,
        }
    }

    /// Move to an absolute position inside the window.
    pub fn seek(&mut self, pos: usize) {
        assert!(self.begin <= pos && pos <= self.end);
        self.pos = pos;
    }

    /// The absolute position of the cursor.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The cursor position relative to the window start.
    #[inline]
    pub fn offset(&self) -> u64 {
        (self.pos - self.begin) as u64
    }

    /// The window length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        (self.end - self.begin) as u64
    }

    /// True when the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// True when at least `count` more bytes remain before the window end.
    #[inline]
    pub fn need(&self, count: u64) -> bool {
        (self.end - self.pos) as u64 >= count
    }

    /// True when no bytes remain.
    #[inline]
    pub fn eof(&self) -> bool {
        self.pos == self.end
    }

    /// Give up on the rest of the window.
    pub fn skip_to_end(&mut self) {
        self.pos = self.end;
    }

    /// Advance past `count` bytes without looking at them.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        if !self.need(count) {
            return Err(Error::UnexpectedEof);
        }
        self.pos += count as usize;
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        if !self.need(1) {
            return Err(Error::UnexpectedEof);
        }
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Read an unaligned, endian-aware 16 bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        if !self.need(2) {
            return Err(Error::UnexpectedEof);
        }
        let val = self.endian.read_u16(&self.data[self.pos..]);
        self.pos += 2;
        Ok(val)
    }

    /// Read an unaligned, endian-aware 32 bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        if !self.need(4) {
            return Err(Error::UnexpectedEof);
        }
        let val = self.endian.read_u32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(val)
    }

    /// Read an unaligned, endian-aware 64 bit integer.
    pub fn read_u64(&mut self) -> Result<u64> {
        if !self.need(8) {
            return Err(Error::UnexpectedEof);
        }
        let val = self.endian.read_u64(&self.data[self.pos..]);
        self.pos += 8;
        Ok(val)
    }

    /// Read a format-sized offset: 8 bytes under DWARF64, else 4,
    /// zero-extended.
    pub fn read_offset(&mut self, format: Format) -> Result<u64> {
        match format {
            Format::Dwarf32 => self.read_u32().map(u64::from),
            Format::Dwarf64 => self.read_u64(),
        }
    }

    /// Read an unsigned quantity of the given byte width, zero-extended.
    pub fn read_var(&mut self, width: u8) -> Result<u64> {
        match width {
            1 => self.read_u8().map(u64::from),
            2 => self.read_u16().map(u64::from),
            4 => self.read_u32().map(u64::from),
            8 => self.read_u64(),
            _ => Err(Error::UnsupportedAddressSize(width)),
        }
    }

    /// Read an unsigned LEB128 value.
    ///
    /// The boolean is true when the encoding wasted its final byte group
    /// on zero payload, i.e. the value was encoded longer than necessary.
    /// Encodings that are truncated, carry payload past 64 bits, or
    /// continue past ten groups are refused with the cursor restored.
    pub fn read_uleb128(&mut self) -> Result<(u64, bool)> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        let mut bloat = false;

        loop {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.pos = start;
                    return Err(e);
                }
            };

            let payload = byte & 0x7f;
            if shift == 63 && payload > 1 {
                self.pos = start;
                return Err(Error::BadUnsignedLeb128);
            }
            bloat = payload == 0 && shift > 0;
            result |= u64::from(payload) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 63 {
                self.pos = start;
                return Err(Error::BadUnsignedLeb128);
            }
        }

        Ok((result, bloat))
    }

    /// Read a signed LEB128 value.
    ///
    /// The boolean is true when the final byte group only repeats the
    /// sign fill of the group before it (`0x7f` payload for negative
    /// values, `0x00` for non-negative ones).
    pub fn read_sleb128(&mut self) -> Result<(i64, bool)> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        let mut sign = false;
        let mut bloat = false;

        loop {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.pos = start;
                    return Err(e);
                }
            };

            let payload = byte & 0x7f;
            bloat = shift > 0 && ((payload == 0x7f && sign) || (payload == 0 && !sign));
            sign = byte & 0x40 != 0;
            result |= u64::from(payload) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 64 && sign {
                    result |= !0u64 << shift;
                }
                break;
            }
            if shift > 63 {
                self.pos = start;
                return Err(Error::BadSignedLeb128);
            }
        }

        Ok((result as i64, bloat))
    }

    /// If every remaining byte of the window is zero, consume them all and
    /// return the window-relative range `(start, end)` they spanned;
    /// otherwise leave the cursor where it was. An empty remainder is
    /// vacuously zero padding, so a caller that has just consumed a zero
    /// length word flush with the window end still gets its padding
    /// outcome.
    pub fn take_zero_padding(&mut self) -> Option<(u64, u64)> {
        let start = self.pos;
        if self.data[start..self.end].iter().any(|&byte| byte != 0) {
            return None;
        }
        self.pos = self.end;
        Some(((start - self.begin) as u64, self.len()))
    }

}

/// Read a ULEB128, routing the outcome through the reporter: truncation
/// and overflow become a `can't read` error, a wasteful encoding becomes
/// a leb128 bloat message, and the value passes through otherwise.
pub fn checked_uleb128<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    report: &mut Reporter<W>,
    whence: &str,
    what: &str,
) -> Result<u64>
where
    Endian: Endianity,
    W: Write,
{
    match ctx.read_uleb128() {
        Ok((value, false)) => Ok(value),
        Ok((value, true)) => {
            report.message(
                MC_LEB128 | MC_ACC_BLOAT | MC_IMPACT_3,
                &format!("{}: unnecessarily long encoding of {}.", whence, what),
            );
            Ok(value)
        }
        Err(e) => {
            report.error(&format!("{}: can't read {}.", whence, what));
            Err(e)
        }
    }
}

/// [`checked_uleb128`], for signed values.
pub fn checked_sleb128<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    report: &mut Reporter<W>,
    whence: &str,
    what: &str,
) -> Result<i64>
where
    Endian: Endianity,
    W: Write,
{
    match ctx.read_sleb128() {
        Ok((value, false)) => Ok(value),
        Ok((value, true)) => {
            report.message(
                MC_LEB128 | MC_ACC_BLOAT | MC_IMPACT_3,
                &format!("{}: unnecessarily long encoding of {}.", whence, what),
            );
            Ok(value)
        }
        Err(e) => {
            report.error(&format!("{}: can't read {}.", whence, what));
            Err(e)
        }
    }
}

/// Decode the tail of an initial length field whose leading 32-bit word
/// `size32` has already been read: `0xffff_ffff` selects DWARF64 and an
/// 8-byte length follows, the rest of the reserved range is refused, and
/// anything else is a DWARF32 length as-is.
pub fn read_size_extra<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    size32: u32,
    report: &mut Reporter<W>,
    whence: &str,
) -> Result<(u64, Format)>
where
    Endian: Endianity,
    W: Write,
{
    if size32 == DWARF64_LENGTH {
        match ctx.read_u64() {
            Ok(size) => Ok((size, Format::Dwarf64)),
            Err(e) => {
                report.error(&format!("{}: can't read 64-bit unit length.", whence));
                Err(e)
            }
        }
    } else if size32 >= LENGTH_ESCAPE_LO {
        report.error(&format!(
            "{}: unrecognized unit length escape value: {:#x}.",
            whence, size32
        ));
        Err(Error::UnknownLengthEscape(size32))
    } else {
        Ok((u64::from(size32), Format::Dwarf32))
    }
}

/// Read and gate a unit version: 2 and 3 pass, anything else is fatal.
/// A 64-bit unit claiming version 2 is reported (DWARF64 only exists
/// since version 3) but parsing continues.
pub fn read_version<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    format: Format,
    report: &mut Reporter<W>,
    whence: &str,
) -> Result<u16>
where
    Endian: Endianity,
    W: Write,
{
    let version = match ctx.read_u16() {
        Ok(version) => version,
        Err(e) => {
            report.error(&format!("{}: can't read version.", whence));
            return Err(e);
        }
    };

    if version < 2 {
        report.error(&format!("{}: invalid version {}.", whence, version));
        return Err(Error::UnknownVersion(version));
    }
    if version > 3 {
        report.error(&format!("{}: unsupported version {}.", whence, version));
        return Err(Error::UnknownVersion(version));
    }
    if version == 2 && format == Format::Dwarf64 {
        // A standard violation, but the unit is still readable.
        report.error(&format!("{}: invalid 64-bit unit in DWARF 2 format.", whence));
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endianity::{BigEndian, LittleEndian};
    use crate::message::Reporter;

    #[test]
    fn test_fixed_width_reads() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_u8(), Ok(0x01));
        assert_eq!(ctx.read_u16(), Ok(0x0302));
        assert_eq!(ctx.read_u32(), Ok(0x0706_0504));
        assert_eq!(ctx.offset(), 7);
        assert_eq!(ctx.read_u16(), Err(Error::UnexpectedEof));
        // A failed read does not advance.
        assert_eq!(ctx.offset(), 7);
        assert_eq!(ctx.read_u8(), Ok(0x08));
        assert!(ctx.eof());

        let mut ctx = ReadCtx::new(&buf, BigEndian);
        assert_eq!(ctx.read_u64(), Ok(0x0102_0304_0506_0708));
    }

    #[test]
    fn test_read_offset() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_offset(Format::Dwarf32), Ok(0x0403_0201));
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_offset(Format::Dwarf64), Ok(0x0807_0605_0403_0201));
    }

    #[test]
    fn test_read_var() {
        let buf = [0xff, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_var(1), Ok(0xff));
        assert_eq!(ctx.read_var(2), Ok(0x0201));
        assert_eq!(ctx.read_var(4), Ok(0x0605_0403));
        assert_eq!(ctx.read_var(8), Err(Error::UnexpectedEof));
        assert_eq!(ctx.read_var(3), Err(Error::UnsupportedAddressSize(3)));
        assert_eq!(ctx.read_var(2), Ok(0x0807));
    }

    #[test]
    fn test_sub_reader_offsets() {
        let buf = [0xaa, 0xbb, 0xcc, 0xdd, 0xee];
        let ctx = ReadCtx::new(&buf, LittleEndian);
        let mut sub = ctx.sub(1, 4);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.offset(), 0);
        assert_eq!(sub.read_u8(), Ok(0xbb));
        assert_eq!(sub.offset(), 1);
        assert_eq!(sub.pos(), 2);
        sub.seek(4);
        assert!(sub.eof());
    }

    #[test]
    fn test_skip_and_need() {
        let buf = [0u8; 4];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert!(ctx.need(0));
        assert!(ctx.need(4));
        assert!(!ctx.need(5));
        assert_eq!(ctx.skip(2), Ok(()));
        assert_eq!(ctx.skip(3), Err(Error::UnexpectedEof));
        assert_eq!(ctx.offset(), 2);
        assert_eq!(ctx.skip(2), Ok(()));
        assert!(ctx.eof());
    }

    #[test]
    fn test_uleb128_clean() {
        let mut ctx = ReadCtx::new(&[0x7f, 0x00], LittleEndian);
        assert_eq!(ctx.read_uleb128(), Ok((0x7f, false)));
        assert_eq!(ctx.read_uleb128(), Ok((0, false)));

        let mut ctx = ReadCtx::new(&[0xe5, 0x8e, 0x26], LittleEndian);
        assert_eq!(ctx.read_uleb128(), Ok((624485, false)));
    }

    #[test]
    fn test_uleb128_bloat_tail() {
        // Value 1, encoded with a wasted trailing group.
        let mut ctx = ReadCtx::new(&[0x81, 0x00], LittleEndian);
        assert_eq!(ctx.read_uleb128(), Ok((1, true)));

        // Zero with two wasted groups.
        let mut ctx = ReadCtx::new(&[0x80, 0x80, 0x00], LittleEndian);
        assert_eq!(ctx.read_uleb128(), Ok((0, true)));
    }

    #[test]
    fn test_uleb128_truncated() {
        let mut ctx = ReadCtx::new(&[0x80, 0x80], LittleEndian);
        assert_eq!(ctx.read_uleb128(), Err(Error::UnexpectedEof));
        assert_eq!(ctx.offset(), 0);
    }

    #[test]
    fn test_uleb128_max_and_overflow() {
        // u64::MAX in exactly ten groups.
        let max = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut ctx = ReadCtx::new(&max, LittleEndian);
        assert_eq!(ctx.read_uleb128(), Ok((u64::MAX, false)));

        // Tenth group carries payload past bit 63.
        let over = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        let mut ctx = ReadCtx::new(&over, LittleEndian);
        assert_eq!(ctx.read_uleb128(), Err(Error::BadUnsignedLeb128));
        assert_eq!(ctx.offset(), 0);

        // An eleventh group is refused no matter what it holds.
        let long = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut ctx = ReadCtx::new(&long, LittleEndian);
        assert_eq!(ctx.read_uleb128(), Err(Error::BadUnsignedLeb128));
        assert_eq!(ctx.offset(), 0);
    }

    #[test]
    fn test_sleb128_values() {
        let mut ctx = ReadCtx::new(&[0x7f], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Ok((-1, false)));

        let mut ctx = ReadCtx::new(&[0x3f], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Ok((0x3f, false)));

        // -128 needs two groups: 0x80 0x7f.
        let mut ctx = ReadCtx::new(&[0x80, 0x7f], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Ok((-128, false)));
    }

    #[test]
    fn test_sleb128_bloat_tail() {
        // -1 with a wasted sign-fill group.
        let mut ctx = ReadCtx::new(&[0xff, 0x7f], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Ok((-1, true)));

        // 1 with a wasted zero group.
        let mut ctx = ReadCtx::new(&[0x81, 0x00], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Ok((1, true)));
    }

    #[test]
    fn test_sleb128_truncated() {
        let mut ctx = ReadCtx::new(&[0xff], LittleEndian);
        assert_eq!(ctx.read_sleb128(), Err(Error::UnexpectedEof));
        assert_eq!(ctx.offset(), 0);
    }

    #[test]
    fn test_take_zero_padding() {
        let buf = [0x01, 0x00, 0x00, 0x00];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_u8(), Ok(0x01));
        assert_eq!(ctx.take_zero_padding(), Some((1, 4)));
        assert!(ctx.eof());

        let buf = [0x00, 0x00, 0xab];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.take_zero_padding(), None);
        assert_eq!(ctx.offset(), 0);

        // An empty remainder is vacuously all zero.
        let buf = [0x01];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(ctx.read_u8(), Ok(0x01));
        assert_eq!(ctx.take_zero_padding(), Some((1, 1)));
    }

    #[test]
    fn test_read_size_extra() {
        let mut report = Reporter::new(Vec::new());

        let mut ctx = ReadCtx::new(&[], LittleEndian);
        assert_eq!(
            read_size_extra(&mut ctx, 0x100, &mut report, "here"),
            Ok((0x100, Format::Dwarf32))
        );

        let buf = [0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut ctx = ReadCtx::new(&buf, LittleEndian);
        assert_eq!(
            read_size_extra(&mut ctx, DWARF64_LENGTH, &mut report, "here"),
            Ok((0x10, Format::Dwarf64))
        );
        assert_eq!(report.message_count(), 0);

        let mut ctx = ReadCtx::new(&[], LittleEndian);
        assert_eq!(
            read_size_extra(&mut ctx, 0xffff_ff00, &mut report, "here"),
            Err(Error::UnknownLengthEscape(0xffff_ff00))
        );
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_read_version_gate() {
        let mut report = Reporter::new(Vec::new());

        let mut ctx = ReadCtx::new(&[0x02, 0x00], LittleEndian);
        assert_eq!(
            read_version(&mut ctx, Format::Dwarf32, &mut report, "here"),
            Ok(2)
        );
        let mut ctx = ReadCtx::new(&[0x03, 0x00], LittleEndian);
        assert_eq!(
            read_version(&mut ctx, Format::Dwarf32, &mut report, "here"),
            Ok(3)
        );
        assert_eq!(report.message_count(), 0);

        let mut ctx = ReadCtx::new(&[0x01, 0x00], LittleEndian);
        assert_eq!(
            read_version(&mut ctx, Format::Dwarf32, &mut report, "here"),
            Err(Error::UnknownVersion(1))
        );
        let mut ctx = ReadCtx::new(&[0x04, 0x00], LittleEndian);
        assert_eq!(
            read_version(&mut ctx, Format::Dwarf32, &mut report, "here"),
            Err(Error::UnknownVersion(4))
        );
        assert_eq!(report.error_count(), 2);

        // Version 2 in a 64-bit unit is reported but tolerated.
        let mut ctx = ReadCtx::new(&[0x02, 0x00], LittleEndian);
        assert_eq!(
            read_version(&mut ctx, Format::Dwarf64, &mut report, "here"),
            Ok(2)
        );
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn test_checked_uleb128_reporting() {
        let mut report = Reporter::new(Vec::new());
        let mut ctx = ReadCtx::new(&[0x81, 0x00], LittleEndian);
        assert_eq!(
            checked_uleb128(&mut ctx, &mut report, "abbrev 0x0", "abbrev code"),
            Ok(1)
        );
        let mut ctx = ReadCtx::new(&[0x80], LittleEndian);
        assert_eq!(
            checked_uleb128(&mut ctx, &mut report, "abbrev 0x2", "abbrev code"),
            Err(Error::UnexpectedEof)
        );
        let out = String::from_utf8(report.into_inner()).unwrap();
        assert_eq!(
            out,
            "warning: abbrev 0x0: unnecessarily long encoding of abbrev code.\n\
             error: abbrev 0x2: can't read abbrev code.\n"
        );
    }
}
