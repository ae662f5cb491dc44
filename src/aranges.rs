//! Structural checking of `.debug_aranges`.
//!
//! Each table is a header naming a compilation unit, padding up to the
//! first tuple boundary, and `(address, length)` tuples closed by a
//! `(0, 0)` sentinel. The checker validates the header fields, resolves
//! the unit back-reference against the walked unit list, insists the
//! header padding is zero, and classifies whatever trails the sentinel.

use std::io::Write;

use crate::endianity::Endianity;
use crate::info::Cu;
use crate::message::{Reporter, MC_ARANGES, MC_ERROR, MC_IMPACT_2};
use crate::reader::{read_size_extra, read_version, ReadCtx};

/// Check the whole `.debug_aranges` section against the unit list.
///
/// Returns false when any table had to be abandoned.
pub fn check_aranges<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    cus: &[Cu],
    report: &mut Reporter<W>,
) -> bool
where
    Endian: Endianity,
    W: Write,
{
    let mut sound = true;

    while !ctx.eof() {
        let atab_off = ctx.offset();
        let atab_begin = ctx.pos();
        let whence = format!(".debug_aranges: arange table {:#x}", atab_off);

        let size32 = match ctx.read_u32() {
            Ok(size32) => size32,
            Err(_) => {
                report.error(&format!("{}: can't read table length.", whence));
                return false;
            }
        };
        let (size, format) = match read_size_extra(ctx, size32, report, &whence) {
            Ok(extra) => extra,
            Err(_) => return false,
        };
        if !ctx.need(size) {
            report.error(&format!(
                "{}: table of size {:#x} doesn't fit in the section.",
                whence, size
            ));
            ctx.skip_to_end();
            return false;
        }

        let atab_end = ctx.pos() + size as usize;
        let mut sub_ctx = ctx.sub(atab_begin, atab_end);
        sub_ctx.seek(ctx.pos());
        ctx.seek(atab_end);

        if read_version(&mut sub_ctx, format, report, &whence).is_err() {
            sound = false;
            continue;
        }

        let cu_off = match sub_ctx.read_offset(format) {
            Ok(offset) => offset,
            Err(_) => {
                report.error(&format!("{}: can't read debug info offset.", whence));
                sound = false;
                continue;
            }
        };
        if !cus.iter().any(|cu| cu.offset == cu_off) {
            report.error(&format!(
                "{}: unresolved reference to CU {:#x}.",
                whence, cu_off
            ));
        }
        let whence = format!(
            ".debug_aranges: arange table {:#x} (for CU {:#x})",
            atab_off, cu_off
        );

        let address_size = match sub_ctx.read_u8() {
            Ok(size) => size,
            Err(_) => {
                report.error(&format!("{}: can't read unit address size.", whence));
                sound = false;
                continue;
            }
        };
        if address_size != 2 && address_size != 4 && address_size != 8 {
            report.error(&format!("{}: invalid address size: {}.", whence, address_size));
            sound = false;
            continue;
        }

        let segment_size = match sub_ctx.read_u8() {
            Ok(size) => size,
            Err(_) => {
                report.error(&format!("{}: can't read unit segment size.", whence));
                sound = false;
                continue;
            }
        };
        if segment_size != 0 {
            report.warning(&format!(
                "{}: non-zero segment_size is not supported.",
                whence
            ));
            sound = false;
            continue;
        }

        // The first tuple must begin at a multiple of the tuple size,
        // twice the size of an address; the header is padded with
        // zeroes up to that boundary.
        let tuple_size = 2 * u64::from(address_size);
        let off = sub_ctx.offset();
        if off % tuple_size != 0 {
            let boundary = (off / tuple_size + 1) * tuple_size;
            let mut truncated = false;
            for byte_off in off..boundary {
                match sub_ctx.read_u8() {
                    Ok(0) => {}
                    Ok(_) => report.message(
                        MC_IMPACT_2 | MC_ARANGES,
                        &format!(
                            "{}: non-zero byte at {:#x} in padding before the first \
                             entry.",
                            whence, byte_off
                        ),
                    ),
                    Err(_) => {
                        report.error(&format!(
                            "{}: section ends after the header, but before the first \
                             entry.",
                            whence
                        ));
                        truncated = true;
                        break;
                    }
                }
            }
            if truncated {
                sound = false;
                continue;
            }
        }

        loop {
            if sub_ctx.eof() {
                break;
            }
            let tuple_off = sub_ctx.offset();
            let tuple_whence = format!("{}, record {:#x}", whence, tuple_off);

            let address = match sub_ctx.read_var(address_size) {
                Ok(address) => address,
                Err(_) => {
                    report.error(&format!("{}: can't read address field.", tuple_whence));
                    sound = false;
                    break;
                }
            };
            let length = match sub_ctx.read_var(address_size) {
                Ok(length) => length,
                Err(_) => {
                    report.error(&format!("{}: can't read length field.", tuple_whence));
                    sound = false;
                    break;
                }
            };

            if address == 0 && length == 0 {
                break;
            }

            // Address and length validity is a higher-level concern.
        }

        if !sub_ctx.eof() {
            if let Some((begin, end)) = sub_ctx.take_zero_padding() {
                report.padding_zero(MC_ARANGES, begin, end, &whence);
            } else {
                report.padding_nonzero(
                    MC_ARANGES | MC_ERROR,
                    sub_ctx.offset(),
                    sub_ctx.len(),
                    &whence,
                );
                sound = false;
            }
        }
    }

    sound
}
