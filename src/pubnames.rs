//! Structural checking of `.debug_pubnames`.
//!
//! Each set names a compilation unit and the length it covers, then
//! lists `(DIE offset, name)` pairs closed by a zero offset. The checker
//! resolves the unit, insists the covered length equals the unit's
//! actual length, and resolves every pair against the unit's walked DIE
//! addresses, so an offset that lands mid-DIE is caught.

use std::io::Write;

use crate::endianity::Endianity;
use crate::info::Cu;
use crate::message::{Reporter, MC_ERROR, MC_PUBNAMES};
use crate::reader::{read_size_extra, ReadCtx};

/// Check the whole `.debug_pubnames` section against the unit list.
///
/// Returns false when any set had to be abandoned.
pub fn check_pubnames<Endian, W>(
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
        let set_off = ctx.offset();
        let set_begin = ctx.pos();
        let whence = format!(".debug_pubnames: pubname set {:#x}", set_off);

        let size32 = match ctx.read_u32() {
            Ok(size32) => size32,
            Err(_) => {
                report.error(&format!("{}: can't read set length.", whence));
                return false;
            }
        };
        let (size, format) = match read_size_extra(ctx, size32, report, &whence) {
            Ok(extra) => extra,
            Err(_) => return false,
        };
        if !ctx.need(size) {
            report.error(&format!(
                "{}: set of size {:#x} doesn't fit in the section.",
                whence, size
            ));
            ctx.skip_to_end();
            return false;
        }

        let set_end = ctx.pos() + size as usize;
        let mut sub_ctx = ctx.sub(set_begin, set_end);
        sub_ctx.seek(ctx.pos());
        ctx.seek(set_end);

        // The set version is recorded but nothing hangs off it.
        if sub_ctx.read_u16().is_err() {
            report.error(&format!("{}: can't read set version.", whence));
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
        let cu = cus.iter().find(|cu| cu.offset == cu_off);
        let whence = format!(
            ".debug_pubnames: pubname set {:#x} (for CU {:#x})",
            set_off, cu_off
        );
        let cu = match cu {
            Some(cu) => cu,
            None => {
                report.error(&format!(
                    "{}: unresolved reference to CU {:#x}.",
                    whence, cu_off
                ));
                sound = false;
                continue;
            }
        };

        let cu_len = match sub_ctx.read_offset(format) {
            Ok(length) => length,
            Err(_) => {
                report.error(&format!("{}: can't read the length of the covered area.", whence));
                sound = false;
                continue;
            }
        };
        if cu_len != cu.length {
            report.error(&format!(
                "{}: the set covers length {} but CU has length {}.",
                whence, cu_len, cu.length
            ));
            sound = false;
            continue;
        }

        // Pairs of DIE offset and NUL-terminated name; a zero offset
        // closes the set.
        let mut abandoned = false;
        while !sub_ctx.eof() {
            let pair_off = sub_ctx.offset();
            let pair_whence = format!("{}, record {:#x}", whence, pair_off);

            let offset = match sub_ctx.read_offset(format) {
                Ok(offset) => offset,
                Err(_) => {
                    report.error(&format!("{}: can't read offset field.", pair_whence));
                    abandoned = true;
                    break;
                }
            };
            if offset == 0 {
                break;
            }

            if !cu.die_addrs.has(offset + cu.offset) {
                report.error(&format!(
                    "{}: unresolved reference to DIE {:#x}.",
                    pair_whence, offset
                ));
                abandoned = true;
                break;
            }

            loop {
                match sub_ctx.read_u8() {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(_) => {
                        report.error(&format!("{}: can't read symbol name.", pair_whence));
                        abandoned = true;
                        break;
                    }
                }
            }
            if abandoned {
                break;
            }
        }
        if abandoned {
            sound = false;
            continue;
        }

        if !sub_ctx.eof() {
            if let Some((begin, end)) = sub_ctx.take_zero_padding() {
                report.padding_zero(MC_PUBNAMES, begin, end, &whence);
            } else {
                report.padding_nonzero(
                    MC_PUBNAMES | MC_ERROR,
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
