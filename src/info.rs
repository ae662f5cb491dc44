//! Structural checking of `.debug_info`.
//!
//! The section is a sequence of compilation units, each a header plus a
//! chain of DIEs shaped by the abbreviation table the header names. The
//! walker decodes every DIE attribute by its form — that is the only way
//! to even find the next DIE — and while doing so enforces the sibling
//! chain rules, records every DIE address and DIE reference, marks the
//! `.debug_str` bytes that `strp` attributes reach, and flags
//! abbreviations nothing uses.
//!
//! The products, one [`Cu`] descriptor per unit, feed the aranges and
//! pubnames checkers and the cross-unit reference resolution that runs
//! once the whole section has been walked.

use std::io::Write;
use std::marker::PhantomData;

use crate::abbrev::{classify_sibling_form, form_valid, AbbrevTable, SiblingForm};
use crate::common::Format;
use crate::constants::{
    DwForm, DW_AT_sibling, DW_FORM_addr, DW_FORM_block, DW_FORM_block1, DW_FORM_block2,
    DW_FORM_block4, DW_FORM_data1, DW_FORM_data2, DW_FORM_data4, DW_FORM_data8, DW_FORM_flag,
    DW_FORM_indirect, DW_FORM_ref1, DW_FORM_ref2, DW_FORM_ref4, DW_FORM_ref8, DW_FORM_ref_addr,
    DW_FORM_ref_udata, DW_FORM_sdata, DW_FORM_string, DW_FORM_strp, DW_FORM_udata,
};
use crate::coverage::Coverage;
use crate::endianity::Endianity;
use crate::message::{
    Reporter, MC_ABBREVS, MC_ACC_BLOAT, MC_ACC_SUBOPTIMAL, MC_DIE_OTHER, MC_DIE_REL_CHILD,
    MC_DIE_REL_REF, MC_DIE_REL_SIB, MC_IMPACT_2, MC_IMPACT_3, MC_IMPACT_4, MC_STRINGS,
};
use crate::reader::{
    checked_sleb128, checked_uleb128, read_size_extra, read_version, Error, ReadCtx, Result,
};
use crate::record::{AddrRecord, RefRecord};

/// What the walker learned about one compilation unit.
#[derive(Debug)]
pub struct Cu {
    /// Offset of the unit (its initial length field) in `.debug_info`.
    pub offset: u64,
    /// Unit length including the initial length field itself.
    pub length: u64,
    /// Section offsets at which this unit's DIEs begin.
    pub die_addrs: AddrRecord,
    /// References this unit makes through `DW_FORM_ref_addr`, resolved
    /// against every unit once the section has been walked.
    pub die_refs: RefRecord,
}

impl Cu {
    fn new(offset: u64) -> Cu {
        Cu {
            offset,
            length: 0,
            die_addrs: AddrRecord::new(),
            die_refs: RefRecord::new(),
        }
    }
}

/// How an attribute of a given form is consumed, and what it yields.
///
/// Deriving both the byte consumption and the reference/sibling behavior
/// from this one classification keeps the two from drifting apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormClass {
    /// Format-sized offset into `.debug_str`.
    Strp,
    /// Inline NUL-terminated bytes.
    String,
    /// An address-sized quantity; `DW_FORM_ref_addr` makes it a global
    /// reference.
    Address { reference: bool },
    /// A ULEB128; `DW_FORM_ref_udata` makes it a local reference.
    Uleb { reference: bool },
    /// A fixed-width quantity; the `ref` forms make it a local
    /// reference.
    Fixed { width: u8, reference: bool },
    /// A SLEB128.
    Sleb,
    /// Length-prefixed opaque bytes; width 0 means a ULEB128 length.
    Block { width: u8 },
    /// Must be resolved before classification.
    Indirect,
}

fn classify_form(form: DwForm) -> Option<FormClass> {
    match form {
        DW_FORM_strp => Some(FormClass::Strp),
        DW_FORM_string => Some(FormClass::String),
        DW_FORM_addr => Some(FormClass::Address { reference: false }),
        DW_FORM_ref_addr => Some(FormClass::Address { reference: true }),
        DW_FORM_udata => Some(FormClass::Uleb { reference: false }),
        DW_FORM_ref_udata => Some(FormClass::Uleb { reference: true }),
        DW_FORM_flag | DW_FORM_data1 => Some(FormClass::Fixed {
            width: 1,
            reference: false,
        }),
        DW_FORM_ref1 => Some(FormClass::Fixed {
            width: 1,
            reference: true,
        }),
        DW_FORM_data2 => Some(FormClass::Fixed {
            width: 2,
            reference: false,
        }),
        DW_FORM_ref2 => Some(FormClass::Fixed {
            width: 2,
            reference: true,
        }),
        DW_FORM_data4 => Some(FormClass::Fixed {
            width: 4,
            reference: false,
        }),
        DW_FORM_ref4 => Some(FormClass::Fixed {
            width: 4,
            reference: true,
        }),
        DW_FORM_data8 => Some(FormClass::Fixed {
            width: 8,
            reference: false,
        }),
        DW_FORM_ref8 => Some(FormClass::Fixed {
            width: 8,
            reference: true,
        }),
        DW_FORM_sdata => Some(FormClass::Sleb),
        DW_FORM_block => Some(FormClass::Block { width: 0 }),
        DW_FORM_block1 => Some(FormClass::Block { width: 1 }),
        DW_FORM_block2 => Some(FormClass::Block { width: 2 }),
        DW_FORM_block4 => Some(FormClass::Block { width: 4 }),
        DW_FORM_indirect => Some(FormClass::Indirect),
        _ => None,
    }
}

/// The per-unit state of one DIE chain walk.
struct DieWalk<'a, 'input, Endian, W>
where
    Endian: Endianity,
    W: Write,
{
    cu: &'a mut Cu,
    table: &'a AbbrevTable,
    strings: Option<&'input [u8]>,
    format: Format,
    address_size: u8,
    /// CU-local references, resolved against the unit's own DIE
    /// addresses after the walk.
    loc_refs: RefRecord,
    strings_coverage: Option<&'a mut Coverage>,
    report: &'a mut Reporter<W>,
    _endian: PhantomData<Endian>,
}

impl<'a, 'input, Endian, W> DieWalk<'a, 'input, Endian, W>
where
    Endian: Endianity,
    W: Write,
{
    fn record_ref(&mut self, cu_len: u64, addr: u64, die_off: u64, whence: &str, local: bool) {
        if local {
            if addr >= cu_len {
                self.report.error(&format!(
                    "{}: invalid reference outside the CU: {:#x}.",
                    whence, addr
                ));
                return;
            }
            // The value is CU-relative; store it as a section offset.
            self.loc_refs.add(addr + self.cu.offset, die_off);
        } else {
            self.cu.die_refs.add(addr, die_off);
        }
    }

    /// Walk one chain of sibling DIEs, recursing into children.
    ///
    /// `Ok(true)` means at least one DIE was decoded, `Ok(false)` that
    /// the chain held only its terminator; `Err` abandons the unit.
    fn walk(&mut self, ctx: &mut ReadCtx<'input, Endian>) -> Result<bool> {
        let begin_off = ctx.offset();
        let mut got_die = false;
        let mut sibling_addr: u64 = 0;
        let mut die_off: u64 = 0;
        let mut prev_die_off: u64;
        let mut prev_had_children = false;

        while !ctx.eof() {
            prev_die_off = die_off;
            die_off = ctx.offset();
            let die_whence = format!(
                ".debug_info: CU {:#x}, DIE {:#x}",
                self.cu.offset, die_off
            );
            let abbr_code = checked_uleb128(ctx, self.report, &die_whence, "abbrev code")?;

            // Settle the sibling announcement the previous DIE made.
            if sibling_addr != 0 {
                if abbr_code == 0 {
                    self.report.error(&format!(
                        ".debug_info: CU {:#x}, DIE {:#x}: is the last sibling in chain, \
                         but has a DW_AT_sibling attribute.",
                        self.cu.offset, prev_die_off
                    ));
                } else if sibling_addr != die_off {
                    self.report.error(&format!(
                        ".debug_info: CU {:#x}, DIE {:#x}: This DIE should have had its \
                         sibling at {:#x}, but it's at {:#x} instead.",
                        self.cu.offset, prev_die_off, sibling_addr, die_off
                    ));
                }
                sibling_addr = 0;
            } else if prev_had_children {
                // Even a DIE with children legitimately goes without a
                // sibling attribute when it is last in its chain, so
                // this can only be diagnosed here, not at abbrev load.
                self.report.message(
                    MC_DIE_REL_SIB | MC_ACC_SUBOPTIMAL | MC_IMPACT_4,
                    &format!(
                        ".debug_info: CU {:#x}, DIE {:#x}: This DIE had children, \
                         but no DW_AT_sibling attribute.",
                        self.cu.offset, prev_die_off
                    ),
                );
            }

            // The chain ended: cleanly on a zero code, or mid-DIE when
            // the window ran out right after a code.
            if ctx.eof() || abbr_code == 0 {
                if abbr_code != 0 {
                    self.report.error(&format!(
                        ".debug_info: CU {:#x}: DIE chain at {:#x} not terminated with \
                         DIE with zero abbrev code.",
                        self.cu.offset, begin_off
                    ));
                }
                break;
            }

            let abbrev = match self.table.find(abbr_code) {
                Some(abbrev) => abbrev,
                None => {
                    self.report.error(&format!(
                        "{}: abbrev section at {:#x} doesn't contain code {}.",
                        die_whence, self.table.offset, abbr_code
                    ));
                    return Err(Error::UnknownAbbreviation(abbr_code));
                }
            };
            abbrev.used.set(true);
            got_die = true;

            self.cu.die_addrs.add(self.cu.offset + die_off);

            for attr in &abbrev.attributes {
                let whence = format!(
                    ".debug_info: CU {:#x}, DIE {:#x}, abbrev {:#x}, attribute {:#x}",
                    self.cu.offset, die_off, abbrev.code, attr.offset
                );

                let mut form = attr.form;
                if form == DW_FORM_indirect {
                    let value =
                        checked_uleb128(ctx, self.report, &whence, "indirect attribute form")?;
                    if !form_valid(DwForm(value)) {
                        self.report.error(&format!(
                            "{}: invalid indirect form {:#x}.",
                            whence, value
                        ));
                        return Err(Error::InvalidAttributeForm);
                    }
                    form = DwForm(value);

                    // The form recorded in the abbreviation got its
                    // sibling policy check at load time; the resolved
                    // one has not been seen until now.
                    if attr.name == DW_AT_sibling {
                        match classify_sibling_form(form) {
                            SiblingForm::Ok => {}
                            SiblingForm::RefAddr => self.report.message(
                                MC_DIE_REL_SIB | MC_IMPACT_2,
                                &format!(
                                    "{}: DW_AT_sibling attribute with (indirect) form \
                                     DW_FORM_ref_addr.",
                                    whence
                                ),
                            ),
                            SiblingForm::Bad => self.report.error(&format!(
                                "{}: DW_AT_sibling attribute with non-reference \
                                 (indirect) form {}.",
                                whence, form
                            )),
                        }
                    }
                }

                let class = match classify_form(form) {
                    Some(class) => class,
                    None => {
                        self.report
                            .error(&format!("{}: unhandled form {}.", whence, form));
                        return Err(Error::InvalidAttributeForm);
                    }
                };

                match class {
                    FormClass::Strp => {
                        let addr = match ctx.read_offset(self.format) {
                            Ok(addr) => addr,
                            Err(e) => {
                                self.report
                                    .error(&format!("{}: can't read attribute value.", whence));
                                return Err(e);
                            }
                        };
                        match self.strings {
                            None => self.report.error(&format!(
                                "{}: strp attribute, but no .debug_str section.",
                                whence
                            )),
                            Some(strings) if addr >= strings.len() as u64 => {
                                self.report.error(&format!(
                                    "{}: invalid offset outside .debug_str: {:#x}.",
                                    whence, addr
                                ))
                            }
                            Some(strings) => {
                                // Mark the used part of the string table,
                                // terminating NUL included.
                                let start = addr as usize;
                                let end = match strings[start..].iter().position(|&b| b == 0) {
                                    Some(len) => addr + len as u64,
                                    None => strings.len() as u64 - 1,
                                };
                                if let Some(coverage) = self.strings_coverage.as_deref_mut() {
                                    coverage.add(addr, end);
                                }
                            }
                        }
                    }

                    FormClass::String => loop {
                        match ctx.read_u8() {
                            Ok(0) => break,
                            Ok(_) => {}
                            Err(e) => {
                                self.report
                                    .error(&format!("{}: can't read attribute value.", whence));
                                return Err(e);
                            }
                        }
                    },

                    FormClass::Address { reference } => {
                        let value = match ctx.read_var(self.address_size) {
                            Ok(value) => value,
                            Err(e) => {
                                self.report
                                    .error(&format!("{}: can't read attribute value.", whence));
                                return Err(e);
                            }
                        };
                        if reference {
                            self.record_ref(ctx.len(), value, die_off, &whence, false);
                        }
                    }

                    FormClass::Uleb { reference } => {
                        let value =
                            checked_uleb128(ctx, self.report, &whence, "attribute value")?;
                        if attr.name == DW_AT_sibling {
                            sibling_addr = value;
                        } else if reference {
                            self.record_ref(ctx.len(), value, die_off, &whence, true);
                        }
                    }

                    FormClass::Fixed { width, reference } => {
                        let value = match ctx.read_var(width) {
                            Ok(value) => value,
                            Err(e) => {
                                self.report
                                    .error(&format!("{}: can't read attribute value.", whence));
                                return Err(e);
                            }
                        };
                        if attr.name == DW_AT_sibling {
                            sibling_addr = value;
                        } else if reference {
                            self.record_ref(ctx.len(), value, die_off, &whence, true);
                        }
                    }

                    FormClass::Sleb => {
                        checked_sleb128(ctx, self.report, &whence, "attribute value")?;
                    }

                    FormClass::Block { width } => {
                        let length = if width == 0 {
                            checked_uleb128(ctx, self.report, &whence, "attribute value")?
                        } else {
                            match ctx.read_var(width) {
                                Ok(length) => length,
                                Err(e) => {
                                    self.report.error(&format!(
                                        "{}: can't read attribute value.",
                                        whence
                                    ));
                                    return Err(e);
                                }
                            }
                        };
                        if let Err(e) = ctx.skip(length) {
                            self.report
                                .error(&format!("{}: can't read attribute value.", whence));
                            return Err(e);
                        }
                    }

                    FormClass::Indirect => {
                        self.report
                            .error(&format!("{}: Indirect form is again indirect.", whence));
                        return Err(Error::IndirectFormCycle);
                    }
                }
            }

            if abbrev.has_children {
                match self.walk(ctx)? {
                    true => {}
                    false => self.report.message(
                        MC_IMPACT_3 | MC_ACC_SUBOPTIMAL | MC_DIE_REL_CHILD,
                        &format!(
                            ".debug_info: CU {:#x}, DIE {:#x}: Abbrev has_children, \
                             but the chain was empty.",
                            self.cu.offset, die_off
                        ),
                    ),
                }
            }
            prev_had_children = abbrev.has_children;
        }

        if sibling_addr != 0 {
            self.report.error(&format!(
                ".debug_info: CU {:#x}, DIE {:#x}: This DIE should have had its sibling \
                 at {:#x}, but the DIE chain ended.",
                self.cu.offset, die_off, sibling_addr
            ));
        }

        Ok(got_die)
    }
}

/// Resolve one unit's CU-local references against its DIE addresses.
fn check_die_references<W>(cu: &Cu, loc_refs: &RefRecord, report: &mut Reporter<W>) -> bool
where
    W: Write,
{
    let mut sound = true;
    for r in loc_refs.as_slice() {
        if !cu.die_addrs.has(r.addr) {
            report.error(&format!(
                ".debug_info: CU {:#x}, DIE {:#x}: unresolved reference to DIE {:#x}.",
                cu.offset, r.who, r.addr
            ));
            sound = false;
        }
    }
    sound
}

/// Resolve every unit's `DW_FORM_ref_addr` references against the whole
/// unit list, and flag the ones that need not have been global.
fn check_global_die_references<W>(cus: &[Cu], report: &mut Reporter<W>) -> bool
where
    W: Write,
{
    let mut sound = true;
    for cu in cus {
        for r in cu.die_refs.as_slice() {
            match cus.iter().find(|target| target.die_addrs.has(r.addr)) {
                None => {
                    report.error(&format!(
                        ".debug_info: CU {:#x}, DIE {:#x}: unresolved (non-CU-local) \
                         reference to DIE {:#x}.",
                        cu.offset, r.who, r.addr
                    ));
                    sound = false;
                }
                Some(target) if target.offset == cu.offset => report.message(
                    MC_IMPACT_2 | MC_ACC_SUBOPTIMAL | MC_DIE_REL_REF,
                    &format!(
                        ".debug_info: CU {:#x}, DIE {:#x}: local reference to \
                         DIE {:#x} formed as global.",
                        cu.offset, r.who, r.addr
                    ),
                ),
                Some(_) => {}
            }
        }
    }
    sound
}

/// Check one unit past its initial length field: the header, then the
/// DIE chain, then the per-unit accounting (unused abbreviations and
/// local reference resolution).
fn check_cu<'input, Endian, W>(
    ctx: &mut ReadCtx<'input, Endian>,
    cu: &mut Cu,
    tables: &[AbbrevTable],
    strings: Option<&'input [u8]>,
    format: Format,
    strings_coverage: &mut Option<Coverage>,
    report: &mut Reporter<W>,
) -> bool
where
    Endian: Endianity,
    W: Write,
{
    let whence = format!(".debug_info: CU {:#x}", cu.offset);

    if read_version(ctx, format, report, &whence).is_err() {
        return false;
    }

    let abbrev_offset = match ctx.read_offset(format) {
        Ok(offset) => offset,
        Err(_) => {
            report.error(&format!("{}: can't read abbrev offset.", whence));
            return false;
        }
    };

    let address_size = match ctx.read_u8() {
        Ok(size) => size,
        Err(_) => {
            report.error(&format!("{}: can't read address size.", whence));
            return false;
        }
    };
    if address_size != 4 && address_size != 8 {
        report.error(&format!(
            "{}: invalid address size: {} (only 4 or 8 allowed).",
            whence, address_size
        ));
        return false;
    }

    let table = match tables.iter().find(|table| table.offset == abbrev_offset) {
        Some(table) => table,
        None => {
            report.error(&format!(
                "{}: couldn't find abbrev section with offset {:#x}.",
                whence, abbrev_offset
            ));
            return false;
        }
    };

    let mut walk = DieWalk {
        cu: &mut *cu,
        table,
        strings,
        format,
        address_size,
        loc_refs: RefRecord::new(),
        strings_coverage: strings_coverage.as_mut(),
        report: &mut *report,
        _endian: PhantomData,
    };
    let walked = walk.walk(ctx);
    let loc_refs = walk.loc_refs;

    match walked {
        Err(_) => false,
        Ok(_) => {
            for abbrev in &table.abbrevs {
                if !abbrev.used.get() {
                    report.message(
                        MC_IMPACT_3 | MC_ACC_BLOAT | MC_ABBREVS,
                        &format!(
                            "{}: Abbreviation with code {} is never used.",
                            whence, abbrev.code
                        ),
                    );
                }
            }
            check_die_references(cu, &loc_refs, report)
        }
    }
}

/// Check the whole `.debug_info` section and return its unit list, or
/// `None` when a fatal failure or unsound references make the list
/// unusable for the downstream aranges/pubnames checks.
pub fn check_debug_info<'input, Endian, W>(
    ctx: &mut ReadCtx<'input, Endian>,
    tables: &[AbbrevTable],
    strings: Option<&'input [u8]>,
    report: &mut Reporter<W>,
) -> Option<Vec<Cu>>
where
    Endian: Endianity,
    W: Write,
{
    let mut cus: Vec<Cu> = Vec::new();
    let mut success = true;

    // Only pay for coverage tracking if the resulting messages could
    // ever be shown.
    let mut strings_coverage = match strings {
        Some(data) if report.accepts(MC_STRINGS) => Some(Coverage::new(data.len() as u64)),
        _ => None,
    };

    while !ctx.eof() {
        let cu_begin = ctx.pos();
        let cu_off = ctx.offset();
        let whence = format!(".debug_info: CU {:#x}", cu_off);
        let mut cu = Cu::new(cu_off);

        // Zero padding may legitimately stand where the next unit
        // header would be.
        if !ctx.need(4) {
            if let Some((begin, end)) = ctx.take_zero_padding() {
                report.padding_zero(MC_DIE_OTHER, begin, end, &whence);
                cus.push(cu);
                break;
            }
        }

        let size32 = match ctx.read_u32() {
            Ok(size32) => size32,
            Err(_) => {
                report.error(&format!("{}: can't read CU length.", whence));
                success = false;
                cus.push(cu);
                break;
            }
        };
        if size32 == 0 {
            // A zero length word followed by nothing but zeroes (or by
            // nothing at all, when the word sits flush with the section
            // end) is padding, not a unit.
            if let Some((begin, end)) = ctx.take_zero_padding() {
                report.padding_zero(MC_DIE_OTHER, begin, end, &whence);
                cus.push(cu);
                break;
            }
        }

        let (size, format) = match read_size_extra(ctx, size32, report, &whence) {
            Ok(extra) => extra,
            Err(_) => {
                success = false;
                cus.push(cu);
                break;
            }
        };

        if !ctx.need(size) {
            report.error(&format!(
                "{}: section doesn't have enough data to read CU of size {:#x}.",
                whence, size
            ));
            ctx.skip_to_end();
            success = false;
            cus.push(cu);
            break;
        }

        let cu_end = ctx.pos() + size as usize;
        cu.length = (cu_end - cu_begin) as u64;

        // version + debug_abbrev_offset + address_size
        let header_size = 2 + u64::from(format.word_size()) + 1;
        if size < header_size {
            report.error(&format!(
                "{}: claimed length of {:#x} doesn't even cover CU header.",
                whence, size
            ));
            success = false;
            cus.push(cu);
            break;
        }

        // Let the unit context begin at the initial length field so DIE
        // offsets come out relative to the unit start.
        let mut cu_ctx = ctx.sub(cu_begin, cu_end);
        cu_ctx.seek(ctx.pos());

        if !check_cu(
            &mut cu_ctx,
            &mut cu,
            tables,
            strings,
            format,
            &mut strings_coverage,
            report,
        ) {
            success = false;
            cus.push(cu);
            break;
        }

        if !cu_ctx.eof() {
            if let Some((begin, end)) = cu_ctx.take_zero_padding() {
                report.padding_zero(MC_DIE_OTHER, begin, end, &whence);
            } else {
                report.padding_nonzero(MC_DIE_OTHER, cu_ctx.offset(), cu_ctx.len(), &whence);
            }
        }

        ctx.seek(cu_end);
        cus.push(cu);
    }

    if success && !ctx.eof() {
        report.message(
            MC_DIE_OTHER | MC_IMPACT_4,
            ".debug_info: CU lengths don't exactly match the section contents.",
        );
    }

    let references_sound = check_global_die_references(&cus, report);

    if let Some(coverage) = &strings_coverage {
        if success {
            let data = strings.expect("coverage implies a string table");
            coverage.holes(|begin, end| {
                let all_zero = data[begin as usize..=end as usize].iter().all(|&b| b == 0);
                if all_zero {
                    report.padding_zero(MC_STRINGS, begin, end, ".debug_str");
                } else {
                    report.padding_nonzero(MC_STRINGS, begin, end, ".debug_str");
                }
            });
        }
    }

    if !success || !references_sound {
        return None;
    }
    Some(cus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abbrev::load_abbrev_tables;
    use crate::endianity::LittleEndian;
    use crate::message::{Reporter, MC_STRINGS};

    // Code 1: DW_TAG_compile_unit, children, no attributes.
    // Code 2: DW_TAG_base_type, no children, no attributes.
    #[cfg_attr(rustfmt, rustfmt_skip)]
    const PLAIN_ABBREVS: &[u8] = &[
        0x01, 0x11, 0x01, 0x00, 0x00,
        0x02, 0x24, 0x00, 0x00, 0x00,
        0x00,
    ];

    fn tables(buf: &[u8]) -> Vec<AbbrevTable> {
        let mut report = Reporter::new(Vec::new());
        let mut ctx = ReadCtx::new(buf, LittleEndian);
        let tables = load_abbrev_tables(&mut ctx, &mut report).expect("abbrevs should load");
        assert_eq!(report.message_count(), 0);
        tables
    }

    fn check(
        abbrevs: &[u8],
        info: &[u8],
        strings: Option<&[u8]>,
        strict: bool,
    ) -> (Option<Vec<Cu>>, String, u64) {
        let tables = tables(abbrevs);
        let mut report = Reporter::new(Vec::new());
        if strict {
            report.accept_also(MC_STRINGS);
        }
        let mut ctx = ReadCtx::new(info, LittleEndian);
        let cus = check_debug_info(&mut ctx, &tables, strings, &mut report);
        let errors = report.error_count();
        let out = String::from_utf8(report.into_inner()).unwrap();
        (cus, out, errors)
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_minimal_cu_is_clean() {
        let info = [
            // Unit length: 10 bytes follow.
            0x0a, 0x00, 0x00, 0x00,
            // Version 2.
            0x02, 0x00,
            // Abbrev offset 0.
            0x00, 0x00, 0x00, 0x00,
            // Address size 4.
            0x04,
            // DIE at offset 0xb: code 1 (compile unit, children).
            0x01,
            // Child chain: code 2, then terminator.
            0x02,
            0x00,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert_eq!(out, "");
        assert_eq!(errors, 0);
        let cus = cus.expect("the unit list should come back");
        assert_eq!(cus.len(), 1);
        assert_eq!(cus[0].offset, 0);
        assert_eq!(cus[0].length, 14);
        assert_eq!(cus[0].die_addrs.as_slice(), [0xb, 0xc]);
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_die_addresses_are_section_relative() {
        let info = [
            // First unit, 9 bytes of content.
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // DIE: code 2, then terminator.
            0x02,
            0x00,
            // Second unit at offset 0xd.
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
            0x00,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        // The unused compile-unit abbreviation is flagged per unit.
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n\
             warning: .debug_info: CU 0xd: Abbreviation with code 1 is never used.\n"
        );
        let cus = cus.unwrap();
        assert_eq!(cus.len(), 2);
        assert_eq!(cus[0].die_addrs.as_slice(), [0xb]);
        assert_eq!(cus[1].offset, 0xd);
        assert_eq!(cus[1].die_addrs.as_slice(), [0xd + 0xb]);
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_sibling_mismatch() {
        // Code 1: compile unit with children; code 2: DW_TAG_variable,
        // no children, DW_AT_sibling as DW_FORM_ref1 plus a one-byte
        // DW_AT_const_value so the sibling value has something to be
        // wrong about.
        let abbrevs = [
            0x01, 0x11, 0x01, 0x00, 0x00,
            0x02, 0x34, 0x00,
                0x01, 0x11,  // DW_AT_sibling, DW_FORM_ref1
                0x1c, 0x0b,  // DW_AT_const_value, DW_FORM_data1
                0x00, 0x00,
            0x00,
        ];
        let info = [
            // Unit length 0x10.
            0x10, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // 0xb: compile unit.
            0x01,
            // 0xc: variable, sibling says next DIE at 0x10; it will
            // really be at 0xf.
            0x02, 0x10, 0x2a,
            // 0xf: variable, sibling 0x13, but the chain ends first.
            0x02, 0x13, 0x2a,
            // 0x12: child chain terminator.
            0x00,
            // 0x13: outer chain terminator.
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        // Sibling trouble is reported but is not fatal to the unit.
        assert!(cus.is_some());
        assert_eq!(errors, 3);
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xc: This DIE should have had its sibling \
             at 0x10, but it's at 0xf instead.\n\
             error: .debug_info: CU 0x0, DIE 0xf: is the last sibling in chain, but has \
             a DW_AT_sibling attribute.\n\
             error: .debug_info: CU 0x0, DIE 0xb: This DIE had children, but no \
             DW_AT_sibling attribute.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_sibling_latch_survives_chain_end() {
        // Code 1: DW_TAG_variable, no children, DW_AT_sibling via
        // DW_FORM_ref1.
        let abbrevs = [
            0x01, 0x34, 0x00, 0x01, 0x11, 0x00, 0x00,
            0x00,
        ];
        let info = [
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // 0xb: variable announcing a sibling at 0x40; the unit ends
            // right after it, with no terminator to settle the claim.
            0x01, 0x40,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 1);
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb: This DIE should have had its sibling \
             at 0x40, but the DIE chain ended.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_unused_abbrev_is_bloat() {
        let info = [
            // Just the header and one DIE of code 2 plus terminator;
            // code 1 goes unused.
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
            0x00,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_dangling_local_ref() {
        // Code 1: compile unit, children, unused here; code 2:
        // DW_TAG_typedef with DW_AT_type, DW_FORM_ref4.
        let abbrevs = [
            0x01, 0x11, 0x01, 0x00, 0x00,
            0x02, 0x16, 0x00, 0x49, 0x13, 0x00, 0x00,
            0x00,
        ];
        let info = [
            0x12, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // 0xb: typedef referring to the DIE at 0x10 (fine).
            0x02, 0x10, 0x00, 0x00, 0x00,
            // 0x10: typedef referring to 0x13, which is mid-DIE.
            0x02, 0x13, 0x00, 0x00, 0x00,
            // 0x15: terminator.
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(errors, 1);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n\
             error: .debug_info: CU 0x0, DIE 0x10: unresolved reference to DIE 0x13.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_local_ref_outside_cu() {
        let abbrevs = [
            0x01, 0x11, 0x01, 0x00, 0x00,
            0x02, 0x16, 0x00, 0x49, 0x13, 0x00, 0x00,
            0x00,
        ];
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // 0xb: typedef whose DW_FORM_ref4 value 0x1000 cannot fit
            // in a 0x11-byte unit.
            0x02, 0x00, 0x10, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_some(), "an out-of-range reference is reported, not fatal");
        assert_eq!(errors, 1);
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb, abbrev 0x2, attribute 0x8: \
             invalid reference outside the CU: 0x1000.\n\
             warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_empty_child_chain_is_suboptimal() {
        let info = [
            // Compile unit with children, directly followed by the
            // child chain terminator; the unit ends there.
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            0x00,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0, DIE 0xb: Abbrev has_children, but the chain \
             was empty.\n\
             warning: .debug_info: CU 0x0: Abbreviation with code 2 is never used.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_unterminated_chain() {
        let info = [
            // One DIE and then the unit just stops.
            0x08, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 1);
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0: DIE chain at 0xb not terminated with DIE with \
             zero abbrev code.\n\
             warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n\
             warning: .debug_info: CU 0x0: Abbreviation with code 2 is never used.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_unknown_abbrev_code_is_fatal() {
        let info = [
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // No abbreviation has code 7.
            0x07,
            0x00,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb: abbrev section at 0x0 doesn't \
             contain code 7.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_bad_address_size_is_fatal_for_cu() {
        let info = [
            0x08, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Address size 6.
            0x06,
            0x02,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0: invalid address size: 6 (only 4 or 8 allowed).\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_missing_abbrev_table_is_fatal_for_cu() {
        let info = [
            0x08, 0x00, 0x00, 0x00,
            0x02, 0x00,
            // Abbrev offset 0x40: nothing lives there.
            0x40, 0x00, 0x00, 0x00,
            0x04,
            0x02,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0: couldn't find abbrev section with offset 0x40.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_strp_marks_strings_coverage() {
        // Code 1: compile unit, no children, DW_AT_name via strp.
        let abbrevs = [
            0x01, 0x11, 0x00, 0x03, 0x0e, 0x00, 0x00,
            0x00,
        ];
        // "ab\0cd\0": the DIE only refers to offset 3 ("cd").
        let strings = b"ab\0cd\0";
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            // strp offset 3.
            0x03, 0x00, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, Some(strings), true);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_str: 0x0..0x2: unreferenced non-zero bytes.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_strp_out_of_range() {
        let abbrevs = [
            0x01, 0x11, 0x00, 0x03, 0x0e, 0x00, 0x00,
            0x00,
        ];
        let strings = b"ab\0";
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            // strp offset 0x10 is outside the 3-byte table.
            0x10, 0x00, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, Some(strings), false);
        assert!(cus.is_some(), "a bad strp offset is reported, not fatal");
        assert_eq!(errors, 1);
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb, abbrev 0x1, attribute 0x3: \
             invalid offset outside .debug_str: 0x10.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_global_ref_between_units_resolves() {
        // Code 1: compile unit, no children, DW_AT_type via ref_addr.
        let abbrevs = [
            0x01, 0x11, 0x00, 0x49, 0x10, 0x00, 0x00,
            0x00,
        ];
        let info = [
            // First unit: refers to the second unit's DIE at section
            // offset 0x1c.
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            0x1c, 0x00, 0x00, 0x00,
            0x00,
            // Second unit at 0x11; its DIE sits at 0x1c and refers back
            // to the first unit's DIE at 0xb.
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            0x0b, 0x00, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(out, "");
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_global_ref_within_unit_is_suboptimal() {
        let abbrevs = [
            0x01, 0x11, 0x00, 0x49, 0x10, 0x00, 0x00,
            0x00,
        ];
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // The DIE at 0xb refers to itself through ref_addr.
            0x01,
            0x0b, 0x00, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0, DIE 0xb: local reference to DIE 0xb \
             formed as global.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_dangling_global_ref() {
        let abbrevs = [
            0x01, 0x11, 0x00, 0x49, 0x10, 0x00, 0x00,
            0x00,
        ];
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            0xbb, 0x00, 0x00, 0x00,
            0x00,
        ];
        let (cus, out, _) = check(&abbrevs, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb: unresolved (non-CU-local) reference \
             to DIE 0xbb.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_trailing_zero_padding_in_section() {
        let info = [
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
            0x00,
            // Three bytes of zero padding instead of another unit.
            0x00, 0x00, 0x00,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n\
             warning: .debug_info: CU 0xd: 0xd..0x10: unnecessary padding with zero \
             bytes.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_lone_zero_length_word_is_padding() {
        let info = [
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
            0x00,
            // Exactly one zero length word, flush with the section end.
            0x00, 0x00, 0x00, 0x00,
        ];
        let (cus, out, errors) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(
            out,
            "warning: .debug_info: CU 0x0: Abbreviation with code 1 is never used.\n\
             warning: .debug_info: CU 0xd: 0x11..0x11: unnecessary padding with zero \
             bytes.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_cu_claimed_length_too_large() {
        let info = [
            // The unit claims 0x40 bytes; only 8 exist.
            0x40, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x02,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0: section doesn't have enough data to read CU \
             of size 0x40.\n"
        );
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_cu_claimed_length_below_header() {
        let info = [
            0x03, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00,
        ];
        let (cus, out, _) = check(PLAIN_ABBREVS, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0: claimed length of 0x3 doesn't even cover CU \
             header.\n"
        );
    }

    #[test]
    fn test_indirect_form_resolves() {
        // Code 1: compile unit, no children, DW_AT_const_value with
        // DW_FORM_indirect.
        let abbrevs = [0x01, 0x11, 0x00, 0x1c, 0x16, 0x00, 0x00, 0x00];
        #[cfg_attr(rustfmt, rustfmt_skip)]
        let info = [
            0x0a, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            // Indirect form resolves to DW_FORM_data1, value 0x2a.
            0x0b, 0x2a,
        ];
        let (cus, out, errors) = check(&abbrevs, &info, None, false);
        assert!(cus.is_some());
        assert_eq!(errors, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn test_indirect_to_indirect_is_fatal() {
        let abbrevs = [0x01, 0x11, 0x00, 0x1c, 0x16, 0x00, 0x00, 0x00];
        #[cfg_attr(rustfmt, rustfmt_skip)]
        let info = [
            0x09, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            0x01,
            // Indirect resolving to indirect.
            0x16,
        ];
        let (cus, out, _) = check(&abbrevs, &info, None, false);
        assert!(cus.is_none());
        assert_eq!(
            out,
            "error: .debug_info: CU 0x0, DIE 0xb, abbrev 0x1, attribute 0x3: \
             Indirect form is again indirect.\n"
        );
    }
}
