//! Loading and checking of `.debug_abbrev` tables.
//!
//! The section holds one or more tables, each a sequence of
//! abbreviations terminated by a zero code. The loader validates every
//! field as it goes — tag range, has-children byte, attribute name and
//! form ranges, and the structural rules around `DW_AT_sibling` — and
//! produces the table chain the DIE walker resolves unit headers
//! against. Redundant runs of terminating zeros are reported as bloat.

use std::cell::Cell;
use std::io::Write;

use crate::constants::{
    DwAt, DwForm, DwTag, DW_AT_hi_user, DW_AT_sibling, DW_CHILDREN_no, DW_CHILDREN_yes,
    DW_FORM_indirect, DW_FORM_ref1, DW_FORM_ref2, DW_FORM_ref4, DW_FORM_ref8, DW_FORM_ref_addr,
    DW_FORM_ref_udata, DW_TAG_hi_user,
};
use crate::endianity::Endianity;
use crate::message::{
    Reporter, MC_ABBREVS, MC_ACC_BLOAT, MC_DIE_REL_SIB, MC_IMPACT_1, MC_IMPACT_2,
};
use crate::reader::{checked_uleb128, Error, ReadCtx, Result};

/// One attribute specification inside an abbreviation: where it sits in
/// the section, and its name/form pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbbrevAttribute {
    /// Section offset of the attribute's name ULEB128.
    pub offset: u64,
    /// The attribute name.
    pub name: DwAt,
    /// The attribute form.
    pub form: DwForm,
}

/// One abbreviation: a reusable DIE shape referenced by code.
#[derive(Debug)]
pub struct Abbrev {
    /// The code DIEs select this abbreviation with. Never zero.
    pub code: u64,
    /// The DIE tag.
    pub tag: DwTag,
    /// Whether DIEs of this shape are followed by a child chain.
    pub has_children: bool,
    /// Set once some DIE actually selects this abbreviation.
    pub used: Cell<bool>,
    /// The attribute specifications, in declaration order. The
    /// terminating `(0, 0)` pair is not stored.
    pub attributes: Vec<AbbrevAttribute>,
}

/// One abbreviation table: the abbreviations declared at a given section
/// offset, sorted by code.
#[derive(Debug)]
pub struct AbbrevTable {
    /// Offset of the table's first abbreviation code in `.debug_abbrev`.
    pub offset: u64,
    /// The abbreviations, sorted by code, no duplicates.
    pub abbrevs: Vec<Abbrev>,
}

impl AbbrevTable {
    /// Look up an abbreviation by code.
    pub fn find(&self, code: u64) -> Option<&Abbrev> {
        self.abbrevs
            .binary_search_by_key(&code, |abbrev| abbrev.code)
            .ok()
            .map(|i| &self.abbrevs[i])
    }
}

/// True for the forms this checker understands: everything in
/// `(0, DW_FORM_indirect]`. DWARF 4 forms land above that range and are
/// rejected.
pub(crate) fn form_valid(form: DwForm) -> bool {
    form.0 > 0 && form.0 <= DW_FORM_indirect.0
}

/// How a form fares as the carrier of a `DW_AT_sibling` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SiblingForm {
    /// A CU-local reference class form (or indirect, resolved later).
    Ok,
    /// `DW_FORM_ref_addr`: legal but pointlessly global.
    RefAddr,
    /// Not a reference form at all.
    Bad,
}

pub(crate) fn classify_sibling_form(form: DwForm) -> SiblingForm {
    match form {
        // Indirect is tolerated here; the resolved form is re-checked
        // during the DIE walk.
        DW_FORM_indirect | DW_FORM_ref1 | DW_FORM_ref2 | DW_FORM_ref4 | DW_FORM_ref8
        | DW_FORM_ref_udata => SiblingForm::Ok,
        DW_FORM_ref_addr => SiblingForm::RefAddr,
        _ => SiblingForm::Bad,
    }
}

/// Parse the whole `.debug_abbrev` section into its chain of tables.
///
/// Tables come back in increasing section-offset order with their
/// abbreviations sorted by code. Any malformed field is fatal to the
/// whole section: without a trustworthy abbreviation chain there is no
/// point walking `.debug_info`.
pub fn load_abbrev_tables<Endian, W>(
    ctx: &mut ReadCtx<'_, Endian>,
    report: &mut Reporter<W>,
) -> Result<Vec<AbbrevTable>>
where
    Endian: Endianity,
    W: Write,
{
    let mut tables: Vec<AbbrevTable> = Vec::new();
    let mut cur: Option<AbbrevTable> = None;
    let mut section_off = 0u64;

    while !ctx.eof() {
        let mut abbr_off;
        let mut abbr_code;

        // Consume terminating zero codes. One ends the current table;
        // any further ones are padding. The run is remembered as the
        // offsets of its first and last zero codes.
        let mut zero_run: Option<(u64, u64, u32)> = None;
        loop {
            abbr_off = ctx.offset();
            abbr_code = checked_uleb128(
                ctx,
                report,
                &format!(".debug_abbrev: abbrev {:#x}", abbr_off),
                "abbrev code",
            )?;
            if abbr_code != 0 {
                break;
            }
            if let Some(table) = cur.take() {
                tables.push(table);
            }
            zero_run = match zero_run {
                None => Some((abbr_off, abbr_off, 1)),
                Some((start, _, count)) => Some((start, abbr_off, count + 1)),
            };
            if ctx.eof() {
                break;
            }
        }

        if let Some((start, last, count)) = zero_run {
            if count > 1 {
                report.padding_zero(
                    MC_ABBREVS,
                    start,
                    last - 1,
                    &format!(".debug_abbrev: abbrev {:#x}", section_off),
                );
            }
        }

        if abbr_code == 0 {
            // The zero run ran into the end of the section.
            break;
        }

        if cur.is_none() {
            section_off = abbr_off;
            cur = Some(AbbrevTable {
                offset: abbr_off,
                abbrevs: Vec::new(),
            });
        }
        let table = cur.as_mut().expect("a table is open");

        let whence = format!(".debug_abbrev: abbrev {:#x}", abbr_off);

        let tag = checked_uleb128(ctx, report, &whence, "abbrev tag")?;
        if tag > DW_TAG_hi_user.0 {
            report.error(&format!("{}: invalid abbrev tag {:#x}.", whence, tag));
            return Err(Error::InvalidTag);
        }

        let has_children = match ctx.read_u8() {
            Ok(byte) => byte,
            Err(e) => {
                report.error(&format!("{}: can't read abbrev has_children.", whence));
                return Err(e);
            }
        };
        if has_children != DW_CHILDREN_no.0 && has_children != DW_CHILDREN_yes.0 {
            report.error(&format!(
                "{}: invalid has_children value {:#x}.",
                whence, has_children
            ));
            return Err(Error::InvalidHasChildren(has_children));
        }
        let has_children = has_children == DW_CHILDREN_yes.0;

        let mut attributes = Vec::new();
        let mut sibling_attr: Option<u64> = None;
        loop {
            let attr_off = ctx.offset();
            let attr_whence = format!(
                ".debug_abbrev: abbrev {:#x}, attribute {:#x}",
                abbr_off, attr_off
            );

            let name = checked_uleb128(ctx, report, &attr_whence, "attribute name")?;
            let form = checked_uleb128(ctx, report, &attr_whence, "attribute form")?;

            // A (0, 0) pair ends the attribute list.
            if name == 0 && form == 0 {
                break;
            }

            if name > DW_AT_hi_user.0 {
                report.error(&format!("{}: invalid name {:#x}.", attr_whence, name));
                return Err(Error::InvalidAttributeName);
            }
            if !form_valid(DwForm(form)) {
                report.error(&format!("{}: invalid form {:#x}.", attr_whence, form));
                return Err(Error::InvalidAttributeForm);
            }

            // The DIE walker does structural sibling checking, so pin
            // down its assumptions while the abbreviation is loaded: at
            // most one DW_AT_sibling, and a CU-local reference form.
            if DwAt(name) == DW_AT_sibling {
                match sibling_attr {
                    Some(first) => report.error(&format!(
                        "{}: another DW_AT_sibling attribute in one abbreviation \
                         (first was {:#x}).",
                        attr_whence, first
                    )),
                    None => {
                        sibling_attr = Some(attr_off);
                        if !has_children {
                            report.message(
                                MC_DIE_REL_SIB | MC_ACC_BLOAT | MC_IMPACT_1,
                                &format!(
                                    "{}: excessive DW_AT_sibling attribute at childless abbrev.",
                                    attr_whence
                                ),
                            );
                        }
                    }
                }

                match classify_sibling_form(DwForm(form)) {
                    SiblingForm::Ok => {}
                    SiblingForm::RefAddr => report.message(
                        MC_DIE_REL_SIB | MC_IMPACT_2,
                        &format!(
                            "{}: DW_AT_sibling attribute with form DW_FORM_ref_addr.",
                            attr_whence
                        ),
                    ),
                    SiblingForm::Bad => report.error(&format!(
                        "{}: DW_AT_sibling attribute with non-reference form {}.",
                        attr_whence,
                        DwForm(form)
                    )),
                }
            }

            attributes.push(AbbrevAttribute {
                offset: attr_off,
                name: DwAt(name),
                form: DwForm(form),
            });
        }

        table.abbrevs.push(Abbrev {
            code: abbr_code,
            tag: DwTag(tag),
            has_children,
            used: Cell::new(false),
            attributes,
        });
    }

    if let Some(table) = cur.take() {
        tables.push(table);
    }

    // The input is usually sorted by code already, but nothing
    // guarantees it.
    for table in &mut tables {
        table.abbrevs.sort_by_key(|abbrev| abbrev.code);
        let table_off = table.offset;
        table.abbrevs.dedup_by(|a, b| {
            if a.code == b.code {
                report.error(&format!(
                    ".debug_abbrev: abbrev table {:#x}: duplicate abbreviation code {}.",
                    table_off, a.code
                ));
                true
            } else {
                false
            }
        });
    }

    Ok(tables)
}
