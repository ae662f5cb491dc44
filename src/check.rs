//! The section-level driver: wires the per-section checkers together in
//! dependency order for one file's worth of debug data.

use std::io::Write;

use crate::aranges::check_aranges;
use crate::endianity::Endianity;
use crate::info::{check_debug_info, Cu};
use crate::message::{Reporter, MC_ACC_SUBOPTIMAL, MC_ELF, MC_IMPACT_4};
use crate::pubnames::check_pubnames;
use crate::reader::ReadCtx;
use crate::abbrev::load_abbrev_tables;

/// The debug section contents of one file. Any section may be absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugSections<'input> {
    /// `.debug_abbrev` bytes.
    pub abbrev: Option<&'input [u8]>,
    /// `.debug_info` bytes.
    pub info: Option<&'input [u8]>,
    /// `.debug_str` bytes.
    pub strings: Option<&'input [u8]>,
    /// `.debug_aranges` bytes.
    pub aranges: Option<&'input [u8]>,
    /// `.debug_pubnames` bytes.
    pub pubnames: Option<&'input [u8]>,
}

/// Run the whole structural check pipeline over one file's sections.
///
/// `.debug_abbrev` is loaded first; with its table chain in hand,
/// `.debug_info` is walked into a unit list, which the aranges and
/// pubnames checks then resolve their back-references against. A fatal
/// failure upstream yields no unit list, and the downstream checks are
/// skipped. With `tolerate_nodebug`, files with no debug data at all
/// pass silently.
pub fn check_debug_sections<Endian, W>(
    sections: &DebugSections<'_>,
    endian: Endian,
    tolerate_nodebug: bool,
    report: &mut Reporter<W>,
)
where
    Endian: Endianity,
    W: Write,
{
    let mut tables = None;
    match sections.abbrev {
        Some(data) => {
            let mut ctx = ReadCtx::new(data, endian);
            tables = load_abbrev_tables(&mut ctx, report).ok();
        }
        // A hard error, not a message: nothing can be checked without
        // the abbreviations.
        None if !tolerate_nodebug => report.error(".debug_abbrev data not found."),
        None => {}
    }

    let mut cus: Option<Vec<Cu>> = None;
    if let Some(tables) = &tables {
        match (sections.info, sections.strings) {
            (Some(info), strings @ Some(_)) => {
                let mut ctx = ReadCtx::new(info, endian);
                cus = check_debug_info(&mut ctx, tables, strings, report);
            }
            _ if !tolerate_nodebug => {
                report.error(".debug_info or .debug_str data not found.")
            }
            _ => {}
        }
    }

    match sections.aranges {
        Some(data) => {
            if let Some(cus) = &cus {
                let mut ctx = ReadCtx::new(data, endian);
                check_aranges(&mut ctx, cus, report);
            }
        }
        None => report.message(
            MC_IMPACT_4 | MC_ACC_SUBOPTIMAL | MC_ELF,
            ".debug_aranges data not found.",
        ),
    }

    match sections.pubnames {
        Some(data) => {
            if let Some(cus) = &cus {
                let mut ctx = ReadCtx::new(data, endian);
                check_pubnames(&mut ctx, cus, report);
            }
        }
        None => report.message(
            MC_IMPACT_4 | MC_ACC_SUBOPTIMAL | MC_ELF,
            ".debug_pubnames data not found.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endianity::LittleEndian;
    use crate::message::{Reporter, MC_ELF};

    fn run(sections: &DebugSections<'_>, ignore_missing: bool) -> (String, u64) {
        let mut report = Reporter::new(Vec::new());
        if ignore_missing {
            report.reject_also(MC_ELF);
        }
        check_debug_sections(sections, LittleEndian, ignore_missing, &mut report);
        let errors = report.error_count();
        let out = String::from_utf8(report.into_inner()).unwrap();
        (out, errors)
    }

    #[test]
    fn test_no_sections_at_all() {
        let (out, errors) = run(&DebugSections::default(), false);
        assert_eq!(errors, 3);
        assert_eq!(
            out,
            "error: .debug_abbrev data not found.\n\
             error: .debug_aranges data not found.\n\
             error: .debug_pubnames data not found.\n"
        );
    }

    #[test]
    fn test_no_sections_tolerated() {
        let (out, errors) = run(&DebugSections::default(), true);
        assert_eq!(errors, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn test_missing_info_is_hard_error() {
        let abbrev = [0x01, 0x24, 0x00, 0x00, 0x00, 0x00];
        let sections = DebugSections {
            abbrev: Some(&abbrev),
            ..DebugSections::default()
        };
        let (out, _) = run(&sections, false);
        assert!(out.contains("error: .debug_info or .debug_str data not found.\n"));
    }

    #[test]
    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn test_full_pipeline_smoke() {
        // Code 1: DW_TAG_compile_unit, no children, DW_AT_name (strp).
        let abbrev = [
            0x01, 0x11, 0x00, 0x03, 0x0e, 0x00, 0x00,
            0x00,
        ];
        let strings = b"main\0";
        let info = [
            0x0d, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04,
            // DIE 0xb: name at .debug_str offset 0.
            0x01, 0x00, 0x00, 0x00, 0x00,
            0x00,
        ];
        let aranges = [
            0x1c, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x80, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let pubnames = [
            0x17, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // The unit is 0x11 bytes long, length field included.
            0x11, 0x00, 0x00, 0x00,
            0x0b, 0x00, 0x00, 0x00,
            b'm', b'a', b'i', b'n', 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let sections = DebugSections {
            abbrev: Some(&abbrev),
            info: Some(&info),
            strings: Some(strings),
            aranges: Some(&aranges),
            pubnames: Some(&pubnames),
        };
        let (out, errors) = run(&sections, false);
        assert_eq!(out, "");
        assert_eq!(errors, 0);
    }
}
