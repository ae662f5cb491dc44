//! Pedantic structural checking of DWARF debugging data stored in ELF
//! files.
//!
//! Given the raw bytes of the classic debug sections (`.debug_abbrev`,
//! `.debug_info`, `.debug_str`, `.debug_aranges`, `.debug_pubnames`),
//! the checker decodes them against the DWARF 2/3 encoding rules from
//! first principles — no DWARF library underneath — and reports every
//! structural violation it can find from the bytes alone: malformed
//! length fields, invalid abbreviation codes, dangling DIE references,
//! broken sibling chains, wasted string-table bytes, bad aranges
//! tuples, and so on.
//!
//! The crate ships a `dwarflint` binary that maps ELF files with
//! `object`/`memmap2` and feeds their sections through
//! [`check_debug_sections`]. Library users supply the section bytes
//! themselves:
//!
//! ```
//! use dwarflint::message::MC_ELF;
//! use dwarflint::{check_debug_sections, DebugSections, LittleEndian, Reporter};
//!
//! let mut report = Reporter::new(Vec::new());
//! report.reject_also(MC_ELF);
//! let sections = DebugSections {
//!     abbrev: Some(&[0x00]),
//!     ..DebugSections::default()
//! };
//! check_debug_sections(&sections, LittleEndian, true, &mut report);
//! assert_eq!(report.error_count(), 0);
//! ```
//!
//! Diagnostics are categorized ([`MessageCategory`]) along severity,
//! accuracy, and section-area axes, and filtered through the
//! [`Reporter`]'s accept/reject criteria before being rendered as
//! `error: ` / `warning: ` lines. Only errors decide the process exit
//! status.

#![deny(missing_docs)]

pub mod constants;
pub use crate::constants::*;

mod common;
pub use crate::common::Format;

mod endianity;
pub use crate::endianity::{BigEndian, Endianity, LittleEndian, NativeEndian, RunTimeEndian};

mod reader;
pub use crate::reader::{
    checked_sleb128, checked_uleb128, read_size_extra, read_version, Error, ReadCtx, Result,
    DWARF64_LENGTH, LENGTH_ESCAPE_LO,
};

pub mod message;
pub use crate::message::{MessageCategory, MessageCriteria, Reporter};

mod coverage;
pub use crate::coverage::Coverage;

mod record;
pub use crate::record::{AddrRecord, Ref, RefRecord};

mod abbrev;
pub use crate::abbrev::{load_abbrev_tables, Abbrev, AbbrevAttribute, AbbrevTable};

mod info;
pub use crate::info::{check_debug_info, Cu};

mod aranges;
pub use crate::aranges::check_aranges;

mod pubnames;
pub use crate::pubnames::check_pubnames;

mod check;
pub use crate::check::{check_debug_sections, DebugSections};
