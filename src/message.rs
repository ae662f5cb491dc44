//! The diagnostic taxonomy and the reporter the whole pipeline writes to.
//!
//! Every finding carries a [`MessageCategory`] bitmask combining three
//! orthogonal axes: severity (`MC_IMPACT_1` through `MC_IMPACT_4`),
//! accuracy (`MC_ACC_BLOAT`, `MC_ACC_SUBOPTIMAL`), and the area of the
//! debug data it concerns (`MC_LEB128`, `MC_ABBREVS`, ...). The
//! [`Reporter`] filters findings against an accept/reject criteria pair,
//! renders the survivors as `error: ` or `warning: ` lines, and keeps the
//! error counter that decides the process exit status.

#![allow(missing_docs)]

use std::io::Write;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A bitmask categorizing one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCategory(pub u32);

// Severity.
pub const MC_NONE: MessageCategory = MessageCategory(0);
/// No impact on the consumer.
pub const MC_IMPACT_1: MessageCategory = MessageCategory(0x1);
/// Still no impact, but suspicious or worth mentioning.
pub const MC_IMPACT_2: MessageCategory = MessageCategory(0x2);
/// Some impact.
pub const MC_IMPACT_3: MessageCategory = MessageCategory(0x4);
/// High impact.
pub const MC_IMPACT_4: MessageCategory = MessageCategory(0x8);
pub const MC_IMPACT_ALL: MessageCategory = MessageCategory(0xf);

// Accuracy.
/// Unnecessary constructs (e.g. unreferenced strings).
pub const MC_ACC_BLOAT: MessageCategory = MessageCategory(0x10);
/// Suboptimal construct (e.g. lack of siblings).
pub const MC_ACC_SUBOPTIMAL: MessageCategory = MessageCategory(0x20);
pub const MC_ACC_ALL: MessageCategory = MessageCategory(0x30);

/// Escalates the message to error status.
pub const MC_ERROR: MessageCategory = MessageCategory(0x40);

// Area.
/// ULEB/SLEB storage.
pub const MC_LEB128: MessageCategory = MessageCategory(0x100);
/// Abbreviations and abbreviation tables.
pub const MC_ABBREVS: MessageCategory = MessageCategory(0x200);
/// DIE sibling relationship.
pub const MC_DIE_REL_SIB: MessageCategory = MessageCategory(0x1000);
/// DIE parent/child relationship.
pub const MC_DIE_REL_CHILD: MessageCategory = MessageCategory(0x2000);
/// DIE relationship by reference.
pub const MC_DIE_REL_REF: MessageCategory = MessageCategory(0x4000);
/// Other messages related to DIEs and `.debug_info` tables.
pub const MC_DIE_OTHER: MessageCategory = MessageCategory(0x8000);
pub const MC_DIE_ALL: MessageCategory = MessageCategory(0xf000);
/// The string table.
pub const MC_STRINGS: MessageCategory = MessageCategory(0x1_0000);
/// The address ranges table.
pub const MC_ARANGES: MessageCategory = MessageCategory(0x2_0000);
/// ELF structure, e.g. missing optional sections.
pub const MC_ELF: MessageCategory = MessageCategory(0x4_0000);
/// The table of public names.
pub const MC_PUBNAMES: MessageCategory = MessageCategory(0x8_0000);
/// Messages unrelated to any of the above.
pub const MC_OTHER: MessageCategory = MessageCategory(0x10_0000);
/// All areas.
pub const MC_ALL: MessageCategory = MessageCategory(0xff_ff00);

impl MessageCategory {
    /// Return true if the two masks share any bit.
    #[inline]
    pub fn intersects(self, other: MessageCategory) -> bool {
        self.0 & other.0 != 0
    }

    /// Return `self` with every bit of `other` cleared.
    #[inline]
    pub fn without(self, other: MessageCategory) -> MessageCategory {
        MessageCategory(self.0 & !other.0)
    }
}

impl BitOr for MessageCategory {
    type Output = MessageCategory;
    #[inline]
    fn bitor(self, rhs: MessageCategory) -> MessageCategory {
        MessageCategory(self.0 | rhs.0)
    }
}

impl BitOrAssign for MessageCategory {
    #[inline]
    fn bitor_assign(&mut self, rhs: MessageCategory) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for MessageCategory {
    type Output = MessageCategory;
    #[inline]
    fn bitand(self, rhs: MessageCategory) -> MessageCategory {
        MessageCategory(self.0 & rhs.0)
    }
}

/// An accept/reject filter over message categories.
///
/// A category passes when it intersects `accept` and does not intersect
/// `reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCriteria {
    /// `cat & accept` must be nonzero.
    pub accept: MessageCategory,
    /// `cat & reject` must be zero.
    pub reject: MessageCategory,
}

impl MessageCriteria {
    /// Test a category against the criteria.
    #[inline]
    pub fn accepts(&self, cat: MessageCategory) -> bool {
        self.accept.intersects(cat) && !self.reject.intersects(cat)
    }
}

/// Collects and renders the checker's diagnostics.
///
/// Findings are filtered against the warning criteria; survivors whose
/// category also passes the error criteria are printed with an `error: `
/// prefix and bump the error counter, the rest with `warning: `. The
/// checkers also call [`Reporter::error`] directly for findings that are
/// errors unconditionally.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    warning_criteria: MessageCriteria,
    error_criteria: MessageCriteria,
    error_count: u64,
    message_count: u64,
    out: W,
}

impl<W: Write> Reporter<W> {
    /// Construct a reporter with the default criteria: all areas except
    /// the string table are accepted, nothing is rejected, and impact-4
    /// or explicitly error-flagged messages print as errors.
    pub fn new(out: W) -> Reporter<W> {
        Reporter {
            warning_criteria: MessageCriteria {
                accept: MC_ALL.without(MC_STRINGS),
                reject: MC_NONE,
            },
            error_criteria: MessageCriteria {
                accept: MessageCategory(MC_IMPACT_4.0 | MC_ERROR.0),
                reject: MC_NONE,
            },
            error_count: 0,
            message_count: 0,
            out,
        }
    }

    /// Additionally accept messages matching `cat`.
    pub fn accept_also(&mut self, cat: MessageCategory) {
        self.warning_criteria.accept |= cat;
    }

    /// Additionally reject messages matching `cat`.
    pub fn reject_also(&mut self, cat: MessageCategory) {
        self.warning_criteria.reject |= cat;
    }

    /// Would a message of this category be printed at all?
    ///
    /// Lets producers skip work (e.g. strings coverage tracking) whose
    /// only purpose is a message that would be filtered out anyway.
    #[inline]
    pub fn accepts(&self, cat: MessageCategory) -> bool {
        self.warning_criteria.accepts(cat)
    }

    /// Print an unconditional error and bump the error counter.
    pub fn error(&mut self, msg: &str) {
        self.error_count += 1;
        self.message_count += 1;
        let _ = writeln!(self.out, "error: {}", msg);
    }

    /// Print an unconditional warning.
    pub fn warning(&mut self, msg: &str) {
        self.message_count += 1;
        let _ = writeln!(self.out, "warning: {}", msg);
    }

    /// Print a categorized message, subject to the criteria filters.
    pub fn message(&mut self, cat: MessageCategory, msg: &str) {
        if self.warning_criteria.accepts(cat) {
            if self.error_criteria.accepts(cat) {
                self.error(msg);
            } else {
                self.warning(msg);
            }
        }
    }

    /// Report a range of superfluous zero bytes.
    pub fn padding_zero(&mut self, cat: MessageCategory, begin: u64, end: u64, whence: &str) {
        self.message(
            cat | MC_ACC_BLOAT | MC_IMPACT_1,
            &format!(
                "{}: {:#x}..{:#x}: unnecessary padding with zero bytes.",
                whence, begin, end
            ),
        );
    }

    /// Report a range of unconsumed bytes that are not all zero.
    pub fn padding_nonzero(&mut self, cat: MessageCategory, begin: u64, end: u64, whence: &str) {
        self.message(
            cat | MC_ACC_BLOAT | MC_IMPACT_2,
            &format!(
                "{}: {:#x}..{:#x}: unreferenced non-zero bytes.",
                whence, begin, end
            ),
        );
    }

    /// Print a line verbatim, outside the error/warning accounting.
    pub fn plain(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
    }

    /// Number of errors printed so far.
    #[inline]
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Number of errors and warnings printed so far.
    #[inline]
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }

    /// Consume the reporter and return the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
