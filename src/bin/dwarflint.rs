//! Pedantic checking of DWARF stored in ELF files.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use getopts::Options;
use object::{Object, ObjectSection};

use dwarflint::message::{MC_ACC_BLOAT, MC_ELF, MC_STRINGS};
use dwarflint::{check_debug_sections, DebugSections, Reporter, RunTimeEndian};

fn print_usage(opts: &Options) -> ! {
    let program = env::args().next().unwrap_or_else(|| "dwarflint".into());
    let brief = format!("Usage: {} [options] FILE...", program);
    eprint!("{}", opts.usage(&brief));
    process::exit(2);
}

fn main() {
    let mut opts = Options::new();
    opts.optflag("", "strict", "Be extremely strict, flag level 2 features.");
    opts.optflag("q", "quiet", "Do not print anything if successful.");
    opts.optflag(
        "i",
        "ignore-missing",
        "Don't complain if files have no DWARF at all.",
    );
    opts.optflag(
        "",
        "gnu",
        "Binary has been created with GNU toolchain and is therefore known to be \
         broken in certain ways.",
    );
    opts.optflag("h", "help", "Print this help and exit.");

    let matches = match opts.parse(env::args().skip(1)) {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&opts);
        }
    };
    if matches.opt_present("help") {
        print_usage(&opts);
    }
    if matches.free.is_empty() {
        eprintln!("Missing file name.");
        print_usage(&opts);
    }

    let quiet = matches.opt_present("quiet");
    let tolerate_nodebug = matches.opt_present("ignore-missing");

    let stdout = io::stdout();
    let mut report = Reporter::new(io::BufWriter::new(stdout.lock()));
    if matches.opt_present("strict") {
        report.accept_also(MC_STRINGS);
    }
    if matches.opt_present("gnu") {
        report.reject_also(MC_ACC_BLOAT);
    }
    if tolerate_nodebug {
        report.reject_also(MC_ELF);
    }

    let only_one = matches.free.len() == 1;
    for path in &matches.free {
        if !only_one {
            report.plain(&format!("\n{}:", path));
        }

        let before = report.message_count();
        check_file(path, tolerate_nodebug, &mut report);
        if report.message_count() == before && !quiet {
            report.plain("No errors");
        }
    }

    report.flush();
    process::exit(if report.error_count() != 0 { 1 } else { 0 });
}

fn check_file<W: Write>(path: &str, tolerate_nodebug: bool, report: &mut Reporter<W>) {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            report.error(&format!("cannot open input file '{}': {}", path, e));
            return;
        }
    };
    let map = match unsafe { memmap2::Mmap::map(&file) } {
        Ok(map) => map,
        Err(e) => {
            report.error(&format!("cannot map input file '{}': {}", path, e));
            return;
        }
    };
    let object = match object::File::parse(&*map) {
        Ok(object) => object,
        Err(e) => {
            report.error(&format!("cannot parse '{}': {}", path, e));
            return;
        }
    };

    let endian = if object.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let section = |name| {
        object
            .section_by_name(name)
            .and_then(|section| section.data().ok())
    };
    let sections = DebugSections {
        abbrev: section(".debug_abbrev"),
        info: section(".debug_info"),
        strings: section(".debug_str"),
        aranges: section(".debug_aranges"),
        pubnames: section(".debug_pubnames"),
    };

    check_debug_sections(&sections, endian, tolerate_nodebug, report);
}
