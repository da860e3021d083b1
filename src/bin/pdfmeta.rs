//! pdfmeta command line tool
//!
//! Usage:
//!   pdfmeta show --file report.pdf --json
//!   pdfmeta set --file report.pdf --in-place --title "Quarterly Report"
//!   pdfmeta batch --manifest jobs.json --continue-on-error
//!
//! Set `RUST_LOG=debug` for diagnostics on stderr.

use std::io;

fn main() {
    env_logger::init();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let code = pdfmeta::cli::run_from_args(std::env::args_os(), &mut stdout.lock(), &mut stderr.lock());
    std::process::exit(code);
}
