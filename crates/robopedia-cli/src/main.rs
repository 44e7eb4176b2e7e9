//! # robopedia
//!
//! Admin command line client for the robotics encyclopedia.
//!
//! This binary is **one client** of the `robopedia` crate. Everything that touches
//! records (caching, merging with the bundled dataset, slugs, backends) lives in the
//! library; this crate only parses arguments, picks a backend from configuration and
//! prints results.
//!
//! ## Flow
//!
//! ```text
//! argv ──► clap (cli/setup.rs)
//!            │
//!            ▼
//!        config (robopedia.toml + env) ──► backend selection
//!            │
//!            ▼
//!        RobopediaApi<B> ──► CmdResult ──► render.rs ──► stdout
//! ```
//!
//! ## Backends
//!
//! - `local`: JSON files under `data_dir`
//! - `github`: a GitHub repository, mirrored into `data_dir` for offline reads
//! - `firestore`: a Firestore project, mirrored the same way
//!
//! ## Auditing
//!
//! Every mutation that succeeds appends a line to the activity log, so the admin
//! panel shows the same history whichever client made the change.
//!
//! ## Exit Codes
//!
//! `0` on success, `1` on any error (bad input, duplicate slug, storage failure
//! while importing or exporting). A save that fails after an in-memory change is a
//! warning, not an error: the change is reported and can be retried with
//! `robopedia flush`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
