//! # dupfree CLI
//!
//! Command-line interface for the duplicate finder.
//!
//! ## Usage
//! ```bash
//! dupfree duplicates ~/Photos ~/Backup --max-files 500
//! dupfree similar ~/Photos --similarity 95 --output json
//! ```

mod cli;

use dupfree::Result;

fn main() -> Result<()> {
    cli::run()
}
