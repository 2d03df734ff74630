//! Primary entrypoint for the `relint` binary.

use anyhow::Result;

fn main() -> Result<()> {
    relint_cli::run()
}
