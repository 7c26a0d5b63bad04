//! scribe: manuscript assistant and knowledge-vault agent.

use anyhow::Result;

fn main() -> Result<()> {
    scribe::cli::run()
}
