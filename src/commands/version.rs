use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("statusboard {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
