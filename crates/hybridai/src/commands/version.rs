pub fn run() -> anyhow::Result<()> {
    println!("hybridai {}", env!("CARGO_PKG_VERSION"));
    println!("Hybrid local/remote inference orchestration for wearable assistants");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let result = run();
        assert!(result.is_ok());
    }
}
