//! `tollgate secret generate`: create a random HS256 signing secret.

use std::path::PathBuf;
use tollgate_token::SigningSecret;

pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let secret = SigningSecret::generate();

    match output {
        Some(path) => {
            secret.save_to_file(&path)?;
            println!("✔ Signing secret written to: {}", path.display());
            println!();
            println!("⚠️  Keep this file private. Anyone holding it can mint tokens.");
            println!();
            println!("Reference it from tollgate.yaml:");
            println!("  token:");
            println!("    secret_file: {}", path.display());
        }
        None => println!("{}", secret.expose()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_secret_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.secret");
        generate(Some(path.clone())).unwrap();

        let loaded = SigningSecret::load_from_file(&path).unwrap();
        assert_eq!(loaded.expose().len(), 43);
    }
}
