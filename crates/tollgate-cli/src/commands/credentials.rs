//! `tollgate credentials hash`: produce an Argon2 PHC string for static users.

pub fn hash(password: &str) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("Refusing to hash an empty password");
    }
    let hash = tollgate_policy::hash_password(password)?;
    println!("{}", hash);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_password_rejected() {
        assert!(hash("").is_err());
    }

    #[test]
    fn test_hash_succeeds() {
        hash("correct horse battery staple").unwrap();
    }
}
