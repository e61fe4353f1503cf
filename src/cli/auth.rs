//! Keyring setup for the API key

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::core::credentials::{CredentialStore, API_KEY_ENV};

pub fn run_auth<R: BufRead>(store: &CredentialStore, input: &mut R) -> Result<(), Box<dyn Error>> {
    print!("Enter your Groq API key: ");
    io::stdout().flush()?;

    let token = read_token(input)?;
    store.store(&token)?;
    println!("✓ API key stored in the system keyring");
    if std::env::var_os(API_KEY_ENV).is_some() {
        println!("⚠️  {API_KEY_ENV} is set and takes precedence over the stored key.");
    }
    Ok(())
}

pub fn run_deauth(store: &CredentialStore) -> Result<(), Box<dyn Error>> {
    if store.remove()? {
        println!("✓ API key removed from the system keyring");
    } else {
        println!("No stored API key found");
    }
    Ok(())
}

fn read_token<R: BufRead>(input: &mut R) -> Result<String, Box<dyn Error>> {
    let mut token = String::new();
    input.read_line(&mut token)?;
    let token = token.trim();

    if token.is_empty() {
        return Err("API key cannot be empty".into());
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn token_is_trimmed() {
        let mut input = Cursor::new("  gsk_123  \n");
        assert_eq!(read_token(&mut input).unwrap(), "gsk_123");
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut input = Cursor::new("\n");
        let err = read_token(&mut input).unwrap_err();
        assert_eq!(err.to_string(), "API key cannot be empty");
    }

    #[test]
    fn auth_round_trip_without_keyring() {
        let store = CredentialStore::new_with_keyring(false);
        run_auth(&store, &mut Cursor::new("gsk_abc\n")).unwrap();
        run_deauth(&store).unwrap();
        assert!(run_auth(&store, &mut Cursor::new("")).is_err());
    }
}
