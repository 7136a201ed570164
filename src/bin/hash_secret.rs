//! Operator tool: prints the Argon2id PHC string to store in `users.secret_hash`.
//!
//! Reads one line from stdin so the secret never appears in shell history or `ps`:
//!
//! ```text
//! read -rs SECRET && printf '%s\n' "$SECRET" | hash_secret
//! UPDATE users SET secret_hash = '<output>' WHERE institutional_email = 'a@u.edu';
//! ```

use std::{
    io::{self, BufRead},
    process::ExitCode,
};

use campus_portal::security::hash_secret;

/// Takes the first line of `input` verbatim, minus its line terminator. Inner and
/// surrounding spaces are part of the secret. An empty line yields `None`.
fn read_secret(mut input: impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let secret = line.strip_suffix('\n').unwrap_or(&line);
    let secret = secret.strip_suffix('\r').unwrap_or(secret);
    Ok((!secret.is_empty()).then(|| secret.to_string()))
}

fn main() -> ExitCode {
    let secret = match read_secret(io::stdin().lock()) {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            eprintln!("usage: hash_secret < file-with-secret (one non-empty line)");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("cannot read stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    match hash_secret(&secret) {
        Ok(phc) => {
            println!("{phc}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("hashing failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_portal::security::{SecretCheck, verify_secret};

    #[test]
    fn test_reads_first_line_without_terminator() {
        assert_eq!(read_secret("right\n".as_bytes()).unwrap().as_deref(), Some("right"));
        assert_eq!(read_secret("right\r\nignored\n".as_bytes()).unwrap().as_deref(), Some("right"));
        assert_eq!(read_secret("no newline".as_bytes()).unwrap().as_deref(), Some("no newline"));
        assert_eq!(read_secret(" spaced out \n".as_bytes()).unwrap().as_deref(), Some(" spaced out "));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(read_secret("".as_bytes()).unwrap(), None);
        assert_eq!(read_secret("\n".as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_output_is_accepted_by_login_verification() {
        let secret = read_secret("initial-password\n".as_bytes()).unwrap().unwrap();
        let phc = hash_secret(&secret).unwrap();
        assert_eq!(verify_secret(&phc, "initial-password"), SecretCheck::Match);
        assert_eq!(verify_secret(&phc, "initial-password\n"), SecretCheck::Mismatch);
    }
}
