//! Print the argon2 hash to use as `ADMIN_PASSWORD_HASH`.
//!
//! The password is taken from the first argument, or read from stdin when no
//! argument is given so it stays out of shell history.

use std::io::{self, BufRead};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        return Err("password must not be empty".into());
    }

    println!("{}", be_auth_core::hash_password(&password)?);
    Ok(())
}
