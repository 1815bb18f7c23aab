//! Credential prompt on the terminal

use rb_client::{CredentialPrompt, Credentials};
use std::io::{self, BufRead, Write};

/// Asks for username and password on stderr, reads them from stdin
pub struct TerminalPrompt {
    username: Option<String>,
}

impl TerminalPrompt {
    /// `username` from the config skips the login question
    pub fn new(username: Option<String>) -> Self {
        Self { username }
    }

    fn ask(question: &str) -> Option<String> {
        eprint!("{}", question);
        io::stderr().flush().ok()?;

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn credentials(&self) -> Option<Credentials> {
        let username = match &self.username {
            Some(username) => username.clone(),
            None => Self::ask("login: ")?,
        };
        let password = Self::ask("password: ")?;
        Some(Credentials::new(username, password))
    }
}
