use std::io::{self, BufRead, Write};

use neologin_core::Prompt;

/// Reads the username from stdin and the password without echo.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn username(&mut self, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(name) => print!("username [{}]: ", name),
            None => print!("username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(resolve_username(&input, default))
    }

    fn password(&mut self) -> io::Result<String> {
        rpassword::prompt_password("password: ")
    }

    fn notice(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Empty input accepts the offered default.
fn resolve_username(input: &str, default: Option<&str>) -> String {
    let input = input.trim();
    match default {
        Some(name) if input.is_empty() => name.to_string(),
        _ => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_username() {
        assert_eq!(resolve_username("  alice \n", None), "alice");
        assert_eq!(resolve_username("\n", Some("bob")), "bob");
        assert_eq!(resolve_username("carol\n", Some("bob")), "carol");
        assert_eq!(resolve_username("\n", None), "");
    }
}
