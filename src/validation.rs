use lazy_static::lazy_static;
use regex::Regex;

const PASSWORD_SPECIALS: &str = "@$!%*#?&";

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]{3,31}$").unwrap();
    static ref PASSWORD_RE: Regex = Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,255}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"(?i)^[a-z ,.'-]+$").unwrap();
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// 8 to 255 characters with at least one letter, one digit and one of `@$!%*#?&`.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_first_name(first_name: &str) -> bool {
    is_valid_name(first_name)
}

pub fn is_valid_last_name(last_name: &str) -> bool {
    is_valid_name(last_name)
}

fn is_valid_name(name: &str) -> bool {
    name.len() <= 255 && NAME_RE.is_match(name)
}
