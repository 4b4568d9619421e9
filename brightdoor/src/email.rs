//! Email syntax check matching the host form platform's own validation, so
//! an address accepted by the form is accepted here and vice versa.

const MIN_LENGTH: usize = 6;

// Characters that surround a value but are not part of it.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

pub fn is_email(candidate: &str) -> bool {
    if candidate.len() < MIN_LENGTH {
        return false;
    }

    // The local part needs at least one character.
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }

    if !local.chars().all(is_local_char) {
        return false;
    }

    if domain.contains("..") {
        return false;
    }
    if domain.trim_matches(|c| c == '.' || TRIM_CHARS.contains(&c)) != domain {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        label.trim_matches(|c| c == '-' || TRIM_CHARS.contains(&c)) == *label
            && !label.is_empty()
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
}
