use std::borrow::Cow;

const TOKEN_FIELDS: [&str; 4] = ["access_token", "refresh_token", "accessToken", "refreshToken"];

/// Replaces the value of JSON-ish `"access_token": "..."` style fields.
pub fn redact_token_fields(input: &str) -> Cow<'_, str> {
    let mut redacted = input.to_string();

    for field in TOKEN_FIELDS {
        let key = format!("\"{field}\"");
        if !redacted.contains(&key) {
            continue;
        }
        let mut out = String::with_capacity(redacted.len());
        let mut rest = redacted.as_str();
        while let Some(idx) = rest.find(&key) {
            out.push_str(&rest[..idx + key.len()]);
            rest = &rest[idx + key.len()..];

            // Keep the separator, then swallow the quoted value.
            let sep_len = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_whitespace() || *ch == ':'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            out.push_str(&rest[..sep_len]);
            rest = &rest[sep_len..];

            let Some(value) = rest.strip_prefix('"') else {
                continue;
            };
            let end = value.find('"').unwrap_or(value.len());
            out.push_str("\"REDACTED\"");
            rest = value.get(end + 1..).unwrap_or("");
        }
        out.push_str(rest);
        redacted = out;
    }

    if redacted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(redacted)
    }
}

/// Replaces the credential after any inline `Bearer ` marker.
pub fn redact_bearer(input: &str) -> Cow<'_, str> {
    const MARKER: &str = "Bearer ";
    if !input.contains(MARKER) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = rest.find(MARKER) {
        out.push_str(&rest[..idx + MARKER.len()]);
        rest = &rest[idx + MARKER.len()..];

        let mut consumed = 0;
        for ch in rest.chars() {
            if ch.is_whitespace() || ch == '"' || ch == ',' || ch == ';' {
                break;
            }
            consumed += ch.len_utf8();
        }
        if consumed > 0 {
            out.push_str("REDACTED");
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);

    if out == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(out)
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() {
        return Some(0);
    }
    if nee.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

fn redact_header_value(text: String, header: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    loop {
        let Some(idx) = find_ascii_case_insensitive(rest, header) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        // Header name is copied as-is from the input.
        out.push_str(&rest[..header.len()]);
        rest = &rest[header.len()..];

        if let Some(first) = rest.chars().next() {
            if first == ' ' {
                out.push(' ');
                rest = &rest[first.len_utf8()..];
            }
        }

        let consumed = rest.find(|ch: char| ch == '\n' || ch == '\r').unwrap_or(rest.len());
        out.push_str(replacement);
        rest = &rest[consumed..];
    }
    out
}

/// Redacts everything that could leak a session credential into logs or
/// terminal output.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = redact_token_fields(input).into_owned();
    value = redact_header_value(value, "Authorization:", "REDACTED");
    value = redact_bearer(&value).into_owned();

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
