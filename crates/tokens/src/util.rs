use crate::JsonError;

/// Finds the index of the closing `"` of a string whose body starts at `x`,
/// skipping escaped characters.
pub(crate) fn find_ending_quote(data: &[u8], x: usize) -> Result<usize, JsonError> {
    let mut i = x;
    while i < data.len() {
        match data[i] {
            b'"' => return Ok(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    Err(JsonError::UnexpectedEnd)
}

/// Decode a JSON string body (between the quotes) handling escape sequences.
pub(crate) fn decode_json_string(bytes: &[u8]) -> Result<String, JsonError> {
    // Fast path: no backslash
    if !bytes.contains(&b'\\') {
        return std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| JsonError::InvalidUtf8);
    }
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    quoted.extend_from_slice(bytes);
    quoted.push(b'"');
    let s: String = serde_json::from_slice(&quoted)?;
    Ok(s)
}

/// Append `s` to `out` as a quoted, escaped JSON string.
pub(crate) fn push_json_string(out: &mut String, s: &str) -> Result<(), JsonError> {
    // Fast path: printable ASCII, no quotes or backslash
    let plain = s
        .bytes()
        .all(|b| (32..=126).contains(&b) && b != b'"' && b != b'\\');
    if plain {
        out.reserve(s.len() + 2);
        out.push('"');
        out.push_str(s);
        out.push('"');
        return Ok(());
    }
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

/// Shortest representation that reads back as a double (integral values keep
/// a `.0` suffix).
pub(crate) fn format_double(value: f64) -> Result<String, JsonError> {
    if !value.is_finite() {
        return Err(JsonError::NonFiniteNumber(value));
    }
    Ok(format!("{value:?}"))
}
