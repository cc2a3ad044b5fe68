use super::validation::RawForm;

/// Parse an `application/x-www-form-urlencoded` body. The first occurrence
/// of a repeated key wins.
pub fn parse_form(body: &[u8]) -> Result<RawForm, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    let mut map = RawForm::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        map.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }
    Ok(map)
}
