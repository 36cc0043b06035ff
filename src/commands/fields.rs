//! Extraction of `Field: value value ...` lines from comment bodies.

/// Collects the values of every line whose first word is `<field>:`.
///
/// The field name is matched ASCII case-insensitively. Each matching line
/// contributes all of its remaining whitespace-separated words, in order.
/// Lines with a field name but no values contribute nothing.
pub fn field_values(body: &str, field: &str) -> Vec<String> {
    let key = format!("{}:", field.to_lowercase());
    let mut values = Vec::new();

    for line in body.lines() {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            continue;
        };
        if first.to_lowercase() == key {
            values.extend(words.map(str::to_string));
        }
    }

    values
}

/// Skip patterns requested by a comment (`Skip-Check:` lines).
pub fn skip_checks(body: &str) -> Vec<String> {
    field_values(body, "Skip-Check")
}
