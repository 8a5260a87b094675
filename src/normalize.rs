use uuid::Uuid;

///Canonicalizes a 32 hex digit identifier into the lowercase hyphenated
///8-4-4-4-12 form. Hyphens in the input are ignored, as is case. Anything
///that is not 32 hex digits is returned unchanged.
pub fn canonical_uuid(raw: &str) -> String {
    let simple: String = raw.chars().filter(|character| *character != '-').collect();
    if simple.len() != 32 || !simple.chars().all(|character| character.is_ascii_hexdigit()) {
        return raw.to_owned();
    }
    match Uuid::try_parse(&simple) {
        Ok(uuid) => uuid.as_hyphenated().to_string(),
        Err(_) => raw.to_owned(),
    }
}

///Splits a comma separated email field, trimming whitespace and dropping
///empty entries.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_owned())
        .collect()
}
