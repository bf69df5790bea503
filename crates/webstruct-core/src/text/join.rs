/// Characters that attach to the preceding token.
const NO_SPACE_BEFORE: &[&str] = &[",", ".", ";", ":", "!", "?", ")", "]", "}", "''"];
/// Characters that attach to the following token.
const NO_SPACE_AFTER: &[&str] = &["(", "[", "{", "``"];

/// Join tokens with spaces, without a space before closing punctuation or
/// after opening brackets.
///
/// ```
/// use webstruct_core::text::smart_join;
///
/// assert_eq!(smart_join(["Hello", ",", "(", "world", ")", "!"]), "Hello, (world)!");
/// ```
pub fn smart_join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    let mut glue_next = true;
    for token in tokens {
        let token = token.as_ref();
        if !glue_next && !NO_SPACE_BEFORE.contains(&token) {
            out.push(' ');
        }
        out.push_str(token);
        glue_next = NO_SPACE_AFTER.contains(&token);
    }
    out
}
