//! Month and weekday names (English and Dutch) used by the date features.

/// Names and abbreviations of each month, January first.
pub const MONTHS: [&[&str]; 12] = [
    &["Jan", "January", "Januari", "jan."],
    &["Feb", "February", "Februari", "feb."],
    &["Mar", "Mrt", "Maart", "March", "mrt.", "maa.", "maa"],
    &["Apr", "April", "apr."],
    &["May", "Mei"],
    &["Jun", "June", "Juni", "jun."],
    &["Jul", "July", "Juli", "jul."],
    &["Aug", "August", "Augustus", "aug."],
    &["Sep", "September", "sep."],
    &["Okt", "Oct", "October", "Oktober", "okt."],
    &["Nov", "November", "nov."],
    &["Dec", "December", "dec."],
];

/// Names and abbreviations of each weekday, Monday first.
pub const WEEKDAYS: [&[&str]; 7] = [
    &["Mon", "Monday", "Maandag", "ma.", "ma"],
    &["Tue", "Tuesday", "Dinsdag", "di.", "di"],
    &["Wed", "Wednesday", "Woensdag", "wo.", "wo"],
    &["Thu", "Thursday", "Donderdag", "do.", "do"],
    &["Fri", "Friday", "Vrijdag", "vr.", "vr"],
    &["Sat", "Saturday", "Zaterdag", "za.", "za"],
    &["Sun", "Sunday", "Zondag", "zo.", "zo"],
];

fn position(table: &[&[&str]], word: &str) -> Option<usize> {
    table
        .iter()
        .position(|names| names.iter().any(|n| n.eq_ignore_ascii_case(word)))
}

/// 1-based month number of `word`, ignoring case.
pub fn month_number(word: &str) -> Option<usize> {
    position(&MONTHS, word).map(|i| i + 1)
}

/// 1-based weekday number of `word` (Monday is 1), ignoring case.
pub fn weekday_number(word: &str) -> Option<usize> {
    position(&WEEKDAYS, word).map(|i| i + 1)
}
