/// Normalize crate name by replacing hyphens with underscores (Cargo convention)
pub fn normalize_crate_name(name: &str) -> String {
    name.replace('-', "_")
}

/// `1 record`, `2 records`
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
