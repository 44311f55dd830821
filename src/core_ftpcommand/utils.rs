/// Splits a raw line into the upper-cased verb and its whitespace-separated arguments.
pub fn parse_command(line: &str) -> (String, Vec<String>) {
    let mut parts = line.split_whitespace();
    let verb = parts.next().map(|s| s.to_ascii_uppercase()).unwrap_or_default();
    let args = parts.map(String::from).collect();
    (verb, args)
}

/// Rebuilds a name that was split on whitespace, e.g. `my file.txt`.
pub fn join_args(args: &[String]) -> String {
    args.join(" ")
}

/// Quotes names containing spaces so listings stay unambiguous.
pub fn quote_name(name: &str) -> String {
    if name.contains(' ') {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}
