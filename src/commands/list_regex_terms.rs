use kfind_search::REGEX_TERMS;

pub fn run() {
    let width = REGEX_TERMS
        .iter()
        .map(|term| term.description.len())
        .max()
        .unwrap_or(0);
    for term in REGEX_TERMS {
        println!("{:<width$}  {}", term.description, term.fragment);
    }
}
