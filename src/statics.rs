pub mod regexes {
    use crate::constants::TEXT_LITERAL_PATTERN;
    use regex::Regex;
    use std::sync::LazyLock;

    pub static TEXT_LITERAL_RE: LazyLock<Regex> =
        LazyLock::new(|| unsafe {
            Regex::new(TEXT_LITERAL_PATTERN).unwrap_unchecked()
        });
}
