use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;

static PUNCT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"[\t !"#$%&'()*\-/<=>?@\[\\\]^_`{|},.]+"##).expect("punctuation pattern")
});

/// Turn free-text tags into lower-case ASCII keywords joined by single spaces.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut words = Vec::new();
    for word in PUNCT_RE.split(&lowered) {
        words.extend(deunicode(word).split_whitespace().map(str::to_owned));
    }
    words.join(" ")
}
