/// Case-insensitive banned-term check applied to argument text.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    banned: Vec<String>,
}

impl ContentFilter {
    pub fn new<I, S>(banned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned = banned
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { banned }
    }

    /// First banned term found in `text`, if any.
    pub fn find_banned(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.banned
            .iter()
            .find(|w| lowered.contains(w.as_str()))
            .map(String::as_str)
    }

    pub fn is_clean(&self, text: &str) -> bool {
        self.find_banned(text).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ContentFilter {
        ContentFilter::new(["stupid", "idiot", "dumb"])
    }

    #[test]
    fn rejects_banned_terms_regardless_of_case() {
        let f = filter();
        assert!(!f.is_clean("That is STUPID"));
        assert_eq!(f.find_banned("what an Idiot move"), Some("idiot"));
    }

    #[test]
    fn matches_substrings() {
        assert_eq!(filter().find_banned("dumbfounded"), Some("dumb"));
    }

    #[test]
    fn accepts_clean_and_empty_text() {
        let f = filter();
        assert!(f.is_clean("Nuclear power is a reliable baseload source."));
        assert!(f.is_clean(""));
    }

    #[test]
    fn blank_entries_are_ignored() {
        let f = ContentFilter::new(["", "  ", "Rude"]);
        assert!(f.is_clean("anything at all"));
        assert!(!f.is_clean("so rude"));
    }
}
