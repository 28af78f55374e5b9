use crate::gazetteer::Gazetteer;

/// Finds candidate place names in article text.
pub trait LocationExtractor: Send + Sync {
    /// Distinct candidate names found in `text`. Empty when nothing matches.
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Naive substring matcher over a [`Gazetteer`]. No tokenization: a name
/// matches anywhere it occurs, including inside longer words.
#[derive(Debug, Clone, Default)]
pub struct GazetteerExtractor {
    gazetteer: Gazetteer,
}

impl GazetteerExtractor {
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self { gazetteer }
    }
}

impl LocationExtractor for GazetteerExtractor {
    /// Matches come back in gazetteer order; entries are unique so the
    /// result is too.
    fn extract(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        if haystack.trim().is_empty() {
            return Vec::new();
        }

        self.gazetteer
            .entries()
            .iter()
            .filter(|entry| haystack.contains(entry.name.as_str()))
            .map(|entry| entry.name.clone())
            .collect()
    }
}

/// The text scanned for an article: title, then body.
pub fn article_text(title: &str, body: &str) -> String {
    let mut text = String::with_capacity(title.len() + body.len() + 1);
    text.push_str(title);
    text.push('\n');
    text.push_str(body);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::AdminLevel;

    fn extractor(names: &[&str]) -> GazetteerExtractor {
        GazetteerExtractor::new(Gazetteer::from_pairs(
            names.iter().map(|n| (*n, AdminLevel::District)),
        ))
    }

    #[test]
    fn finds_names_in_title_and_body() {
        let ex = extractor(&["당진", "태안", "여수"]);
        let text = article_text("당진 LNG 발전소 논란", "태안 주민들이 반대 집회를 열었다.");
        assert_eq!(ex.extract(&text), vec!["당진".to_string(), "태안".to_string()]);
    }

    #[test]
    fn repeated_mentions_yield_one_candidate() {
        let ex = extractor(&["당진"]);
        assert_eq!(ex.extract("당진, 당진, 또 당진"), vec!["당진".to_string()]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let ex = extractor(&["Gangnam"]);
        assert_eq!(ex.extract("Protest in GANGNAM today"), vec!["gangnam".to_string()]);
    }

    #[test]
    fn matches_inside_longer_words() {
        let ex = extractor(&["당진"]);
        assert_eq!(ex.extract("당진시청"), vec!["당진".to_string()]);
    }

    #[test]
    fn no_match_is_empty() {
        let ex = extractor(&["당진"]);
        assert!(ex.extract("정부, 전력수급 기본계획 발표").is_empty());
    }

    #[test]
    fn empty_and_blank_text_is_empty() {
        let ex = GazetteerExtractor::default();
        assert!(ex.extract("").is_empty());
        assert!(ex.extract(&article_text("", "")).is_empty());
        assert!(ex.extract("   \n\t").is_empty());
    }

    #[test]
    fn tolerates_punctuation_and_mixed_scripts() {
        let ex = GazetteerExtractor::default();
        let found = ex.extract("【속보】“울진”原電 — Busan!!! 🚧 (2.5GW) <b>서귀포</b>");
        assert!(found.contains(&"울진".to_string()));
        assert!(found.contains(&"busan".to_string()));
        assert!(found.contains(&"서귀포".to_string()));
    }

    #[test]
    fn overlapping_names_both_match() {
        let ex = extractor(&["서귀포", "제주"]);
        let found = ex.extract("제주 서귀포 해상풍력");
        assert_eq!(found.len(), 2);
    }
}
