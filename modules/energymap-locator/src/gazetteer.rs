//! Hand-maintained list of administrative place names used for keyword
//! spotting in article text.
//!
//! Names that collide with common words (영광 "glory", 예산 "budget", 양산
//! "mass production", ...) are listed with their administrative suffix so the
//! substring match stays usable.

use std::collections::HashSet;
use std::path::Path;

use energymap_common::EnergyMapError;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// 도 / 특별시 / 광역시 / 특별자치시
    Province,
    /// 시 / 군 / 구
    District,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazetteerEntry {
    /// Case-normalized name, matched as a substring.
    pub name: String,
    pub level: AdminLevel,
}

const PROVINCES: &[&str] = &[
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종",
    "경기", "강원", "충북", "충남", "전북", "전남", "경북", "경남", "제주",
    "충청북도", "충청남도", "전라북도", "전라남도", "경상북도", "경상남도",
    "seoul", "busan", "daegu", "incheon", "gwangju", "daejeon", "ulsan", "sejong",
    "gyeonggi", "gangwon", "jeju",
];

const DISTRICTS: &[&str] = &[
    // Coal, LNG and nuclear host cities/counties
    "당진", "태안", "보령", "서천", "서산", "삼척", "동해", "강릉", "울진", "영덕",
    "경주시", "포항", "기장군", "울주", "영광군", "고창", "부안", "여수", "광양",
    "하동", "고성군", "사천", "통영", "거제", "평택", "화성", "옹진", "김포", "파주",
    "안산", "시흥", "여주", "양주시",
    // Renewables and transmission
    "신안", "해남", "진도군", "완도", "서귀포", "밀양", "청송", "영양군", "정선",
    "태백", "영월", "양양", "속초", "춘천", "원주",
    // Other frequently reported cities/counties
    "천안", "아산", "홍성", "예산군", "공주시", "음성군", "진천", "충주", "제천",
    "단양", "목포", "나주", "순천", "구미", "안동", "상주시", "창원", "김해", "양산시",
    // Seoul districts
    "강남", "서초", "송파", "마포", "영등포", "용산", "gangnam",
];

#[derive(Debug, Clone)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Gazetteer {
    /// The compiled-in Korean gazetteer.
    pub fn builtin() -> Self {
        let entries = PROVINCES
            .iter()
            .map(|name| (*name, AdminLevel::Province))
            .chain(DISTRICTS.iter().map(|name| (*name, AdminLevel::District)));
        Self::from_pairs(entries)
    }

    /// Build from `(name, level)` pairs. Names are case-normalized and
    /// trimmed; blanks and repeats are dropped, first occurrence wins.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, AdminLevel)>,
    {
        let mut seen = HashSet::new();
        let entries = pairs
            .into_iter()
            .filter_map(|(name, level)| {
                let name = normalize(name);
                if name.is_empty() || !seen.insert(name.clone()) {
                    return None;
                }
                Some(GazetteerEntry { name, level })
            })
            .collect();
        Self { entries }
    }

    /// Parse a TOML list of entries:
    ///
    /// ```toml
    /// [[entry]]
    /// name = "당진"
    /// level = "district"
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self, EnergyMapError> {
        #[derive(Deserialize)]
        struct GazetteerFile {
            #[serde(default)]
            entry: Vec<EntrySpec>,
        }

        #[derive(Deserialize)]
        struct EntrySpec {
            name: String,
            level: AdminLevel,
        }

        let file: GazetteerFile = toml::from_str(raw)
            .map_err(|e| EnergyMapError::Config(format!("Invalid gazetteer: {e}")))?;

        if let Some(blank) = file.entry.iter().position(|e| e.name.trim().is_empty()) {
            return Err(EnergyMapError::Config(format!(
                "Invalid gazetteer: entry {} has an empty name",
                blank + 1
            )));
        }

        Ok(Self::from_pairs(
            file.entry.iter().map(|e| (e.name.as_str(), e.level)),
        ))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EnergyMapError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EnergyMapError::Config(format!("Cannot read gazetteer {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn entries(&self) -> &[GazetteerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case normalization shared by entries and scanned text.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_both_levels() {
        let g = Gazetteer::builtin();
        assert!(g.entries().iter().any(|e| e.level == AdminLevel::Province));
        assert!(g.entries().iter().any(|e| e.level == AdminLevel::District));
        assert!(g.entries().iter().any(|e| e.name == "당진"));
    }

    #[test]
    fn builtin_names_are_unique_and_normalized() {
        let g = Gazetteer::builtin();
        let unique: HashSet<_> = g.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(unique.len(), g.len());
        assert!(g.entries().iter().all(|e| e.name == normalize(&e.name)));
    }

    #[test]
    fn from_pairs_dedupes_and_lowercases() {
        let g = Gazetteer::from_pairs([
            ("Seoul", AdminLevel::Province),
            (" seoul ", AdminLevel::District),
            ("", AdminLevel::District),
        ]);
        assert_eq!(g.len(), 1);
        assert_eq!(g.entries()[0].name, "seoul");
        assert_eq!(g.entries()[0].level, AdminLevel::Province);
    }

    #[test]
    fn parses_toml_list() {
        let g = Gazetteer::from_toml_str(
            r#"
            [[entry]]
            name = "당진"
            level = "district"

            [[entry]]
            name = "충청남도"
            level = "province"
            "#,
        )
        .unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.entries()[1].level, AdminLevel::Province);
    }

    #[test]
    fn toml_with_blank_name_is_rejected() {
        let err = Gazetteer::from_toml_str(
            r#"
            [[entry]]
            name = "  "
            level = "district"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, EnergyMapError::Config(_)));
    }

    #[test]
    fn toml_with_unknown_level_is_rejected() {
        let result = Gazetteer::from_toml_str(
            r#"
            [[entry]]
            name = "당진"
            level = "village"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_toml_is_empty_gazetteer() {
        let g = Gazetteer::from_toml_str("").unwrap();
        assert!(g.is_empty());
    }
}
