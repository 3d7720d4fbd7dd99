pub mod cache;
pub mod db;
pub mod knowledge;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod provider;
pub mod resolver;

use serde::{Deserialize, Serialize};

// Candidate/job attribute records as delivered by the upstream parsing
// service. Every optional field carries an explicit presence marker; scorers
// treat `None` as "data missing", never as zero.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Option<String>,
    #[serde(default)]
    pub experiences: Vec<ExperienceEntry>,
    pub degree: Option<String>,
    #[serde(default)]
    pub hard_skills: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageSkill>,
    pub wants_remote: Option<bool>,
    pub min_salary: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub required_experiences: Vec<ExperienceRequirement>,
    pub required_degree: Option<String>,
    #[serde(default)]
    pub hard_skills: Vec<SkillRequirement>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<LanguageRequirement>,
    pub offers_remote: Option<bool>,
    pub salary: Option<f64>,
}

/// One past position on the candidate side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub months: i32,
}

/// One experience requirement on the job side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRequirement {
    pub title: String,
    pub months: i32,
    #[serde(default)]
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    #[serde(default)]
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub language: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageRequirement {
    pub language: String,
    pub level: String,
    /// Required languages are scored harder than merely preferred ones.
    #[serde(default)]
    pub importance: Importance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Required,
    Preferred,
}

impl CandidateProfile {
    /// Declared proficiency for `language`, if listed (case-insensitive).
    pub fn language_level(&self, language: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.language.eq_ignore_ascii_case(language))
            .map(|l| l.level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_defaults_to_required() {
        let req: SkillRequirement = serde_json::from_str(r#"{"skill": "Rust"}"#).unwrap();
        assert_eq!(req.importance, Importance::Required);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let candidate = CandidateProfile {
            languages: vec![LanguageSkill {
                language: "French".into(),
                level: "fluent".into(),
            }],
            ..CandidateProfile::default()
        };

        assert_eq!(candidate.language_level("french"), Some("fluent"));
        assert_eq!(candidate.language_level("german"), None);
    }
}
