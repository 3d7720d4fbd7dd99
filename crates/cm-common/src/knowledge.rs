use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::{normalize, TermPair};

/// Similarity granted when one term is a curated relative of the other
/// (e.g. typescript listed under javascript).
pub const DIRECT_RELATION_SCORE: f64 = 0.85;
/// Similarity granted when two terms share a cluster without a direct link
/// (e.g. react and vue, both under javascript).
pub const SHARED_CLUSTER_SCORE: f64 = 0.70;

/// Curated technology clusters: canonical term → related terms.
///
/// All entries are stored in normalized spelling (lowercase, no punctuation)
/// so lookups can compare [`NormalizedTerm`]s directly.
///
/// [`NormalizedTerm`]: crate::normalize::NormalizedTerm
static TECH_RELATIONS: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let clusters: &[(&str, &[&str])] = &[
            // Languages and their ecosystems
            (
                "javascript",
                &["js", "es6", "ecmascript", "typescript", "angular", "react", "vue", "nodejs", "jquery"],
            ),
            ("typescript", &["ts", "javascript", "angular", "react"]),
            (
                "python",
                &["django", "flask", "fastapi", "numpy", "pandas", "scipy", "tensorflow", "pytorch", "scikitlearn", "machine learning"],
            ),
            ("java", &["spring", "hibernate", "j2ee", "kotlin", "scala", "android"]),
            ("c", &["dotnet", "net", "aspnet", "entity framework", "xamarin", "unity", "stl", "boost", "qt"]),
            ("php", &["laravel", "symfony", "wordpress", "drupal", "magento"]),
            ("ruby", &["ruby on rails", "sinatra", "rspec"]),
            ("swift", &["ios", "cocoa", "objectivec", "xcode"]),
            ("go", &["golang", "gin", "echo"]),
            ("rust", &["cargo", "actix", "tokio"]),
            // Web
            ("html", &["html5", "css", "web development", "frontend", "front end"]),
            ("css", &["scss", "sass", "less", "bootstrap", "tailwind", "styled components", "html"]),
            ("react", &["reactjs", "jsx", "redux", "react native", "javascript", "typescript"]),
            ("angular", &["angularjs", "typescript", "javascript"]),
            ("vue", &["vuejs", "nuxt", "javascript"]),
            // Databases
            ("sql", &["mysql", "postgresql", "oracle", "ms sql", "sqlite", "database", "db"]),
            ("nosql", &["mongodb", "couchdb", "firebase", "dynamodb", "database", "db"]),
            ("mongodb", &["mongo", "nosql", "database", "db"]),
            ("postgresql", &["postgres", "sql", "database", "db"]),
            // Cloud and DevOps
            ("aws", &["amazon web services", "ec2", "s3", "lambda", "cloud"]),
            ("azure", &["microsoft azure", "cloud"]),
            ("gcp", &["google cloud platform", "cloud"]),
            ("docker", &["container", "kubernetes", "k8s", "devops"]),
            ("kubernetes", &["k8s", "container orchestration", "docker", "devops"]),
            ("cicd", &["continuous integration", "continuous deployment", "jenkins", "github actions", "gitlab ci", "devops"]),
            // Data science
            ("machine learning", &["ml", "ai", "artificial intelligence", "data science", "deep learning", "neural networks"]),
            ("data science", &["machine learning", "statistics", "data analysis", "big data", "python", "r"]),
            ("tensorflow", &["keras", "deep learning", "machine learning", "python"]),
            ("pytorch", &["deep learning", "machine learning", "python"]),
            // Mobile
            ("android", &["kotlin", "java", "mobile development"]),
            ("ios", &["swift", "objectivec", "mobile development"]),
            ("react native", &["react", "mobile development", "javascript", "typescript"]),
            ("flutter", &["dart", "mobile development"]),
            // Tooling and practice
            ("git", &["github", "gitlab", "bitbucket", "version control"]),
            ("agile", &["scrum", "kanban", "jira", "project management"]),
            ("rest api", &["api", "restful", "web services"]),
            ("graphql", &["api", "apollo"]),
        ];

        clusters
            .iter()
            .map(|(base, related)| (*base, related.iter().copied().collect()))
            .collect()
    });

/// Degree-level ordinals. Higher means a more advanced qualification.
/// Keys are normalized; French aliases kept alongside the English terms.
static DEGREE_LEVELS: LazyLock<HashMap<&'static str, u8>> = LazyLock::new(|| {
    HashMap::from([
        ("bac1", 1),
        ("associate", 2),
        ("associate degree", 2),
        ("bts", 2),
        ("dut", 2),
        ("bac2", 2),
        ("bachelor", 3),
        ("bachelors", 3),
        ("licence", 3),
        ("bac3", 3),
        ("bba", 4),
        ("master 1", 4),
        ("bac4", 4),
        ("master", 5),
        ("masters", 5),
        ("master 2", 5),
        ("msc", 5),
        ("mba", 5),
        ("ingenieur", 5),
        ("diplome dingenieur", 5),
        ("engineering degree", 5),
        ("doctorate", 6),
        ("doctorat", 6),
        ("phd", 6),
    ])
});

/// Language-proficiency ordinals: none < basic < intermediate < advanced
/// < fluent < native. Keys are normalized; synonyms fold onto one level.
static LANGUAGE_LEVELS: LazyLock<HashMap<&'static str, u8>> = LazyLock::new(|| {
    HashMap::from([
        ("none", 0),
        ("aucun", 0),
        ("rien", 0),
        ("basic", 1),
        ("beginner", 1),
        ("elementary", 1),
        ("debutant", 1),
        ("basique", 1),
        ("intermediate", 2),
        ("conversational", 2),
        ("intermediaire", 2),
        ("moyen", 2),
        ("advanced", 3),
        ("professional", 3),
        ("avance", 3),
        ("courant", 3),
        ("fluent", 4),
        ("bilingual", 4),
        ("bilingue", 4),
        ("native", 5),
        ("natif", 5),
        ("maternelle", 5),
        ("bilingue maternelle", 5),
    ])
});

/// Abbreviations commonly found in degree titles, expanded before level and
/// field extraction so "MSc in CS" compares as "computer science".
static DEGREE_ABBREVIATIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("ai", "artificial intelligence"),
        ("ia", "intelligence artificielle"),
        ("cs", "computer science"),
        ("swe", "software engineering"),
        ("it", "information technology"),
        ("ml", "machine learning"),
    ]
    .into_iter()
    .map(|(abbr, full)| {
        (
            Regex::new(&format!(r"(?i)\b{abbr}\b")).unwrap(),
            full,
        )
    })
    .collect()
});

/// Static relation lookup. Side-effect-free and consulted before any cache
/// access: it is cheaper than both tiers and can never go stale.
///
/// Returns `None` when no curated relation exists, telling the caller to
/// fall through to the cache/provider path.
pub fn lookup_relation(pair: &TermPair) -> Option<f64> {
    let a = pair.first().as_str();
    let b = pair.second().as_str();

    let direct = TECH_RELATIONS
        .get(a)
        .is_some_and(|related| related.contains(b))
        || TECH_RELATIONS
            .get(b)
            .is_some_and(|related| related.contains(a));
    if direct {
        return Some(DIRECT_RELATION_SCORE);
    }

    let shared = TECH_RELATIONS
        .values()
        .any(|related| related.contains(a) && related.contains(b));
    if shared {
        return Some(SHARED_CLUSTER_SCORE);
    }

    None
}

/// Ordinal for a degree-level term, `None` when the term is unknown.
pub fn degree_level(term: &str) -> Option<u8> {
    DEGREE_LEVELS.get(normalize(term).as_str()).copied()
}

/// Ordinal for a language-proficiency term, `None` when unknown.
pub fn language_level(term: &str) -> Option<u8> {
    LANGUAGE_LEVELS.get(normalize(term).as_str()).copied()
}

/// Expand known abbreviations in a raw degree title.
pub fn expand_degree_abbreviations(raw: &str) -> String {
    let mut expanded = raw.to_string();
    for (pattern, full) in DEGREE_ABBREVIATIONS.iter() {
        expanded = pattern.replace_all(&expanded, *full).into_owned();
    }
    expanded
}

/// Split a degree title into its level ordinal and field of study.
///
/// Longest level term wins, matched first as a prefix and then anywhere in
/// the title; a leading "in"/"en"/"of" on the remaining field is dropped.
pub fn parse_degree(raw: &str) -> (Option<u8>, String) {
    let text = normalize(&expand_degree_abbreviations(raw)).into_string();
    if text.is_empty() {
        return (None, String::new());
    }

    let mut terms: Vec<&&str> = DEGREE_LEVELS.keys().collect();
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));

    for term in &terms {
        if let Some(rest) = text.strip_prefix(**term) {
            return (
                DEGREE_LEVELS.get(**term).copied(),
                strip_field_preposition(rest.trim()).to_string(),
            );
        }
    }

    for term in &terms {
        if let Some(idx) = text.find(**term) {
            let mut field = String::new();
            field.push_str(text[..idx].trim());
            let tail = text[idx + term.len()..].trim();
            if !field.is_empty() && !tail.is_empty() {
                field.push(' ');
            }
            field.push_str(tail);
            return (
                DEGREE_LEVELS.get(**term).copied(),
                strip_field_preposition(&field).to_string(),
            );
        }
    }

    (None, text)
}

fn strip_field_preposition(field: &str) -> &str {
    for prep in ["in ", "en ", "of "] {
        if let Some(rest) = field.strip_prefix(prep) {
            return rest.trim();
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> TermPair {
        TermPair::from_raw(a, b)
    }

    #[test]
    fn direct_relation_scores_high() {
        assert_eq!(
            lookup_relation(&pair("JavaScript", "TypeScript")),
            Some(DIRECT_RELATION_SCORE)
        );
        // Orientation must not matter.
        assert_eq!(
            lookup_relation(&pair("TypeScript", "JavaScript")),
            Some(DIRECT_RELATION_SCORE)
        );
    }

    #[test]
    fn shared_cluster_scores_lower() {
        // react and vue are both related to javascript but not to each other.
        assert_eq!(
            lookup_relation(&pair("Vue", "jQuery")),
            Some(SHARED_CLUSTER_SCORE)
        );
    }

    #[test]
    fn unknown_pairs_fall_through() {
        assert_eq!(lookup_relation(&pair("Photoshop", "Python")), None);
        assert_eq!(lookup_relation(&pair("", "rust")), None);
    }

    #[test]
    fn degree_levels_are_ordered() {
        let associate = degree_level("Associate").unwrap();
        let bachelor = degree_level("Bachelor").unwrap();
        let master = degree_level("Master").unwrap();
        let doctorate = degree_level("Doctorate").unwrap();
        assert!(associate < bachelor && bachelor < master && master < doctorate);
        assert_eq!(degree_level("Licence"), degree_level("Bachelor"));
        assert_eq!(degree_level("apprenticeship"), None);
    }

    #[test]
    fn language_levels_are_ordered() {
        let ordered = ["none", "basic", "intermediate", "advanced", "fluent", "native"];
        let values: Vec<u8> = ordered
            .iter()
            .map(|term| language_level(term).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(language_level("Courant"), language_level("advanced"));
        assert_eq!(language_level("klingon level"), None);
    }

    #[test]
    fn parses_degree_level_and_field() {
        let (level, field) = parse_degree("Master en Informatique");
        assert_eq!(level, degree_level("master"));
        assert_eq!(field, "informatique");

        let (level, field) = parse_degree("MSc in CS");
        assert_eq!(level, degree_level("msc"));
        assert_eq!(field, "computer science");
    }

    #[test]
    fn parses_level_embedded_in_title() {
        let (level, field) = parse_degree("Computer Science Bachelor");
        assert_eq!(level, degree_level("bachelor"));
        assert_eq!(field, "computer science");
    }

    #[test]
    fn unknown_level_keeps_field() {
        let (level, field) = parse_degree("Certificate in Welding");
        assert_eq!(level, None);
        assert_eq!(field, "certificate in welding");
    }
}
