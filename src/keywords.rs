//! Domain keyword vocabulary
//!
//! Technology, methodology and skill names. A question "contains a keyword"
//! when its lowercased raw text contains any term as a substring.

use once_cell::sync::Lazy;

/// Built-in vocabulary, all lowercase
pub static DEFAULT_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // JavaScript
        "javascript", "typescript", "node.js", "react.js", "angular", "vue.js",
        // Python
        "python", "django", "flask",
        // Java
        "java", "spring", "spring boot",
        // Cloud
        "aws", "azure", "google cloud", "cloud computing",
        // Containers
        "docker", "kubernetes", "containerization",
        // Databases
        "sql", "nosql", "mongodb", "postgresql", "mysql", "databases",
        // Version control
        "git", "github", "gitlab",
        // Process
        "agile", "scrum", "kanban", "agile methodologies", "lean methodologies",
        // AI and data
        "machine learning", "deep learning", "artificial intelligence", "data science",
        "big data", "apache spark", "hadoop",
        // Web
        "html", "css", "sass", "bootstrap", "web development", "restful api", "graphql",
        // Architecture and delivery
        "microservices", "serverless", "devops", "continuous integration",
        "continuous deployment",
        // Engineering
        "software engineering", "software development", "full stack", "software testing",
        // Security
        "cybersecurity", "network security",
        // Mobile
        "react native", "mobile development",
        // Blockchain
        "blockchain", "ethereum", "smart contracts",
        // Languages and tools
        "c++", "kotlin", "teamcenter", "dita xml",
    ]
});

/// Case-insensitive substring vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl KeywordSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { terms: Vec::new() };
        set.extend(terms);
        set
    }

    /// Add terms, skipping blanks and duplicates
    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
    }

    /// First vocabulary term found in `text`
    pub fn find_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn contains_any(&self, text: &str) -> bool {
        self.find_in(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
