//! Keyword intent matching
//!
//! A [`RuleTable`] is an ordered list of rules. Input is lowercased and each
//! rule is tried in table order; the first rule with any keyword occurring
//! as a substring of the input wins. Matching is on raw substrings, not
//! words, so "tracking" fires a rule keyed on "track". Unmatched input gets
//! the fallback response, so classification never fails.

use crate::config::builtin;

/// A keyword set mapped to a canned response
#[derive(Debug, Clone)]
pub struct Rule {
    name: Option<String>,
    keywords: Vec<String>,
    response: String,
}

impl Rule {
    /// Keywords are lowercased here so matching only needs to normalize input
    pub fn new<K, S>(keywords: K, response: impl Into<String>) -> Self
    where
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: None,
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            response: response.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

/// Which rule produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Classification<'a> {
    /// Name of the winning rule, `None` for the fallback or unnamed rules
    rule_name: Option<&'a str>,
    response: &'a str,
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    fallback: String,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// The MomCare assistant's stock rules
    pub fn builtin() -> Self {
        let rules = builtin::RULES
            .iter()
            .map(|(name, keywords, response)| Rule::new(keywords.iter(), *response).named(*name))
            .collect();

        Self::new(rules, builtin::FALLBACK)
    }

    /// Map input to its canned response
    pub fn classify(&self, input: &str) -> &str {
        let classification = self.match_rule(input);
        tracing::debug!(
            rule = classification.rule_name.unwrap_or("fallback"),
            "Classified input"
        );
        classification.response
    }

    fn match_rule(&self, input: &str) -> Classification<'_> {
        let normalized = input.to_lowercase();

        match self.rules.iter().find(|rule| rule.matches(&normalized)) {
            Some(rule) => Classification {
                rule_name: rule.name(),
                response: rule.response(),
            },
            None => Classification {
                rule_name: None,
                response: &self.fallback,
            },
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
