use tracing::debug;

/// Terms signalling a question about amounts, prices or payments.
pub const MONETARY_TERMS: &[&str] = &[
    "valor",
    "preço",
    "custo",
    "aluguel",
    "taxa",
    "multa",
    "reais",
    "r$",
    "pagamento",
];

/// Names of parties known to appear in the indexed contracts.
pub const PERSON_TERMS: &[&str] = &["eduardo", "rocha", "fontenele", "gabriela", "bruno", "ana"];

pub const MONETARY_SUFFIX: &str = "valor aluguel preço pagamento R$";
pub const PERSON_SUFFIX: &str = "nome cpf rg identificação contratante locatário inquilino";

/// Category detected in a query; drives which boosting suffix is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Monetary,
    Person,
    General,
}

/// Heuristic recall booster: appends domain terms to a query before it is
/// embedded. Never fails; false positives are acceptable.
#[derive(Debug, Clone)]
pub struct QueryEnricher {
    monetary_terms: Vec<String>,
    person_terms: Vec<String>,
}

impl Default for QueryEnricher {
    fn default() -> Self {
        Self::new(
            MONETARY_TERMS.iter().copied(),
            PERSON_TERMS.iter().copied(),
        )
    }
}

impl QueryEnricher {
    pub fn new(
        monetary_terms: impl IntoIterator<Item = impl Into<String>>,
        person_terms: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            monetary_terms: normalize_terms(monetary_terms),
            person_terms: normalize_terms(person_terms),
        }
    }

    /// Default monetary vocabulary with a custom list of known names.
    pub fn with_person_terms(person_terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(MONETARY_TERMS.iter().copied(), person_terms)
    }

    pub fn classify(&self, text: &str) -> QueryIntent {
        let lowered = text.to_lowercase();
        if self.monetary_terms.iter().any(|t| lowered.contains(t.as_str())) {
            QueryIntent::Monetary
        } else if self.person_terms.iter().any(|t| lowered.contains(t.as_str())) {
            QueryIntent::Person
        } else {
            QueryIntent::General
        }
    }

    pub fn enrich(&self, text: &str) -> String {
        let intent = self.classify(text);
        let enriched = match intent {
            QueryIntent::Monetary => format!("{text} {MONETARY_SUFFIX}"),
            QueryIntent::Person => format!("{text} {PERSON_SUFFIX}"),
            QueryIntent::General => return text.to_string(),
        };
        debug!(
            ?intent,
            preview = %enriched.chars().take(50).collect::<String>(),
            "query enriched"
        );
        enriched
    }
}

fn normalize_terms(terms: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    terms
        .into_iter()
        .filter_map(|term| {
            let normalized = term.into().trim().to_lowercase();
            (!normalized.is_empty()).then_some(normalized)
        })
        .collect()
}
