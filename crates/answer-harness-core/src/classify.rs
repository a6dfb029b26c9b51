//! Keyword classifier for opt-in semantic routing.
//!
//! Two `RegexSet`s, one per label, matched in a single pass each against
//! the lowercased question. Quantitative matches win.

use regex::RegexSet;
use serde::Serialize;

use crate::error::RetrievalError;

const QUANTITATIVE_PATTERNS: &[&str] = &[
    r"\bhow many",
    r"\bcount",
    r"\baverage",
    r"\bmean",
    r"\bmedian",
    r"\bsum of",
    r"\btotal",
    r"\btop \d+",
    r"\bfirst \d+",
    r"\blast \d+",
    r"\bgreater than",
    r"\bless than",
    r"\bbetween .+ and",
    // pt
    r"\bquantos",
    r"\bquantas",
    r"\bcontar",
    r"\bm[ée]dia",
    r"\bsoma",
    r"\bprimeiros \d+",
    r"\b[úu]ltimos \d+",
];

const SEMANTIC_PATTERNS: &[&str] = &[
    r"\bwhat (are|is) (the )?(main|primary|key|common|typical|most)",
    r"\btell me (about|what)",
    r"\bexplain",
    r"\bdescribe",
    r"\bsummarize",
    r"\bsummary of",
    r"\blist (the )?(main|primary|key|all)",
    r"\bwhat does .+ mean",
    r"\bwhy (do|does|did|is|are)",
    r"\bhow (do|does|did|can|should) (i|we|they)",
    r"\bprovide (a |an )?(brief )?(overview|summary)",
    r"\bgive me (a |an )?(brief )?(overview|summary|description)",
    r"\bshow me .+ (about|related to)",
    // pt
    r"\bquais s[ãa]o (os|as) (principais|mais|comuns)",
    r"\bme (diga|conte|explique|mostre)",
    r"\bexplique",
    r"\bdescreva",
    r"\bresumo",
    r"\blistar (os|as) (principais|todos)",
    r"\bo que (significa|s[ãa]o)",
    r"\bpor que",
    r"\bcomo (posso|podemos|fazer)",
    r"\bforne[çc]a (um |uma )?(breve )?(vis[ãa]o|resumo)",
    r"\bme d[êe] (um |uma )?(breve )?(vis[ãa]o|resumo|descri[çc][ãa]o)",
    r"\bmostre.+(sobre|relacionado)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Counts, aggregates, rankings, comparisons.
    Quantitative,
    /// Explanations, descriptions, summaries.
    Semantic,
    Unclassified,
}

#[derive(Debug, Clone)]
pub struct QuestionClassifier {
    quantitative: RegexSet,
    semantic: RegexSet,
}

impl QuestionClassifier {
    pub fn new() -> Result<Self, RetrievalError> {
        let compile = |patterns: &[&str]| {
            RegexSet::new(patterns).map_err(|e| {
                RetrievalError::configuration(format!("invalid classifier pattern: {}", e))
            })
        };
        Ok(Self {
            quantitative: compile(QUANTITATIVE_PATTERNS)?,
            semantic: compile(SEMANTIC_PATTERNS)?,
        })
    }

    pub fn classify(&self, question: &str) -> QuestionKind {
        let lowered = question.to_lowercase();
        if self.quantitative.is_match(&lowered) {
            QuestionKind::Quantitative
        } else if self.semantic.is_match(&lowered) {
            QuestionKind::Semantic
        } else {
            QuestionKind::Unclassified
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.quantitative.len() + self.semantic.len()
    }
}
