//! 질문 판별 규칙 테이블
//!
//! 시작어 목록, 명령형 동사 목록, RFP 키워드 목록, 요구사항 → 질문 변환 테이블.
//! 제어 흐름과 분리되어 있어 규칙만 단독으로 테스트/확장할 수 있습니다.

/// 의문사/조동사 및 요청 구문 시작어
pub const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "when", "where", "why", "who", "which", "whose", "whom", "can", "could",
    "would", "should", "will", "shall", "may", "might", "do", "does", "did", "have", "has",
    "had", "are", "is", "was", "were", "please describe", "please explain", "please provide",
    "please list",
];

/// RFP 키워드가 함께 있어야 질문으로 보는 명령형 동사
pub const IMPERATIVE_VERBS: &[&str] = &[
    "describe", "explain", "provide", "list", "outline", "detail", "specify", "identify",
];

/// RFP 도메인 키워드 (부분 문자열 매칭)
pub const RFP_KEYWORDS: &[&str] = &[
    "requirement",
    "specification",
    "proposal",
    "solution",
    "approach",
    "methodology",
    "timeline",
    "cost",
    "pricing",
    "budget",
    "experience",
    "qualification",
    "capability",
    "deliverable",
    "scope",
    "objective",
    "goal",
];

/// 선행 동사별 의문문 접두어
pub const REQUIREMENT_TRANSFORMS: &[(&str, &str)] = &[
    ("provide", "What"),
    ("describe", "How would you describe"),
    ("explain", "How would you explain"),
    ("list", "What are"),
    ("outline", "How would you outline"),
    ("detail", "What are the details of"),
    ("specify", "What would you specify for"),
    ("identify", "What would you identify as"),
];

/// 변환 테이블에 없는 요구사항의 접두어
pub const FALLBACK_PREFIX: &str = "How do you address this requirement:";

/// 암묵적 질문으로 변환할 최소 길이 (마커 제거 후)
pub const MIN_IMPLICIT_LENGTH: usize = 20;

/// 이보다 짧은 목록 항목은 버림
pub const MIN_ITEM_LENGTH: usize = 10;

// ============================================================================
// QuestionRules
// ============================================================================

/// 질문 판별 규칙 집합
#[derive(Debug, Clone)]
pub struct QuestionRules {
    pub starters: Vec<String>,
    pub imperative_verbs: Vec<String>,
    pub keywords: Vec<String>,
    pub transforms: Vec<(String, String)>,
    pub fallback_prefix: String,
    pub min_implicit_length: usize,
    pub min_item_length: usize,
}

impl Default for QuestionRules {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            starters: owned(QUESTION_STARTERS),
            imperative_verbs: owned(IMPERATIVE_VERBS),
            keywords: owned(RFP_KEYWORDS),
            transforms: REQUIREMENT_TRANSFORMS
                .iter()
                .map(|(verb, prefix)| (verb.to_string(), prefix.to_string()))
                .collect(),
            fallback_prefix: FALLBACK_PREFIX.to_string(),
            min_implicit_length: MIN_IMPLICIT_LENGTH,
            min_item_length: MIN_ITEM_LENGTH,
        }
    }
}

impl QuestionRules {
    /// 문장 단위 명시적 질문 판별
    ///
    /// 1. `?`로 끝남
    /// 2. 시작어 + 공백 또는 아포스트로피 (what's 등)
    /// 3. 명령형 동사 + 공백으로 시작하고 RFP 키워드 포함
    pub fn is_explicit_question(&self, sentence: &str) -> bool {
        let clean = sentence.trim().to_lowercase();
        if clean.is_empty() {
            return false;
        }

        if clean.ends_with('?') {
            return true;
        }

        let starts_with_starter = self.starters.iter().any(|starter| {
            clean
                .strip_prefix(starter.as_str())
                .map(|rest| rest.starts_with(' ') || rest.starts_with('\''))
                .unwrap_or(false)
        });
        if starts_with_starter {
            return true;
        }

        self.starts_with_imperative(&clean) && self.contains_keyword(&clean)
    }

    /// 소문자 텍스트에 RFP 키워드가 있는지
    pub fn contains_keyword(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    fn starts_with_imperative(&self, lowered: &str) -> bool {
        self.imperative_verbs.iter().any(|verb| {
            lowered
                .strip_prefix(verb.as_str())
                .map(|rest| rest.starts_with(' '))
                .unwrap_or(false)
        })
    }

    /// 목록 항목(마커 제거됨)을 의문문으로 변환
    ///
    /// 최소 길이 미만이면 `None`.
    pub fn rewrite_requirement(&self, item: &str) -> Option<String> {
        let cleaned = item.trim();
        if cleaned.chars().count() < self.min_item_length {
            return None;
        }

        for (verb, prefix) in &self.transforms {
            if let Some(rest) = strip_word_ignore_ascii_case(cleaned, verb) {
                let body = trim_terminal_punctuation(rest).to_lowercase();
                return Some(format!("{} {}?", prefix, body));
            }
        }

        Some(format!(
            "{} {}?",
            self.fallback_prefix,
            trim_terminal_punctuation(cleaned)
        ))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `word` + 공백으로 시작하면 나머지 반환 (ASCII 대소문자 무시)
fn strip_word_ignore_ascii_case<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let head = text.get(..word.len())?;
    if !head.eq_ignore_ascii_case(word) {
        return None;
    }
    let rest = &text[word.len()..];
    if rest.starts_with(' ') {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn trim_terminal_punctuation(text: &str) -> &str {
    text.trim_end_matches(['.', ';', ':', ',', '!', '?'])
        .trim_end()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_mark() {
        let rules = QuestionRules::default();
        assert!(rules.is_explicit_question("Anything else?"));
        assert!(rules.is_explicit_question("  Really?  "));
    }

    #[test]
    fn test_starters() {
        let rules = QuestionRules::default();
        assert!(rules.is_explicit_question("What is your approach."));
        assert!(rules.is_explicit_question("What's the plan."));
        assert!(rules.is_explicit_question("Please describe your team."));
        assert!(rules.is_explicit_question("Could the vendor confirm this."));
        // 시작어가 다른 단어의 접두어일 뿐이면 아님
        assert!(!rules.is_explicit_question("Whatever happens, stay calm."));
        assert!(!rules.is_explicit_question("Island resorts are nice."));
    }

    #[test]
    fn test_imperative_requires_keyword() {
        let rules = QuestionRules::default();
        assert!(rules.is_explicit_question("Describe your proposal methodology."));
        assert!(rules.is_explicit_question("List all deliverables."));
        assert!(!rules.is_explicit_question("Describe your weekend."));
        assert!(!rules.is_explicit_question("The budget is fixed."));
    }

    #[test]
    fn test_plain_statement() {
        let rules = QuestionRules::default();
        assert!(!rules.is_explicit_question("The sky is blue."));
        assert!(!rules.is_explicit_question(""));
    }

    #[test]
    fn test_rewrite_known_verbs() {
        let rules = QuestionRules::default();
        assert_eq!(
            rules.rewrite_requirement("Provide your Pricing model for year one."),
            Some("What your pricing model for year one?".to_string())
        );
        assert_eq!(
            rules.rewrite_requirement("Describe the implementation approach"),
            Some("How would you describe the implementation approach?".to_string())
        );
        assert_eq!(
            rules.rewrite_requirement("list key deliverables and milestones"),
            Some("What are key deliverables and milestones?".to_string())
        );
        assert_eq!(
            rules.rewrite_requirement("Detail the support scope."),
            Some("What are the details of the support scope?".to_string())
        );
    }

    #[test]
    fn test_rewrite_fallback() {
        let rules = QuestionRules::default();
        assert_eq!(
            rules.rewrite_requirement("Vendor must meet the 30 day timeline."),
            Some(
                "How do you address this requirement: Vendor must meet the 30 day timeline?"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_rewrite_too_short() {
        let rules = QuestionRules::default();
        assert_eq!(rules.rewrite_requirement("Cost."), None);
        assert_eq!(rules.rewrite_requirement("   "), None);
    }

    #[test]
    fn test_verb_must_be_whole_word() {
        let rules = QuestionRules::default();
        // "listing"은 "list" 변환 대상 아님
        let rewritten = rules.rewrite_requirement("Listing of all cost items").unwrap();
        assert!(rewritten.starts_with(FALLBACK_PREFIX));
    }

    #[test]
    fn test_custom_rules_extend_tables() {
        let mut rules = QuestionRules::default();
        rules.keywords.push("security".to_string());
        assert!(rules.is_explicit_question("Explain your security posture."));
    }
}
