//! 프레임워크별 프롬프트 템플릿
//!
//! 목표(goal)와 대상(audience)을 세 가지 고정 템플릿 중 하나로 조합한다.
//! 순수 문자열 포맷팅이며 실패하지 않는다.

/// 기본 대상 모델 라벨
pub const DEFAULT_TARGET_MODEL: &str = "GPT-4";

/// 프롬프트 프레임워크
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framework {
    /// Role / Context / Constraints / Objective
    #[default]
    Rcco,
    /// Context / Audience / Requirements / Example
    Care,
    /// Task / Audience / Style / Key points
    Task,
}

impl Framework {
    /// 프레임워크 태그 해석. 없거나 알 수 없는 태그는 기본값(R.C.C.O)
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_uppercase()).as_deref() {
            Some("R.C.C.O") | Some("RCCO") => Framework::Rcco,
            Some("C.A.R.E") | Some("CARE") => Framework::Care,
            Some("T.A.S.K") | Some("TASK") => Framework::Task,
            _ => Framework::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Rcco => "R.C.C.O",
            Framework::Care => "C.A.R.E",
            Framework::Task => "T.A.S.K",
        }
    }

    /// 템플릿 렌더링
    pub fn render(&self, goal: &str, audience: &str, target_model: &str) -> String {
        match self {
            Framework::Rcco => format!(
                "Role: You are an expert {target_model} assistant. Context: The user is targeting {audience}. \
                 Constraints: Be concise, actionable, and tailored to the audience. Objective: {goal}."
            ),
            Framework::Care => format!(
                "Context: The user needs help to {goal}. Audience: {audience}. \
                 Requirements: Provide clear steps, examples, and rationale. \
                 Example output style: professional and concise. Model: {target_model}."
            ),
            Framework::Task => format!(
                "Task: {goal}. Audience: {audience}. Style: Practical, step-by-step, and example-driven. \
                 Key points: include a short summary, 3 action items, and a sample result. \
                 Use {target_model} to produce the output."
            ),
        }
    }
}

/// 요청 값으로 템플릿 프롬프트를 만든다.
pub fn build_prompt(goal: &str, audience: &str, target_model: Option<&str>, framework: Option<&str>) -> String {
    let target_model = target_model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_TARGET_MODEL);
    Framework::parse(framework).render(goal, audience, target_model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: &str = "Write landing copy";
    const AUDIENCE: &str = "founders";

    #[test]
    fn every_framework_should_contain_goal_and_audience() {
        for framework in [Framework::Rcco, Framework::Care, Framework::Task] {
            let prompt = framework.render(GOAL, AUDIENCE, "GPT-4");

            assert!(prompt.contains(GOAL), "{:?} missing goal", framework);
            assert!(prompt.contains(AUDIENCE), "{:?} missing audience", framework);
            assert!(prompt.contains("GPT-4"), "{:?} missing model", framework);
        }
    }

    #[test]
    fn rendering_should_be_deterministic() {
        for tag in ["RCCO", "CARE", "TASK"] {
            let first = build_prompt(GOAL, AUDIENCE, None, Some(tag));
            let second = build_prompt(GOAL, AUDIENCE, None, Some(tag));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn frameworks_should_have_distinct_shapes() {
        let rcco = Framework::Rcco.render(GOAL, AUDIENCE, "GPT-4");
        let care = Framework::Care.render(GOAL, AUDIENCE, "GPT-4");
        let task = Framework::Task.render(GOAL, AUDIENCE, "GPT-4");

        assert!(rcco.starts_with("Role: "));
        assert!(care.starts_with("Context: "));
        assert!(task.starts_with("Task: "));
    }

    #[test]
    fn parse_should_accept_dotted_and_plain_tags_case_insensitively() {
        assert_eq!(Framework::parse(Some("r.c.c.o")), Framework::Rcco);
        assert_eq!(Framework::parse(Some("C.A.R.E")), Framework::Care);
        assert_eq!(Framework::parse(Some("care")), Framework::Care);
        assert_eq!(Framework::parse(Some("T.A.S.K")), Framework::Task);
        assert_eq!(Framework::parse(Some("Task")), Framework::Task);
    }

    #[test]
    fn unknown_framework_should_render_like_default() {
        let unknown = build_prompt(GOAL, AUDIENCE, Some("Claude"), Some("SPICY"));
        let default = build_prompt(GOAL, AUDIENCE, Some("Claude"), Some("R.C.C.O"));
        let absent = build_prompt(GOAL, AUDIENCE, Some("Claude"), None);

        assert_eq!(unknown, default);
        assert_eq!(absent, default);
    }

    #[test]
    fn missing_target_model_should_use_default_label() {
        let prompt = build_prompt(GOAL, AUDIENCE, Some("  "), Some("TASK"));

        assert!(prompt.contains("Use GPT-4 to produce the output."));
    }

    #[test]
    fn task_template_should_match_exact_shape() {
        let prompt = Framework::Task.render("ship it", "devs", "GPT-4");

        assert_eq!(
            prompt,
            "Task: ship it. Audience: devs. Style: Practical, step-by-step, and example-driven. \
             Key points: include a short summary, 3 action items, and a sample result. \
             Use GPT-4 to produce the output."
        );
    }
}
