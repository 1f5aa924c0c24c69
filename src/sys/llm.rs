use std::fmt::Display;

use chrono::{DateTime, Local};
use handlebars::Handlebars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = self.as_ref();
        write!(f, "{role}")
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One conversation turn as it is sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Local>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Local::now(),
        }
    }

    pub fn turn(&self) -> Turn {
        Turn {
            role: self.role,
            text: self.text.clone(),
        }
    }
}

pub const SYSTEM_TEMPLATE: &str = r#"당신은 '아렌티나 대륙'의 역사를 기록하는 '연대기 기록자(Chronicler)'입니다.
사용자의 질문에 대해 아래 제공된 세계관 설정을 바탕으로 대답하세요.

[세계관 설정 데이터]
{{world}}

[지침]
1. 말투는 고풍스럽고 신비로운 판타지 사서나 현자처럼 하세요. (~하게나, ~이라네, ~군요 등의 어미 사용)
2. 설정에 없는 내용은 "그 부분은 아직 역사서에 기록되지 않았습니다."라고 정중히 거절하거나, 세계관의 분위기에 맞춰 적절히 답변하세요(단, 사실인 것처럼 날조하지 마세요).
3. 각 국가의 관점을 물어보면, 해당 국가의 입장에서 서술하세요 (예: 제국에 대해 묻는다면 제국의 위엄을, 신성국에 대해 묻는다면 신앙심을 강조).
4. 답변은 한국어로 하세요.
5. 너무 길지 않게, 핵심을 요약하여 전달하세요.
"#;

/// Renders the persona instruction with the world document embedded.
pub struct PromptTemplate {
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    const NAME: &'static str = "system";

    pub fn new(template: &str) -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry
            .register_template_string(Self::NAME, template)
            .map_err(|e| anyhow::anyhow!("system template err:{e}"))?;
        Ok(Self { registry })
    }

    pub fn render<W: serde::Serialize>(&self, world: &W) -> anyhow::Result<String> {
        let world = serde_json::to_string_pretty(world)?;
        let instruction = self
            .registry
            .render(Self::NAME, &serde_json::json!({ "world": world }))
            .map_err(|e| anyhow::anyhow!("render system instruction err:{e}"))?;
        log::debug!("system instruction:\n{}", instruction);
        Ok(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_service_vocabulary() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn template_embeds_world_without_escaping() {
        let template = PromptTemplate::new(SYSTEM_TEMPLATE).unwrap();
        let world = serde_json::json!({ "title": "<아렌티나> & \"대륙\"" });
        let out = template.render(&world).unwrap();
        assert!(out.contains("연대기 기록자"));
        assert!(out.contains("\"title\": \"<아렌티나> & \\\"대륙\\\"\""));
        assert!(!out.contains("&lt;"));
    }

    #[test]
    fn custom_template_missing_variable_is_an_error() {
        let template = PromptTemplate::new("{{lore}}").unwrap();
        assert!(template.render(&serde_json::json!({})).is_err());
    }

    #[test]
    fn message_turn_drops_timestamp() {
        let message = Message::new(Role::User, "수도는?");
        assert_eq!(message.turn(), Turn::user("수도는?"));
    }
}
