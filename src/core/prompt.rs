use crate::domain::model::{ChatMessage, ChatRequest};

pub const HTML_SYSTEM_PROMPT: &str = r#"You are an expert frontend UI developer.

Given a natural language prompt, generate valid HTML5 with embedded CSS.

Rules:
- Output must begin with <!DOCTYPE html> and end with </html>
- Embed <style> CSS in the <head>
- NO markdown, explanations, triple backticks, or descriptions
- Only raw HTML is allowed"#;

/// 組合 system 指令與 (已正規化的) 使用者文字
pub fn compose(system_prompt: &str, user_text: &str) -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_text)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;

    #[test]
    fn test_compose_builds_system_then_user() {
        let request = compose(HTML_SYSTEM_PROMPT, "Create a simple login form");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, HTML_SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.user_text(), Some("Create a simple login form"));
    }

    #[test]
    fn test_system_prompt_demands_raw_html() {
        assert!(HTML_SYSTEM_PROMPT.contains("<!DOCTYPE html>"));
        assert!(HTML_SYSTEM_PROMPT.contains("</html>"));
        assert!(HTML_SYSTEM_PROMPT.contains("<head>"));
        assert!(HTML_SYSTEM_PROMPT.contains("triple backticks"));
    }

    #[test]
    fn test_messages_serialize_with_lowercase_roles() {
        let request = compose("sys", "hi");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
