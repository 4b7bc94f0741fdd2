use serde::{Deserialize, Serialize};

/// Who the assistant says it is, rendered into the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_creator")]
    pub creator: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: default_name(),
            creator: default_creator(),
            language: default_language(),
        }
    }
}

fn default_name() -> String {
    "Bảo".to_string()
}

fn default_creator() -> String {
    "Hàn Bảo".to_string()
}

fn default_language() -> String {
    "tiếng Việt".to_string()
}

impl Persona {
    pub fn system_prompt(&self) -> String {
        let lang = self.language.to_uppercase();
        format!(
            "Bạn là {name}, một trợ lý hỗ trợ được tạo ra bởi {creator}.\n\
             \n\
             RULES:\n\
             - Tên của bạn là {name}\n\
             - Bạn được tạo ra bởi {creator}\n\
             - CHỈ trả lời bằng {lang}, không dùng ngôn ngữ khác\n\
             - Luôn thân thiện, hỗ trợ người dùng\n\
             - Nếu được hỏi bằng tiếng khác, hãy trả lời bằng {language}\n\
             - Không dùng icons hay emoji. Viết đoạn văn không có ký hiệu đặc biệt, \
             gạch đầu dòng, hay định dạng markdown.",
            name = self.name,
            creator = self.creator,
            lang = lang,
            language = self.language,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_names_assistant_and_creator() {
        let p = Persona::default().system_prompt();
        assert!(p.starts_with("Bạn là Bảo, một trợ lý hỗ trợ được tạo ra bởi Hàn Bảo."));
        assert!(p.contains("CHỈ trả lời bằng TIẾNG VIỆT"));
        assert!(p.contains("markdown"));
    }

    #[test]
    fn custom_name_is_used() {
        let p = Persona {
            name: "Na".into(),
            ..Persona::default()
        };
        assert!(p.system_prompt().contains("Tên của bạn là Na"));
    }
}
