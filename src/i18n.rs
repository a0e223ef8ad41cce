//! Localized strings shown by the preview panel.

use serde::{Deserialize, Serialize};

/// UI language of the preview panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    /// Map a BCP 47 tag (`ko-KR`, `en`, ...) to a supported locale.
    ///
    /// Unknown languages fall back to English.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let lang = tag.split(['-', '_']).next().unwrap_or("");
        if lang.eq_ignore_ascii_case("ko") {
            Self::Ko
        } else {
            Self::En
        }
    }

    /// Shown while the file is being fetched and parsed.
    #[must_use]
    pub fn loading(self) -> &'static str {
        match self {
            Self::Ko => "스프레드시트를 불러오는 중...",
            Self::En => "Loading spreadsheet...",
        }
    }

    /// Text of the sentinel below the loaded rows.
    #[must_use]
    pub fn loading_more(self) -> &'static str {
        match self {
            Self::Ko => "데이터 로드 중...",
            Self::En => "Loading data...",
        }
    }

    /// Error message replacing the grid when the load fails.
    #[must_use]
    pub fn load_failed(self, detail: &str) -> String {
        match self {
            Self::Ko => format!("파일을 불러오는 중 오류가 발생했습니다: {detail}"),
            Self::En => format!("An error occurred while loading the file: {detail}"),
        }
    }
}
