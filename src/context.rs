//! Per-request context
//!
//! Who is calling and how to talk to them. Resolved once at the tool
//! boundary and passed down explicitly.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::User;

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Pick a language from an `Accept-Language` style hint
    pub fn detect(hint: Option<&str>) -> Self {
        match hint {
            Some(h) if h.to_lowercase().contains("ru") => Language::Ru,
            _ => Language::En,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than a stored "dark" reads as light
    pub fn from_stored(s: Option<&str>) -> Self {
        match s {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Select the phrase for `language`
pub fn tr<'a>(language: Language, ru: &'a str, en: &'a str) -> &'a str {
    match language {
        Language::Ru => ru,
        Language::En => en,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    pub user_id: i64,
    pub username: String,
    pub language: Language,
    pub theme: Theme,
}

impl RequestContext {
    /// Look up the caller and settle their language and theme.
    ///
    /// Unset preferences are filled in (language from `accept_language`) and
    /// persisted so later requests see the same values.
    pub fn resolve(conn: &Connection, username: &str, accept_language: Option<&str>) -> AppResult<Self> {
        let username = username.trim();
        let user = User::get_by_username(conn, username)?
            .ok_or_else(|| AppError::Unauthenticated(username.to_string()))?;

        let language = match user.language.as_deref().and_then(Language::parse) {
            Some(lang) => lang,
            None => {
                let lang = Language::detect(accept_language);
                User::set_language(conn, user.id, lang.as_str())?;
                lang
            }
        };

        let theme = Theme::from_stored(user.theme.as_deref());
        if user.theme.is_none() {
            User::set_theme(conn, user.id, theme.as_str())?;
        }

        Ok(Self {
            user_id: user.id,
            username: user.username,
            language,
            theme,
        })
    }

    pub fn tr<'a>(&self, ru: &'a str, en: &'a str) -> &'a str {
        tr(self.language, ru, en)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_detect_language() {
        assert_eq!(Language::detect(Some("ru-RU,ru;q=0.9,en;q=0.8")), Language::Ru);
        assert_eq!(Language::detect(Some("en-US,en;q=0.9")), Language::En);
        assert_eq!(Language::detect(None), Language::En);
    }

    #[test]
    fn test_tr_selects_phrase() {
        assert_eq!(tr(Language::Ru, "Цель", "Goal"), "Цель");
        assert_eq!(tr(Language::En, "Цель", "Goal"), "Goal");
    }

    #[test]
    fn test_theme_from_stored() {
        assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("neon")), Theme::Light);
        assert_eq!(Theme::from_stored(None), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn test_resolve_persists_detected_language() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        User::get_or_create(&conn, "olga").unwrap();

        let ctx = RequestContext::resolve(&conn, "olga", Some("ru")).unwrap();
        assert_eq!(ctx.language, Language::Ru);
        assert_eq!(ctx.theme, Theme::Light);

        // stored value wins over a later hint
        let ctx = RequestContext::resolve(&conn, "olga", Some("en-GB")).unwrap();
        assert_eq!(ctx.language, Language::Ru);

        let user = User::get_by_username(&conn, "olga").unwrap().unwrap();
        assert_eq!(user.language.as_deref(), Some("ru"));
        assert_eq!(user.theme.as_deref(), Some("light"));
    }

    #[test]
    fn test_resolve_unknown_user() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let err = RequestContext::resolve(&conn, "ghost", None).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
