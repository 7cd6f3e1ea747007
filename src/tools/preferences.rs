//! Language and theme preferences

use serde::Serialize;
use tracing::info;

use crate::context::{Language, RequestContext, Theme};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::User;

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub username: String,
    pub language: Language,
    pub theme: Theme,
}

pub fn get_preferences(ctx: &RequestContext) -> PreferencesResponse {
    PreferencesResponse {
        username: ctx.username.clone(),
        language: ctx.language,
        theme: ctx.theme,
    }
}

/// Persist the interface language (`ru` or `en`)
pub fn set_language(db: &Database, ctx: &RequestContext, language: &str) -> AppResult<PreferencesResponse> {
    let language = Language::parse(language)
        .ok_or_else(|| AppError::validation("language", format!("unsupported language '{}', expected ru or en", language)))?;

    db.with_conn(|conn| User::set_language(conn, ctx.user_id, language.as_str()))?;
    info!(user_id = ctx.user_id, language = language.as_str(), "Language changed");

    Ok(PreferencesResponse {
        username: ctx.username.clone(),
        language,
        theme: ctx.theme,
    })
}

/// Flip between light and dark
pub fn toggle_theme(db: &Database, ctx: &RequestContext) -> AppResult<PreferencesResponse> {
    let theme = ctx.theme.toggled();
    db.with_conn(|conn| User::set_theme(conn, ctx.user_id, theme.as_str()))?;
    info!(user_id = ctx.user_id, theme = theme.as_str(), "Theme toggled");

    Ok(PreferencesResponse {
        username: ctx.username.clone(),
        language: ctx.language,
        theme,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::setup;

    fn reload(db: &Database, username: &str) -> RequestContext {
        db.with_conn(|conn| Ok(RequestContext::resolve(conn, username, None).unwrap()))
            .unwrap()
    }

    #[test]
    fn test_set_language_persists() {
        let (db, ctx) = setup("p");
        assert_eq!(ctx.language, Language::En);

        let resp = set_language(&db, &ctx, "RU").unwrap();
        assert_eq!(resp.language, Language::Ru);
        assert_eq!(reload(&db, "p").language, Language::Ru);

        assert!(matches!(set_language(&db, &ctx, "de"), Err(AppError::Validation { field: "language", .. })));
        assert_eq!(reload(&db, "p").language, Language::Ru);
    }

    #[test]
    fn test_toggle_theme_round_trips() {
        let (db, ctx) = setup("p");
        assert_eq!(toggle_theme(&db, &ctx).unwrap().theme, Theme::Dark);

        let ctx = reload(&db, "p");
        assert_eq!(ctx.theme, Theme::Dark);
        assert_eq!(toggle_theme(&db, &ctx).unwrap().theme, Theme::Light);
        assert_eq!(get_preferences(&reload(&db, "p")).theme, Theme::Light);
    }
}
