//! Goal tools

use serde::Serialize;
use tracing::info;

use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Goal, GoalCreate};
use super::{check_range, MAX_WEIGHT_KG};

/// Response for set_goal
#[derive(Debug, Serialize)]
pub struct SetGoalResponse {
    pub goal: Goal,
    pub superseded_goal_id: Option<i64>,
    pub message: String,
}

/// Response for get_active_goal
#[derive(Debug, Serialize)]
pub struct ActiveGoalResponse {
    pub goal: Option<Goal>,
}

fn validate(data: &GoalCreate) -> AppResult<()> {
    if data.daily_kcal_target < 1 {
        return Err(AppError::validation("daily_kcal_target", "must be at least 1"));
    }
    for (field, target) in [
        ("daily_protein_target", data.daily_protein_target),
        ("daily_fat_target", data.daily_fat_target),
        ("daily_carb_target", data.daily_carb_target),
    ] {
        if matches!(target, Some(t) if t < 0) {
            return Err(AppError::validation(field, "cannot be negative"));
        }
    }
    if let Some(kg) = data.start_weight_kg {
        check_range("start_weight_kg", kg, 0.0, true, MAX_WEIGHT_KG)?;
    }
    if let Some(kg) = data.target_weight_kg {
        check_range("target_weight_kg", kg, 0.0, true, MAX_WEIGHT_KG)?;
    }
    if let Some(target_date) = data.target_date {
        if target_date < data.start_date {
            return Err(AppError::validation("target_date", "must not be before start_date"));
        }
    }
    Ok(())
}

/// Make a new goal the active one; the previous active goal is deactivated
pub fn set_goal(db: &Database, ctx: &RequestContext, data: GoalCreate) -> AppResult<SetGoalResponse> {
    validate(&data)?;

    let (goal, superseded_goal_id) = db.with_conn_mut(|conn| Goal::set_active(conn, ctx.user_id, &data))?;
    info!(
        user_id = ctx.user_id,
        goal_id = goal.id,
        superseded = ?superseded_goal_id,
        daily_kcal_target = goal.daily_kcal_target,
        "Active goal set"
    );

    Ok(SetGoalResponse {
        goal,
        superseded_goal_id,
        message: ctx.tr("Цель сохранена.", "Goal saved.").to_string(),
    })
}

pub fn get_active_goal(db: &Database, ctx: &RequestContext) -> AppResult<ActiveGoalResponse> {
    let goal = db.with_conn(|conn| Goal::get_active(conn, ctx.user_id))?;
    Ok(ActiveGoalResponse { goal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::setup;
    use chrono::NaiveDate;

    fn data(kcal: i64) -> GoalCreate {
        GoalCreate {
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2025, 8, 1),
            start_weight_kg: Some(84.0),
            target_weight_kg: Some(78.0),
            daily_kcal_target: kcal,
            daily_protein_target: Some(140),
            daily_fat_target: Some(70),
            daily_carb_target: Some(180),
        }
    }

    #[test]
    fn test_set_goal_leaves_one_active() {
        let (db, ctx) = setup("g");
        let first = set_goal(&db, &ctx, data(2200)).unwrap();
        assert!(first.superseded_goal_id.is_none());

        let second = set_goal(&db, &ctx, data(2000)).unwrap();
        assert_eq!(second.superseded_goal_id, Some(first.goal.id));

        let active = get_active_goal(&db, &ctx).unwrap().goal.unwrap();
        assert_eq!(active.id, second.goal.id);
        assert_eq!(db.with_conn(|conn| Goal::count_active(conn, ctx.user_id)).unwrap(), 1);
    }

    #[test]
    fn test_validation_keeps_previous_goal() {
        let (db, ctx) = setup("g");
        let kept = set_goal(&db, &ctx, data(2100)).unwrap();

        assert!(matches!(set_goal(&db, &ctx, data(0)), Err(AppError::Validation { field: "daily_kcal_target", .. })));
        assert!(matches!(
            set_goal(&db, &ctx, GoalCreate { daily_fat_target: Some(-1), ..data(2000) }),
            Err(AppError::Validation { field: "daily_fat_target", .. })
        ));
        assert!(matches!(
            set_goal(&db, &ctx, GoalCreate { start_weight_kg: Some(0.0), ..data(2000) }),
            Err(AppError::Validation { field: "start_weight_kg", .. })
        ));
        assert!(matches!(
            set_goal(&db, &ctx, GoalCreate { start_weight_kg: Some(0.004), ..data(2000) }),
            Err(AppError::Validation { field: "start_weight_kg", .. })
        ));
        assert!(matches!(
            set_goal(&db, &ctx, GoalCreate { target_weight_kg: Some(0.004), ..data(2000) }),
            Err(AppError::Validation { field: "target_weight_kg", .. })
        ));
        assert!(matches!(
            set_goal(&db, &ctx, GoalCreate { target_date: NaiveDate::from_ymd_opt(2025, 4, 1), ..data(2000) }),
            Err(AppError::Validation { field: "target_date", .. })
        ));

        let active = get_active_goal(&db, &ctx).unwrap().goal.unwrap();
        assert_eq!(active.id, kept.goal.id);
    }
}
