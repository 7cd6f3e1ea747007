//! Chart and report generation
//!
//! Daily calorie chart (PNG) and a two-page progress report (PDF) built from
//! the dashboard data.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use printpdf::*;
use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RequestContext;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::nutrition::DailyValue;
use super::dashboard::{build_dashboard, DashboardResponse};

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 112, 80);
const COLOR_ON_TRACK: (u8, u8, u8) = (0, 176, 80);
const COLOR_OVER: (u8, u8, u8) = (255, 0, 0);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 400;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ExportChartResponse {
    pub success: bool,
    pub file_path: String,
    pub days: usize,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub days_analyzed: usize,
    pub days_logged: usize,
    pub date_range: String,
    pub message: String,
}

/// Caption strings drawn into the chart image
#[derive(Debug, Clone)]
pub struct ChartLabels {
    pub series: String,
    pub goal: String,
}

fn day_of_week_abbrev(date: &NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Upper bound of the kcal axis: room above the highest point or goal line
pub fn chart_y_max(series: &[DailyValue], goal_kcal: Option<f64>) -> f64 {
    let highest = series
        .iter()
        .map(|v| v.total)
        .chain(goal_kcal)
        .fold(0.0_f64, f64::max);
    (highest * 1.15).max(100.0)
}

/// Filename-safe form of a username: anything outside `[A-Za-z0-9_-]` becomes `_`
fn file_stem(username: &str) -> String {
    let stem: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() { "user".to_string() } else { stem }
}

/// Output path: the explicit one, or `default_name` inside `report_dir`
fn resolve_output_path(output_path: Option<&str>, report_dir: &Path, default_name: String) -> PathBuf {
    match output_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => PathBuf::from(p),
        None => report_dir.join(default_name),
    }
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Render daily kcal as line+markers with an optional goal line, as PNG bytes
pub fn generate_calorie_chart(
    series: &[DailyValue],
    goal_kcal: Option<f64>,
    labels: &ChartLabels,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if series.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    let n = series.len() as i32;

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0..n, 0.0..chart_y_max(series, goal_kcal))
            .map_err(|e| e.to_string())?;

        chart.configure_mesh()
            .x_labels(series.len().min(14))
            .x_label_formatter(&|x| {
                series
                    .get(*x as usize)
                    .filter(|_| *x >= 0)
                    .map(|v| v.date.format("%m/%d").to_string())
                    .unwrap_or_default()
            })
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        if let Some(goal) = goal_kcal {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(0, goal), (n - 1, goal)],
                ShapeStyle::from(&RGBColor(255, 0, 0).mix(0.7)).stroke_width(1),
            )))
            .map_err(|e| e.to_string())?
            .label(labels.goal.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.7).stroke_width(1)));
        }

        let points: Vec<(i32, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i32, v.total))
            .collect();

        chart.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label(labels.series.as_str())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart.draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())))
            .map_err(|e| e.to_string())?;

        chart.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    // Convert RGB buffer to PNG
    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    let dyn_img = DynamicImage::ImageRgb8(img);
    dyn_img.write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

fn chart_for(dashboard: &DashboardResponse, ctx: &RequestContext) -> Result<Vec<u8>, String> {
    let labels = ChartLabels {
        series: ctx.tr("Ккал/день", "Kcal/day").to_string(),
        goal: ctx.tr("Цель", "Goal").to_string(),
    };
    let goal_kcal = dashboard.goal.as_ref().map(|g| g.daily_kcal_target as f64);
    generate_calorie_chart(&dashboard.series.kcal, goal_kcal, &labels, CHART_WIDTH, CHART_HEIGHT)
}

/// Write the dashboard calorie chart as a PNG file
pub fn export_calorie_chart(
    db: &Database,
    ctx: &RequestContext,
    today: NaiveDate,
    output_path: Option<&str>,
    report_dir: &Path,
) -> AppResult<ExportChartResponse> {
    let dashboard = db.with_conn(|conn| build_dashboard(conn, ctx, today))?;
    let png = chart_for(&dashboard, ctx).map_err(AppError::Chart)?;

    let path = resolve_output_path(
        output_path,
        report_dir,
        format!("fitmacro-calories-{}-{}.png", file_stem(&ctx.username), today),
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &png)?;
    info!(user_id = ctx.user_id, path = %path.display(), "Calorie chart exported");

    Ok(ExportChartResponse {
        success: true,
        file_path: path.display().to_string(),
        days: dashboard.series.kcal.len(),
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        bytes: png.len(),
    })
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(
    layer: &PdfLayerReference,
    x1: Mm,
    y1: Mm,
    x2: Mm,
    y2: Mm,
    color: (u8, u8, u8),
    width: f32,
) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![
            (Point::new(x1, y1), false),
            (Point::new(x2, y2), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn pct(p: Option<u8>) -> String {
    p.map(|v| format!("{}%", v)).unwrap_or_else(|| "-".to_string())
}

fn opt_target(t: Option<i64>, unit: &str) -> String {
    t.map(|v| format!("{} {}", v, unit)).unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// Progress Report
// ============================================================================

/// Generate the progress report PDF for the dashboard window ending `today`.
///
/// Text uses the built-in Helvetica faces, which only cover Latin-1, so the
/// report is written in English regardless of the interface language.
pub fn generate_progress_report(
    db: &Database,
    ctx: &RequestContext,
    today: NaiveDate,
    output_path: Option<&str>,
    report_dir: &Path,
) -> AppResult<GenerateReportResponse> {
    let dashboard = db.with_conn(|conn| build_dashboard(conn, ctx, today))?;

    let date_range = format!("{} to {}", dashboard.window_start, dashboard.window_end);
    let days_analyzed = dashboard.days.len();
    let days_logged = dashboard.days.iter().filter(|d| d.nutrition.kcal > 0.0).count();

    // Page 1 Portrait
    let (doc, page1, layer1) = PdfDocument::new(
        "FitMacro Progress Report",
        Mm(215.9),  // Letter width
        Mm(279.4),  // Letter height
        "Layer 1",
    );

    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| AppError::Report(e.to_string()))?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| AppError::Report(e.to_string()))?;

    let layer = doc.get_page(page1).get_layer(layer1);

    let page_height = 279.4;
    let margin_left = 15.0;
    let mut y = page_height - 20.0;

    add_text(&layer, &font_bold, "FitMacro Progress Report", Mm(margin_left), Mm(y), 18.0, COLOR_TITLE);
    y -= 10.0;

    add_text(&layer, &font, &format!("User: {}", ctx.username), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    let now = chrono::Local::now().format("%Y-%m-%d").to_string();
    add_text(&layer, &font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 6.0;

    add_text(&layer, &font, &format!("Report Period: {}", date_range), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    y -= 10.0;

    add_line(&layer, Mm(margin_left), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
    y -= 8.0;

    // Goal section
    add_text(&layer, &font_bold, "Active Goal", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;
    match &dashboard.goal {
        Some(goal) => {
            add_text(&layer, &font, &format!("Daily energy: {} kcal", goal.daily_kcal_target), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("Since: {}", goal.start_date), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
            if let Some(target_date) = goal.target_date {
                add_text(&layer, &font, &format!("Until: {}", target_date), Mm(140.0), Mm(y), 10.0, COLOR_BLACK);
            }
            y -= 6.0;

            add_text(&layer, &font, &format!("Protein: {}", opt_target(goal.daily_protein_target, "g")), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("Fat: {}", opt_target(goal.daily_fat_target, "g")), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("Carbs: {}", opt_target(goal.daily_carb_target, "g")), Mm(140.0), Mm(y), 10.0, COLOR_BLACK);
            y -= 6.0;

            let weights = match (goal.start_weight_kg, goal.target_weight_kg) {
                (Some(s), Some(t)) => format!("Weight: {:.1} kg -> {:.1} kg", s, t),
                (Some(s), None) => format!("Start weight: {:.1} kg", s),
                (None, Some(t)) => format!("Target weight: {:.1} kg", t),
                (None, None) => "Weight targets: -".to_string(),
            };
            add_text(&layer, &font, &weights, Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
            y -= 10.0;
        }
        None => {
            add_text(&layer, &font, "No goal set", Mm(margin_left), Mm(y), 10.0, COLOR_GRAY);
            y -= 10.0;
        }
    }

    // Today section
    add_text(&layer, &font_bold, &format!("Today ({})", today), Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;
    let t = &dashboard.today_totals;
    let progress = dashboard.progress.unwrap_or_default();
    let kcal_color = match progress.kcal {
        Some(100) => COLOR_OVER,
        Some(_) => COLOR_ON_TRACK,
        None => COLOR_BLACK,
    };
    add_text(&layer, &font, &format!("Energy: {:.0} kcal ({})", t.kcal, pct(progress.kcal)), Mm(margin_left), Mm(y), 10.0, kcal_color);
    add_text(&layer, &font, &format!("Protein: {:.1} g ({})", t.protein, pct(progress.protein)), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 6.0;
    add_text(&layer, &font, &format!("Fat: {:.1} g ({})", t.fat, pct(progress.fat)), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Carbs: {:.1} g ({})", t.carb, pct(progress.carb)), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 10.0;

    // Weight section
    add_text(&layer, &font_bold, "Weight", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;
    match &dashboard.latest_weight {
        Some(w) => add_text(&layer, &font, &format!("Latest: {:.2} kg on {}", w.weight_kg, w.date), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK),
        None => add_text(&layer, &font, "Latest: no weight logged", Mm(margin_left), Mm(y), 10.0, COLOR_GRAY),
    }
    y -= 6.0;
    match &dashboard.forecast {
        Some(f) => {
            add_text(&layer, &font, &format!("Forecast: {:.2} kg ({:+.2} kg change)", f.predicted_weight_kg, -f.weight_change_kg), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("Balance over {} days: {:.0} kcal", f.days_count, -f.deficit_kcal), Mm(110.0), Mm(y), 10.0, COLOR_BLACK);
        }
        None => add_text(&layer, &font, "Forecast: not available", Mm(margin_left), Mm(y), 10.0, COLOR_GRAY),
    }
    y -= 12.0;

    // Daily table
    add_text(&layer, &font_bold, "Daily Intake", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    let col_widths = [25.0, 15.0, 25.0, 25.0, 25.0, 25.0];
    let headers = ["Date", "Day", "Kcal", "Protein", "Fat", "Carbs"];

    let mut col_x = margin_left;
    for (i, header) in headers.iter().enumerate() {
        add_text(&layer, &font_bold, header, Mm(col_x), Mm(y), 8.0, COLOR_BLACK);
        col_x += col_widths[i];
    }
    y -= 5.0;

    let goal_kcal = dashboard.goal.as_ref().map(|g| g.daily_kcal_target as f64);
    for day in &dashboard.days {
        col_x = margin_left;
        let n = &day.nutrition;
        let row_color = match goal_kcal {
            Some(goal) if n.kcal > goal => COLOR_OVER,
            _ => COLOR_BLACK,
        };

        let values = [
            day.date.to_string(),
            day_of_week_abbrev(&day.date).to_string(),
            format!("{:.0}", n.kcal),
            format!("{:.1}", n.protein),
            format!("{:.1}", n.fat),
            format!("{:.1}", n.carb),
        ];

        for (i, value) in values.iter().enumerate() {
            let color = if i == 2 { row_color } else { COLOR_BLACK };
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 7.0, color);
            col_x += col_widths[i];
        }
        y -= 4.5;
    }

    y -= 3.0;
    if days_logged > 0 {
        let avg = dashboard.days.iter().map(|d| d.nutrition.kcal).sum::<f64>() / days_logged as f64;
        add_text(&layer, &font, &format!("Days logged: {} of {}   Average on logged days: {:.0} kcal", days_logged, days_analyzed, avg), Mm(margin_left), Mm(y), 9.0, COLOR_BLACK);
    } else {
        add_text(&layer, &font, "No meals logged in this period", Mm(margin_left), Mm(y), 9.0, COLOR_GRAY);
    }

    // ========================================================================
    // Page 2 - Landscape for Chart
    // ========================================================================
    let (page2, layer2) = doc.add_page(Mm(279.4), Mm(215.9), "Chart Page");  // Landscape
    let layer2 = doc.get_page(page2).get_layer(layer2);

    let landscape_height = 215.9;
    let margin_left_p2 = 15.0;
    let y2 = landscape_height - 20.0;

    add_text(&layer2, &font_bold, "Daily Energy Intake", Mm(margin_left_p2), Mm(y2), 16.0, COLOR_TITLE);
    add_text(&layer2, &font, &date_range, Mm(120.0), Mm(y2), 11.0, COLOR_BLACK);

    match chart_for(&dashboard, ctx) {
        Ok(png_bytes) => {
            let dynamic_image = printpdf::image_crate::load_from_memory(&png_bytes)
                .map_err(|e| AppError::Chart(e.to_string()))?;
            let pdf_image = Image::from_dynamic_image(&dynamic_image);

            // 1000x400 pixels at 120 DPI = ~212mm x 85mm
            let transform = ImageTransform {
                translate_x: Some(Mm(margin_left_p2)),
                translate_y: Some(Mm(y2 - 100.0)),
                dpi: Some(120.0),
                ..Default::default()
            };

            pdf_image.add_to_layer(layer2.clone(), transform);
        }
        Err(e) => {
            warn!(error = %e, "Chart rendering failed, report continues without it");
            add_text(&layer2, &font, &format!("Chart generation error: {}", e), Mm(margin_left_p2), Mm(y2 - 10.0), 9.0, COLOR_OVER);
        }
    }

    // Save PDF
    let path = resolve_output_path(
        output_path,
        report_dir,
        format!("fitmacro-report-{}-{}.pdf", file_stem(&ctx.username), today),
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| AppError::Report(e.to_string()))?;

    info!(user_id = ctx.user_id, path = %path.display(), "Progress report generated");

    Ok(GenerateReportResponse {
        success: true,
        file_path: path.display().to_string(),
        days_analyzed,
        days_logged,
        date_range,
        message: format!(
            "Progress report generated with {} logged days out of {}",
            days_logged, days_analyzed
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::tools::food_items::add_food_item;
    use crate::tools::meals::log_meal_item;
    use crate::tools::test_support::setup;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fitmacro-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_chart_y_max() {
        let series = vec![
            DailyValue { date: d(1), total: 1800.0 },
            DailyValue { date: d(2), total: 2400.0 },
        ];
        assert!((chart_y_max(&series, Some(2000.0)) - 2760.0).abs() < 1e-9);
        assert!((chart_y_max(&series, Some(3000.0)) - 3450.0).abs() < 1e-9);
        assert_eq!(chart_y_max(&[], None), 100.0);
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let labels = ChartLabels { series: "kcal".into(), goal: "goal".into() };
        assert!(generate_calorie_chart(&[], None, &labels, 200, 100).is_err());
    }

    #[test]
    fn test_file_stem_strips_path_characters() {
        assert_eq!(file_stem("anna_k-1"), "anna_k-1");
        assert_eq!(file_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_stem("a\\b:c*?"), "a_b_c__");
        assert_eq!(file_stem("Ольга"), "_____");
        assert_eq!(file_stem(""), "user");

        let path = resolve_output_path(None, Path::new("/tmp/reports"), format!("r-{}.pdf", file_stem("x/../y")));
        assert_eq!(path, PathBuf::from("/tmp/reports/r-x____y.pdf"));
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = Path::new("/tmp/reports");
        assert_eq!(
            resolve_output_path(None, dir, "a.pdf".to_string()),
            PathBuf::from("/tmp/reports/a.pdf")
        );
        assert_eq!(
            resolve_output_path(Some("  "), dir, "a.pdf".to_string()),
            PathBuf::from("/tmp/reports/a.pdf")
        );
        assert_eq!(
            resolve_output_path(Some("/x/y.pdf"), dir, "a.pdf".to_string()),
            PathBuf::from("/x/y.pdf")
        );
    }

    #[test]
    fn test_progress_report_writes_pdf() {
        let (db, ctx) = setup("report");
        let food = add_food_item(&db, &ctx, crate::models::FoodItemCreate {
            user_id: None,
            name: "Pasta".to_string(),
            brand: String::new(),
            kcal_per_100g: 350.0,
            protein_per_100g: 12.0,
            fat_per_100g: 1.5,
            carb_per_100g: 71.0,
        })
        .unwrap()
        .item
        .id;
        log_meal_item(&db, &ctx, d(10), MealType::Dinner, food, 150.0).unwrap();
        log_meal_item(&db, &ctx, d(14), MealType::Lunch, food, 200.0).unwrap();

        let dir = scratch_dir("pdf");
        let resp = generate_progress_report(&db, &ctx, d(14), None, &dir).unwrap();

        assert!(resp.success);
        assert_eq!(resp.days_analyzed, 14);
        assert_eq!(resp.days_logged, 2);
        assert_eq!(resp.date_range, "2025-09-01 to 2025-09-14");

        let bytes = std::fs::read(&resp.file_path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
