//! Table rendering for session state.

use bmi_core::{
    BmiCategory, BmiRecord, EnvironmentFlag, EnvironmentState, Session, Setting, TextKey,
};
use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Previous results, newest first.
pub fn history_table(session: &Session, now: DateTime<Utc>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("When"),
        header_cell(&session.text(TextKey::Weight)),
        header_cell(&session.text(TextKey::Height)),
        header_cell("BMI"),
        header_cell("Category"),
    ]);
    apply_table_style(&mut table);
    for index in [0, 2, 3, 4] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (index, record) in session.history().records().iter().enumerate() {
        table.add_row(history_row(session, index + 1, record, now));
    }
    table
}

fn history_row(
    session: &Session,
    position: usize,
    record: &BmiRecord,
    now: DateTime<Utc>,
) -> Vec<Cell> {
    vec![
        dim_cell(position),
        Cell::new(record.relative_time(now)),
        Cell::new(record.weight_kg),
        Cell::new(record.height_cm),
        Cell::new(format!("{:.1}", record.bmi_value)).add_attribute(Attribute::Bold),
        category_cell(session, record.category),
    ]
}

/// Accessibility toggles and the text-size step.
pub fn settings_table(session: &Session) -> Table {
    let settings = session.settings();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(&session.text(TextKey::Accessibility)),
        header_cell("Key"),
        header_cell("State"),
    ]);
    apply_table_style(&mut table);
    for setting in Setting::ALL {
        table.add_row(vec![
            Cell::new(session.text(TextKey::for_setting(setting))),
            dim_cell(setting.name()),
            state_cell(settings.flag(setting)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Text size"),
        dim_cell("textSize"),
        Cell::new(format!("{:+}", settings.text_size)),
    ]);
    table
}

/// Attributes currently applied to the display environment.
pub fn environment_table(environment: &EnvironmentState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Attribute"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new("font-size"),
        Cell::new(format!("{}%", environment.font_scale_percent())),
    ]);
    for flag in EnvironmentFlag::ALL {
        table.add_row(vec![
            Cell::new(flag.class_name()),
            state_cell(environment.has_flag(flag)),
        ]);
    }
    table
}

/// One-line result, e.g. `Your BMI: 22.9 (Normal)`.
pub fn result_line(session: &Session, value: f64, category: BmiCategory) -> String {
    format!(
        "{}: {:.1} ({})",
        session.text(TextKey::YourBmi),
        value,
        session.text(TextKey::for_category(category))
    )
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn category_cell(session: &Session, category: BmiCategory) -> Cell {
    let color = match category {
        BmiCategory::Underweight => Color::Blue,
        BmiCategory::Normal => Color::Green,
        BmiCategory::Overweight => Color::Yellow,
        BmiCategory::Obese => Color::Red,
    };
    Cell::new(session.text(TextKey::for_category(category))).fg(color)
}

fn state_cell(enabled: bool) -> Cell {
    if enabled {
        Cell::new("on").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        dim_cell("off")
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
