use crate::reports::ArrivalPivot;
use serde::Serialize;
use std::error::Error;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(sin filas)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

// The pivot's columns are data-driven (one per destination), so the table is
// assembled through the builder instead of a derive.
pub fn preview_pivot(pivot: &ArrivalPivot) {
    if pivot.rows.is_empty() {
        println!("(sin llegadas para los filtros seleccionados)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(pivot_header(pivot));
    for row in &pivot.rows {
        let mut cells = vec![format!("{:02}:00", row.hour)];
        cells.extend(row.counts.iter().map(ToString::to_string));
        builder.push_record(cells);
    }
    let mut totals = vec!["Total".to_string()];
    totals.extend(pivot.totals.iter().map(ToString::to_string));
    builder.push_record(totals);
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn write_pivot_csv(path: &str, pivot: &ArrivalPivot) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(pivot_header(pivot))?;
    for row in &pivot.rows {
        let mut cells = vec![format!("{:02}:00", row.hour)];
        cells.extend(row.counts.iter().map(ToString::to_string));
        wtr.write_record(cells)?;
    }
    let mut totals = vec!["Total".to_string()];
    totals.extend(pivot.totals.iter().map(ToString::to_string));
    wtr.write_record(totals)?;
    wtr.flush()?;
    Ok(())
}

fn pivot_header(pivot: &ArrivalPivot) -> Vec<String> {
    let mut header = vec!["Hora".to_string()];
    header.extend(pivot.destinations.iter().cloned());
    header
}
