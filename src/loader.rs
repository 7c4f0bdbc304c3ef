// Table builder: workbook → canonical record collections.
//
// Mirrors the ingestion contract of the daily report flow: decode the whole
// sheet into a grid, resolve the header once, normalize every remaining row,
// silently drop rejects. Only two conditions surface as errors, both
// sheet-level: fewer than two rows in total, or zero rows surviving
// normalization.
use crate::header::{find_header_row, ArrivalColumns, OperationalColumns};
use crate::normalize::{normalize_arrival, normalize_operational};
use crate::types::{ArrivalRow, OperationalRow};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use std::error::Error;

/// Per-import diagnostics printed by the CLI after a load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub sheet: String,
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
}

// The operational workbook names its data sheet "Base de Datos"; arrival
// workbooks drift more, so several tokens are accepted.
const OPERATIONAL_SHEET_TOKENS: [&str; 1] = ["BASE DE DATOS"];
const ARRIVAL_SHEET_TOKENS: [&str; 3] = ["BASE", "LLEGADA", "DATOS"];

pub fn load_operational(path: &str) -> Result<(Vec<OperationalRow>, LoadReport), Box<dyn Error>> {
    let (sheet, grid) = read_grid(path, &OPERATIONAL_SHEET_TOKENS)?;
    build_operational(&sheet, &grid)
}

pub fn load_arrivals(path: &str) -> Result<(Vec<ArrivalRow>, LoadReport), Box<dyn Error>> {
    let (sheet, grid) = read_grid(path, &ARRIVAL_SHEET_TOKENS)?;
    build_arrivals(&sheet, &grid)
}

pub fn build_operational(
    sheet: &str,
    grid: &[Vec<Data>],
) -> Result<(Vec<OperationalRow>, LoadReport), Box<dyn Error>> {
    build_table(sheet, grid, normalize_operational)
}

pub fn build_arrivals(
    sheet: &str,
    grid: &[Vec<Data>],
) -> Result<(Vec<ArrivalRow>, LoadReport), Box<dyn Error>> {
    build_table(sheet, grid, normalize_arrival)
}

trait ResolveColumns: Sized {
    fn resolve_header(header: &[Data]) -> Self;
}

impl ResolveColumns for OperationalColumns {
    fn resolve_header(header: &[Data]) -> Self {
        Self::resolve(header)
    }
}

impl ResolveColumns for ArrivalColumns {
    fn resolve_header(header: &[Data]) -> Self {
        Self::resolve(header)
    }
}

fn build_table<C, R>(
    sheet: &str,
    grid: &[Vec<Data>],
    normalize: fn(&[Data], &C) -> Option<R>,
) -> Result<(Vec<R>, LoadReport), Box<dyn Error>>
where
    C: ResolveColumns,
{
    if grid.len() < 2 {
        return Err("archivo vacío o inutilizable".into());
    }
    let header_idx = find_header_row(grid);
    let cols = C::resolve_header(&grid[header_idx]);

    let mut records = Vec::new();
    let mut rejected = 0usize;
    for row in &grid[header_idx + 1..] {
        match normalize(row, &cols) {
            Some(rec) => records.push(rec),
            None => rejected += 1,
        }
    }
    if records.is_empty() {
        return Err("ninguna fila pudo ser normalizada".into());
    }
    let report = LoadReport {
        sheet: sheet.to_string(),
        total_rows: records.len() + rejected,
        accepted_rows: records.len(),
        rejected_rows: rejected,
    };
    Ok((records, report))
}

fn read_grid(path: &str, tokens: &[&str]) -> Result<(String, Vec<Vec<Data>>), Box<dyn Error>> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let sheet = select_sheet(&names, tokens).ok_or("el libro no contiene hojas")?;
    let range = workbook.worksheet_range(&sheet)?;
    let grid: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
    Ok((sheet, grid))
}

fn select_sheet(names: &[String], tokens: &[&str]) -> Option<String> {
    names
        .iter()
        .find(|n| {
            let upper = n.to_uppercase();
            tokens.iter().any(|t| upper.contains(t))
        })
        .or_else(|| names.first())
        .cloned()
}

/// Distinct calendar dates present in a record collection, most recent
/// first. The first entry is the default report filter.
pub fn distinct_dates_desc(dates: impl Iterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    let mut v: Vec<NaiveDate> = dates.collect();
    v.sort_unstable();
    v.dedup();
    v.reverse();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn sample_grid() -> Vec<Vec<Data>> {
        vec![
            vec![s("FECHA"), s("PRODUCTO"), s("TON_PROG"), s("TON_REAL")],
            vec![Data::Float(45292.0), s("Litio A"), Data::Float(100.0), Data::Float(90.0)],
            vec![Data::Float(45292.0), s("Litio A"), Data::Float(50.0), Data::Float(0.0)],
            vec![Data::Float(45293.0), s("Litio B"), Data::Float(20.0), Data::Float(25.0)],
        ]
    }

    #[test]
    fn builds_table_and_counts_rejects() {
        let mut grid = sample_grid();
        grid.push(vec![s("no es fecha"), s("Litio C"), Data::Float(1.0), Data::Float(1.0)]);
        let (records, report) = build_operational("Base de Datos", &grid).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.accepted_rows, 3);
        assert_eq!(report.rejected_rows, 1);
        assert_eq!(records[0].producto, "LITIO A");
        assert_eq!(records[0].ton_prog, 100.0);
    }

    #[test]
    fn distinct_dates_are_descending() {
        let (records, _) = build_operational("Base de Datos", &sample_grid()).unwrap();
        let dates = distinct_dates_desc(records.iter().map(|r| r.fecha));
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn too_few_rows_is_an_error() {
        let grid = vec![vec![s("FECHA"), s("PRODUCTO")]];
        assert!(build_operational("Hoja1", &grid).is_err());
    }

    #[test]
    fn zero_survivors_is_an_error() {
        let grid = vec![
            vec![s("FECHA"), s("PRODUCTO")],
            vec![s("sin fecha"), s("Litio A")],
            vec![s("tampoco"), s("Litio B")],
        ];
        assert!(build_operational("Hoja1", &grid).is_err());
    }

    #[test]
    fn sheet_selection_prefers_tokens() {
        let names = vec!["Resumen".to_string(), "Base de Datos".to_string()];
        assert_eq!(
            select_sheet(&names, &OPERATIONAL_SHEET_TOKENS),
            Some("Base de Datos".to_string())
        );
        let names = vec!["Hoja1".to_string(), "LLEGADA EQ".to_string()];
        assert_eq!(
            select_sheet(&names, &ARRIVAL_SHEET_TOKENS),
            Some("LLEGADA EQ".to_string())
        );
        let names = vec!["Hoja1".to_string()];
        assert_eq!(
            select_sheet(&names, &ARRIVAL_SHEET_TOKENS),
            Some("Hoja1".to_string())
        );
    }

    #[test]
    fn arrival_grid_with_preamble() {
        let grid = vec![
            vec![s("CONTROL DE ACCESO")],
            vec![s("FECHA"), s("DESTINO"), s("EMPRESA"), s("HORA")],
            vec![s("01/01/2024"), s("planta"), s("mq spa"), s("6:30")],
        ];
        // Arrival fallback columns point far right; the resolver must pick
        // up the real positions from the located header row.
        let (records, report) = build_arrivals("LLEGADA", &grid).unwrap();
        assert_eq!(report.accepted_rows, 1);
        assert_eq!(records[0].empresa, "M&Q SPA");
        assert_eq!(records[0].hora, 6.5);
    }
}
