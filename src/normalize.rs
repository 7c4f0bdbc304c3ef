// Row normalization: one raw sheet row plus resolved columns in, one
// canonical record out, or nothing.
//
// Rejection is driven by the date field alone (plus a minimum row width);
// every other field independently falls back to 0 or a sentinel. Dirty rows
// must not abort an import.
use calamine::Data;

use crate::coerce::{coerce_calendar_date, coerce_number, coerce_time_of_day};
use crate::company::normalize_company;
use crate::header::{ArrivalColumns, OperationalColumns};
use crate::types::{ArrivalRow, OperationalRow};

static EMPTY_CELL: Data = Data::Empty;

// Column indices come from fallbacks that may point past the end of a short
// row; an out-of-range index reads as an empty cell.
fn cell<'r>(row: &'r [Data], idx: usize) -> &'r Data {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

fn text_or(cell: &Data, sentinel: &str) -> String {
    let s = cell.to_string().trim().to_string();
    if s.is_empty() {
        sentinel.to_string()
    } else {
        s
    }
}

pub fn normalize_operational(row: &[Data], cols: &OperationalColumns) -> Option<OperationalRow> {
    if row.len() < 2 {
        return None;
    }
    let fecha = coerce_calendar_date(cell(row, cols.fecha))?;
    Some(OperationalRow {
        fecha,
        producto: text_or(cell(row, cols.producto), "SIN PRODUCTO").to_uppercase(),
        destino: text_or(cell(row, cols.destino), "S/D"),
        ton_prog: coerce_number(cell(row, cols.ton_prog)),
        ton_real: coerce_number(cell(row, cols.ton_real)),
        eq_prog: coerce_number(cell(row, cols.eq_prog)),
        eq_real: coerce_number(cell(row, cols.eq_real)),
        regulacion: coerce_number(cell(row, cols.regulacion)),
        sda_hours: coerce_time_of_day(cell(row, cols.sda)),
        pang_hours: coerce_time_of_day(cell(row, cols.pang)),
        faena_meta_hours: coerce_time_of_day(cell(row, cols.faena_meta)),
        faena_real_hours: coerce_time_of_day(cell(row, cols.faena_real)),
    })
}

pub fn normalize_arrival(row: &[Data], cols: &ArrivalColumns) -> Option<ArrivalRow> {
    if row.len() < 2 {
        return None;
    }
    let fecha = coerce_calendar_date(cell(row, cols.fecha))?;
    let raw_empresa = cell(row, cols.empresa).to_string();
    let empresa = if raw_empresa.trim().is_empty() {
        "SIN EMPRESA".to_string()
    } else {
        normalize_company(&raw_empresa)
    };
    Some(ArrivalRow {
        fecha,
        destino: text_or(cell(row, cols.destino), "SIN DESTINO").to_uppercase(),
        empresa,
        hora: coerce_time_of_day(cell(row, cols.hora)),
    })
}
