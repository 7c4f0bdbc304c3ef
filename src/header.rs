// Header-row location and field-to-column resolution.
//
// The source workbooks drift between exports: the header is not always row 0
// and column names gain or lose underscores and suffixes. Resolution is a
// two-stage contract: locate the header row (or default to 0), then map each
// logical field to a column by case-insensitive substring search with a fixed
// fallback index. The result is total: every field always has some index, so
// nothing downstream branches on "column missing". When both the search and
// the fallback are wrong the row normalizer's defaults absorb the damage.
use calamine::Data;

/// Rows inspected when looking for the header.
const HEADER_SCAN_LIMIT: usize = 10;

/// A row qualifies as the header when any cell equals one of these.
const HEADER_TOKENS: [&str; 3] = ["FECHA", "EMPRESA", "PRODUCTO"];

/// Resolved column indices for the daily operational sheet.
#[derive(Debug, Clone, Copy)]
pub struct OperationalColumns {
    pub fecha: usize,
    pub producto: usize,
    pub destino: usize,
    pub ton_prog: usize,
    pub ton_real: usize,
    pub eq_prog: usize,
    pub eq_real: usize,
    pub regulacion: usize,
    pub sda: usize,
    pub pang: usize,
    pub faena_meta: usize,
    pub faena_real: usize,
}

/// Resolved column indices for the equipment-arrival sheet.
#[derive(Debug, Clone, Copy)]
pub struct ArrivalColumns {
    pub fecha: usize,
    pub destino: usize,
    pub empresa: usize,
    pub hora: usize,
}

impl OperationalColumns {
    pub fn resolve(header: &[Data]) -> Self {
        let cells = normalized_cells(header);
        Self {
            fecha: resolve_column(&cells, "FECHA", 1),
            producto: resolve_column(&cells, "PRODUCTO", 31),
            destino: resolve_column(&cells, "DESTINO", 32),
            ton_prog: resolve_column(&cells, "TON PROG", 33),
            ton_real: resolve_column(&cells, "TON REAL", 34),
            eq_prog: resolve_column(&cells, "EQ PROG", 35),
            eq_real: resolve_column(&cells, "EQ REAL", 36),
            regulacion: resolve_column(&cells, "REGULACION", 46),
            sda: resolve_column(&cells, "TPO SDA", 4),
            pang: resolve_column(&cells, "TPO PANG", 5),
            faena_meta: resolve_column(&cells, "FAENA META", 49),
            faena_real: resolve_column(&cells, "FAENA REAL", 50),
        }
    }
}

impl ArrivalColumns {
    pub fn resolve(header: &[Data]) -> Self {
        let cells = normalized_cells(header);
        Self {
            fecha: resolve_column(&cells, "FECHA", 0),
            destino: resolve_column(&cells, "DESTINO", 3),
            empresa: resolve_column(&cells, "EMPRESA", 11),
            hora: resolve_column(&cells, "HORA", 14),
        }
    }
}

/// Scan the first rows of the grid for one that contains a known header
/// token; default to row 0 when none qualifies.
pub fn find_header_row(grid: &[Vec<Data>]) -> usize {
    for (i, row) in grid.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let qualifies = row
            .iter()
            .any(|c| HEADER_TOKENS.contains(&normalize_cell(c).as_str()));
        if qualifies {
            return i;
        }
    }
    0
}

// Uppercased, trimmed, underscores read as spaces so "TON_PROG" and
// "TON PROG" headers resolve the same way.
fn normalize_cell(cell: &Data) -> String {
    cell.to_string().trim().to_uppercase().replace('_', " ")
}

fn normalized_cells(header: &[Data]) -> Vec<String> {
    header.iter().map(normalize_cell).collect()
}

fn resolve_column(cells: &[String], token: &str, fallback: usize) -> usize {
    cells
        .iter()
        .position(|c| c.contains(token))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Data> {
        cells.iter().map(|c| Data::String((*c).to_string())).collect()
    }

    #[test]
    fn resolves_by_substring_before_fallback() {
        let header = row(&["FECHA", "PRODUCTO", "DESTINO", "TON PROG", "TON REAL"]);
        let cols = OperationalColumns::resolve(&header);
        assert_eq!(cols.fecha, 0);
        assert_eq!(cols.producto, 1);
        assert_eq!(cols.destino, 2);
        assert_eq!(cols.ton_prog, 3);
        assert_eq!(cols.ton_real, 4);
        // Absent fields keep their fixed fallbacks.
        assert_eq!(cols.regulacion, 46);
        assert_eq!(cols.faena_real, 50);
    }

    #[test]
    fn underscored_headers_match_too() {
        let header = row(&["Fecha", "ton_prog", "ton_real", "eq_prog", "eq_real"]);
        let cols = OperationalColumns::resolve(&header);
        assert_eq!(cols.ton_prog, 1);
        assert_eq!(cols.ton_real, 2);
        assert_eq!(cols.eq_prog, 3);
        assert_eq!(cols.eq_real, 4);
    }

    #[test]
    fn header_row_found_past_preamble() {
        let grid = vec![
            row(&["INFORME DIARIO", ""]),
            row(&["", ""]),
            row(&["FECHA", "EMPRESA", "DESTINO", "HORA"]),
            row(&["2024-01-01", "M&Q SPA", "PLANTA", "8:00"]),
        ];
        assert_eq!(find_header_row(&grid), 2);
    }

    #[test]
    fn header_row_defaults_to_zero() {
        let grid = vec![
            row(&["colA", "colB"]),
            row(&["1", "2"]),
        ];
        assert_eq!(find_header_row(&grid), 0);
    }

    #[test]
    fn arrival_fallbacks_hold_without_header() {
        let header = row(&["", "", ""]);
        let cols = ArrivalColumns::resolve(&header);
        assert_eq!(cols.fecha, 0);
        assert_eq!(cols.destino, 3);
        assert_eq!(cols.empresa, 11);
        assert_eq!(cols.hora, 14);
    }
}
