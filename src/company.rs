// Canonicalization of free-text transport company names.
//
// The same contractor shows up under many spellings across daily exports
// ("M&Q SpA", "m and q spa", "M.S. & D. SPA", ...). Names are reduced to a
// normalized key and looked up in a fixed equivalence table covering the
// known fleet operators. Unknown companies pass through unchanged: the
// function is total, and only lossy for names it knows.
use once_cell::sync::Lazy;
use std::collections::HashMap;

static EQUIVALENCES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("COSEDUCAM SA", "COSEDUCAM S A"),
        ("COSEDUCAM S A", "COSEDUCAM S A"),
        ("M AND Q SPA", "M&Q SPA"),
        ("M Q SPA", "M&Q SPA"),
        ("MQ SPA", "M&Q SPA"),
        ("M S AND D SPA", "M S & D SPA"),
        ("MS AND D SPA", "M S & D SPA"),
        ("M S D SPA", "M S & D SPA"),
        ("MSD SPA", "M S & D SPA"),
        ("JORQUERA TRANSPORTE S A", "JORQUERA TRANSPORTE S. A."),
        ("JORQUERA TRANSPORTE SA", "JORQUERA TRANSPORTE S. A."),
        ("TRANSPORTES JORQUERA S A", "JORQUERA TRANSPORTE S. A."),
        ("TRANSPORTE JORQUERA", "JORQUERA TRANSPORTE S. A."),
        ("AG SERVICES SPA", "AG SERVICES SPA"),
        ("A G SERVICES SPA", "AG SERVICES SPA"),
    ])
});

/// Canonicalize a company name: uppercase, trim, strip periods, read `&` as
/// the token `AND`, collapse whitespace runs, then map known variants to
/// their canonical spelling.
pub fn normalize_company(raw: &str) -> String {
    let upper = raw.to_uppercase().replace('.', "").replace('&', " AND ");
    let collapsed = upper.split_whitespace().collect::<Vec<_>>().join(" ");
    match EQUIVALENCES.get(collapsed.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_company;

    #[test]
    fn maps_spelling_variants_to_canonical() {
        assert_eq!(normalize_company("m and q spa"), "M&Q SPA");
        assert_eq!(normalize_company("M&Q SpA"), "M&Q SPA");
        assert_eq!(normalize_company("  m.s. & d. spa "), "M S & D SPA");
        assert_eq!(normalize_company("coseducam s.a."), "COSEDUCAM S A");
        assert_eq!(
            normalize_company("jorquera transporte s. a."),
            "JORQUERA TRANSPORTE S. A."
        );
        assert_eq!(normalize_company("a.g. services spa"), "AG SERVICES SPA");
    }

    #[test]
    fn canonical_spellings_are_fixed_points() {
        for canonical in [
            "COSEDUCAM S A",
            "M&Q SPA",
            "M S & D SPA",
            "JORQUERA TRANSPORTE S. A.",
            "AG SERVICES SPA",
        ] {
            assert_eq!(normalize_company(canonical), canonical);
        }
    }

    #[test]
    fn unknown_names_pass_through_normalized() {
        assert_eq!(normalize_company("NUEVA EMPRESA SPA"), "NUEVA EMPRESA SPA");
        assert_eq!(normalize_company("  otra   ltda. "), "OTRA LTDA");
    }
}
