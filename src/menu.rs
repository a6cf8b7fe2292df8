use std::io::{BufRead, Write};

use crate::{Error, Result};

/// Prints the numbered city list.
pub fn print_menu<'a>(out: &mut impl Write, cities: impl IntoIterator<Item = &'a str>) -> Result<()> {
    writeln!(out, "\nSelect a city to analyze:")?;
    for (i, city) in cities.into_iter().enumerate() {
        writeln!(out, "  {}. {city}", i + 1)?;
    }
    Ok(())
}

/// Resolves a 1-based menu entry.
pub fn select_city<'a>(cities: &[&'a str], input: &str) -> Result<&'a str> {
    let input = input.trim();
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| cities.get(i).copied())
        .ok_or_else(|| Error::InvalidSelection(format!("'{input}' (expected 1-{})", cities.len())))
}

/// Shows the menu and reads one selection.
pub fn prompt<'a>(
    input: &mut impl BufRead,
    out: &mut impl Write,
    cities: &[&'a str],
) -> Result<&'a str> {
    print_menu(out, cities.iter().copied())?;
    write!(out, "\nEnter a number (1-{}): ", cities.len())?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    select_city(cities, &line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITIES: [&str; 3] = ["Cali, Colombia", "Bogotá, Colombia", "Medellín, Colombia"];

    #[test]
    fn selects_by_number() {
        assert_eq!(select_city(&CITIES, "1").unwrap(), "Cali, Colombia");
        assert_eq!(select_city(&CITIES, " 3\n").unwrap(), "Medellín, Colombia");
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for input in ["0", "4", "", "cali", "-1"] {
            assert!(
                matches!(select_city(&CITIES, input), Err(Error::InvalidSelection(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn prompt_prints_menu_and_reads_line() {
        let mut input = "2\n".as_bytes();
        let mut out = Vec::new();

        let city = prompt(&mut input, &mut out, &CITIES).unwrap();

        assert_eq!(city, "Bogotá, Colombia");
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("  1. Cali, Colombia"));
        assert!(shown.contains("  3. Medellín, Colombia"));
        assert!(shown.contains("Enter a number (1-3)"));
    }
}
