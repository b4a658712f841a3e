//! Plain-text tables for terminal output.

use engine::Money;

const COLUMN: usize = 14;

/// Renders a category matrix: a header line with the category names, then one
/// line per row with blanks where a column has run out.
pub fn matrix(categories: &[&str], rows: &[Vec<Option<Money>>]) -> Vec<String> {
    let header = categories
        .iter()
        .map(|category| format!("{category:>COLUMN$}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![header.trim_end().to_string()];
    for row in rows {
        let line = row
            .iter()
            .map(|cell| match cell {
                Some(amount) => format!("{amount:>COLUMN$}"),
                None => " ".repeat(COLUMN),
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line.trim_end().to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_keep_columns_aligned() {
        let rows = vec![
            vec![Some(Money::new(1_00)), Some(Money::new(250_00))],
            vec![None, Some(Money::new(3_50))],
        ];

        let lines = matrix(&["Ocio", "Salud"], &rows);

        assert_eq!(
            lines,
            vec![
                "          Ocio          Salud",
                "          1.00         250.00",
                "                         3.50",
            ]
        );
    }

    #[test]
    fn no_expenses_is_just_the_header() {
        assert_eq!(matrix(&["Ocio"], &[]), vec!["          Ocio"]);
    }
}
