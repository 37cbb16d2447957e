use anyhow::{anyhow, Context};
use std::io::BufRead;

/// One line of a solution file: an intervention and its calendar start.
pub type PlanLine = (String, i64);

/// Parses a solution file: one `<intervention> <calendar start>` pair per
/// line, blank lines ignored.
///
/// # Errors
/// - If a line does not hold exactly a name and an integer start.
pub fn parse_plan(reader: &mut impl BufRead) -> anyhow::Result<Vec<PlanLine>> {
    let mut lines = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading solution line {}", number + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| anyhow!("line {}: missing intervention name", number + 1))?;
        let start = parts
            .next()
            .ok_or_else(|| anyhow!("line {}: missing start time", number + 1))?
            .parse()
            .with_context(|| format!("line {}: start time is not an integer", number + 1))?;

        if parts.next().is_some() {
            return Err(anyhow!("line {}: trailing tokens", number + 1));
        }

        lines.push((name.to_owned(), start));
    }

    Ok(lines)
}

/// Formats a plan in the solution-file format.
#[must_use]
pub fn format_plan(lines: &[PlanLine]) -> String {
    let mut out = String::new();
    for (name, start) in lines {
        out.push_str(name);
        out.push(' ');
        out.push_str(&start.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plan_should_round_trip() -> anyhow::Result<()> {
        let plan = vec![("I1".to_owned(), 1), ("I2".to_owned(), 3)];
        let text = format_plan(&plan);
        let parsed = parse_plan(&mut std::io::Cursor::new(text))?;
        assert_eq!(plan, parsed);
        Ok(())
    }

    #[test]
    fn parse_skips_blank_lines() -> anyhow::Result<()> {
        let text = "I1 1\n\n  \nI2 2\n";
        let parsed = parse_plan(&mut std::io::Cursor::new(text))?;
        assert_eq!(parsed.len(), 2);
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(parse_plan(&mut std::io::Cursor::new("I1")).is_err());
        assert!(parse_plan(&mut std::io::Cursor::new("I1 x")).is_err());
        assert!(parse_plan(&mut std::io::Cursor::new("I1 1 extra")).is_err());
    }
}
