//! # Run Summary
//!
//! Human-readable record of every generation batch, in the order the
//! batches ran: how many rows went into which table and which parent values
//! they shared.

use std::fmt;

/// Ordered summary lines of one run.
#[derive(Debug, Default, Clone)]
pub struct Summary {
    lines: Vec<String>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_order() {
        let mut summary = Summary::new();
        summary.push("10 rows created in table users");
        summary.push(String::from("5 rows created in table contacts"));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.lines()[0], "10 rows created in table users");
        assert_eq!(
            summary.to_string(),
            "10 rows created in table users\n5 rows created in table contacts\n"
        );
    }
}
