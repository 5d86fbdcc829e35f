//! Terminal output for the docforge binary, colored with [`console`].

use console::style;

/// A titled block of aligned `key: value` lines.
#[derive(Debug, Default)]
pub struct Panel {
    title: String,
    rows: Vec<(String, String)>,
}

impl Panel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, key: &str, value: impl Into<String>) -> Self {
        self.rows.push((key.to_string(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        let width = self.rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut out = format!(
            "\n{}\n{}\n",
            style(&self.title).bold().cyan(),
            style("=".repeat(self.title.len())).dim()
        );
        for (key, value) in &self.rows {
            out.push_str(&format!("  {}  {value}\n", style(format!("{key:<width$}")).dim()));
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// `[OK] text` in green.
pub fn success(text: &str) {
    println!("{} {text}", style("[OK]").green().bold());
}

/// `[WARN] text` in yellow.
pub fn warning(text: &str) {
    println!("{} {text}", style("[WARN]").yellow().bold());
}

/// `[step/total] text`.
pub fn step(step: u32, total: u32, text: &str) {
    println!("{} {text}", style(format!("[{step}/{total}]")).dim());
}
