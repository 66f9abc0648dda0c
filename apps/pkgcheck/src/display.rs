//! Output rendering and formatting

use console::{Style, Term};
use pkgcheck_engine::{CheckerSpec, RunReport};
use pkgcheck_types::{CheckOutcome, ColorChoice};
use serde::Serialize;
use std::io;

/// Output renderer for CLI results
pub struct OutputRenderer {
    json_output: bool,
    colors: bool,
}

#[derive(Serialize)]
struct CheckListing<'a> {
    check: &'a str,
    checker: &'a str,
}

impl OutputRenderer {
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        let colors = match color_choice {
            ColorChoice::Always => {
                console::set_colors_enabled(true);
                true
            }
            ColorChoice::Never => {
                console::set_colors_enabled(false);
                false
            }
            ColorChoice::Auto => Term::stdout().features().colors_supported(),
        };
        Self {
            json_output,
            colors,
        }
    }

    /// Render a finished run
    pub fn render_report(&self, report: &RunReport) -> io::Result<()> {
        if self.json_output {
            let json = report.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }
        let text = report.render();
        if self.colors {
            for line in text.lines() {
                println!("{}", style_line(line));
            }
        } else {
            print!("{text}");
        }
        Ok(())
    }

    /// Render the registry listing
    pub fn render_checks(&self, registry: &[CheckerSpec]) -> io::Result<()> {
        let listing: Vec<CheckListing<'_>> = registry
            .iter()
            .flat_map(|spec| {
                spec.checks.iter().map(|check| CheckListing {
                    check: check.as_str(),
                    checker: spec.name,
                })
            })
            .collect();

        if self.json_output {
            let json = serde_json::to_string_pretty(&listing).map_err(io::Error::other)?;
            println!("{json}");
        } else {
            for entry in listing {
                println!("{}  {}", entry.check, entry.checker);
            }
        }
        Ok(())
    }
}

/// Color the outcome word that starts a check line
fn style_line(line: &str) -> String {
    let styled = [
        (CheckOutcome::Pass, Style::new().green()),
        (CheckOutcome::Fail, Style::new().red().bold()),
        (CheckOutcome::Skip, Style::new().yellow()),
    ];
    for (outcome, style) in styled {
        let word = outcome.to_string();
        if let Some(rest) = line.strip_prefix(&word) {
            if rest.starts_with(' ') {
                return format!("{}{rest}", style.apply_to(word));
            }
        }
    }
    line.to_string()
}
