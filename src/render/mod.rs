//! Terminal rendering of grid snapshots.
//!
//! Each unit is drawn as its label, decorated by status so the grid stays
//! readable without colour:
//!
//! | status      | cell     |
//! |-------------|----------|
//! | available   | ` A1 `   |
//! | selected    | `[A1]`   |
//! | booked      | `#A1#`   |
//! | unavailable | `-A1-`   |

use std::io::Write;

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use crate::error::Result;
use crate::grid::{Grid, UnitStatus};
use crate::selection;
use crate::width::{display_width, pad_to};

#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub use_color: bool,
    pub show_legend: bool,
    pub show_summary: bool,
    /// Spaces between cells.
    pub gap: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            use_color: true,
            show_legend: true,
            show_summary: true,
            gap: 1,
        }
    }
}

/// Draws grid snapshots to a terminal or any writer.
pub struct GridRenderer {
    settings: RendererSettings,
}

impl GridRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Queue the grid, legend and summary onto `writer` and flush it.
    pub fn render(&self, writer: &mut impl Write, grid: &Grid) -> Result<()> {
        let cell_width = grid
            .units()
            .map(|unit| display_width(unit.label()) + 2)
            .max()
            .unwrap_or(0);
        let gap = " ".repeat(self.settings.gap);

        for row in grid.rows() {
            for (idx, unit) in row.iter().enumerate() {
                if idx > 0 {
                    queue!(writer, Print(&gap))?;
                }
                let cell = pad_to(&decorate(unit.label(), unit.status()), cell_width);
                if self.settings.use_color {
                    queue!(
                        writer,
                        SetForegroundColor(status_color(unit.status())),
                        Print(cell),
                        ResetColor
                    )?;
                } else {
                    queue!(writer, Print(cell))?;
                }
            }
            queue!(writer, Print("\n"))?;
        }

        if self.settings.show_legend {
            let counts = grid.counts();
            queue!(
                writer,
                Print(format!(
                    "available: {}  selected: {}  booked: {}  unavailable: {}\n",
                    counts.available, counts.selected, counts.booked, counts.unavailable
                ))
            )?;
        }

        if self.settings.show_summary {
            let summary = selection::summarize(grid);
            queue!(
                writer,
                Print(format!(
                    "selected units: {}  price per unit: {}  total: {}\n",
                    summary.selected_count,
                    grid.price_per_unit(),
                    summary.total_cost
                ))
            )?;
            if !grid.emi_options().is_empty() {
                queue!(
                    writer,
                    Print(format!("emi: {}\n", grid.emi_options().join(" | ")))
                )?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    pub fn render_to_string(&self, grid: &Grid) -> Result<String> {
        let mut buffer = Vec::new();
        self.render(&mut buffer, grid)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn decorate(label: &str, status: UnitStatus) -> String {
    match status {
        UnitStatus::Available => format!(" {label} "),
        UnitStatus::Selected => format!("[{label}]"),
        UnitStatus::Booked => format!("#{label}#"),
        UnitStatus::Unavailable => format!("-{label}-"),
    }
}

fn status_color(status: UnitStatus) -> Color {
    match status {
        UnitStatus::Available => Color::Green,
        UnitStatus::Selected => Color::Cyan,
        UnitStatus::Booked => Color::DarkGrey,
        UnitStatus::Unavailable => Color::Red,
    }
}
