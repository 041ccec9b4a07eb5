//! Text-alignment ("stream") table detection over word boxes
//!
//! Pages without ruling lines still lay tables out on a grid: every row
//! splits into the same number of cells and the cells line up column by
//! column. Consecutive lines that agree on such a grid form one table.

use std::collections::BTreeMap;

use super::{TableGrid, Word};
use crate::types::BBox;

/// Detection tolerances, in points
#[derive(Debug, Clone, Copy)]
pub struct TableFinder {
    /// Horizontal gap between words that starts a new cell
    pub column_gap: f64,
    /// Maximum vertical gap between rows, as a multiple of the row height
    pub row_gap_ratio: f64,
    /// Slack allowed when matching cells to columns
    pub column_tolerance: f64,
}

impl Default for TableFinder {
    fn default() -> Self {
        Self {
            column_gap: 10.0,
            row_gap_ratio: 1.5,
            column_tolerance: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    x0: f64,
    x1: f64,
}

#[derive(Debug, Clone)]
struct Line {
    top: f64,
    bottom: f64,
    cells: Vec<Cell>,
}

impl Line {
    fn height(&self) -> f64 {
        (self.bottom - self.top).max(1.0)
    }

    fn bbox(&self) -> BBox {
        let x0 = self.cells.first().map(|c| c.x0).unwrap_or(0.0);
        let x1 = self.cells.last().map(|c| c.x1).unwrap_or(0.0);
        BBox::new(x0, self.top, x1, self.bottom)
    }
}

impl TableFinder {
    /// Find tables among a page's words
    pub fn find(&self, words: &[Word]) -> Vec<TableGrid> {
        let lines = self.lines(words);
        let mut tables = Vec::new();
        let mut run: Vec<&Line> = Vec::new();

        for line in &lines {
            let continues = match run.last() {
                Some(prev) => self.same_grid(prev, line),
                None => false,
            };
            if !continues {
                self.flush(&mut run, &mut tables);
            }
            if line.cells.len() >= 2 {
                run.push(line);
            }
        }
        self.flush(&mut run, &mut tables);

        tables
    }

    fn flush(&self, run: &mut Vec<&Line>, tables: &mut Vec<TableGrid>) {
        if run.len() >= 2 {
            let rows = run
                .iter()
                .map(|line| line.cells.iter().map(|c| Some(c.text.clone())).collect())
                .collect();
            let boxes: Vec<BBox> = run.iter().map(|line| line.bbox()).collect();
            let mut grid = TableGrid::new(rows);
            grid.bbox = BBox::union_all(&boxes);
            tables.push(grid);
        }
        run.clear();
    }

    fn same_grid(&self, prev: &Line, line: &Line) -> bool {
        if line.cells.len() < 2 || line.cells.len() != prev.cells.len() {
            return false;
        }
        if line.top - prev.bottom > prev.height() * self.row_gap_ratio {
            return false;
        }
        prev.cells.iter().zip(&line.cells).all(|(a, b)| {
            a.x0 <= b.x1 + self.column_tolerance && b.x0 <= a.x1 + self.column_tolerance
        })
    }

    fn lines(&self, words: &[Word]) -> Vec<Line> {
        let mut buckets: BTreeMap<i64, Vec<&Word>> = BTreeMap::new();
        for word in words {
            buckets.entry(word.top.round() as i64).or_default().push(word);
        }

        buckets
            .into_values()
            .map(|mut row| {
                row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
                let top = row.iter().map(|w| w.top).fold(f64::INFINITY, f64::min);
                let bottom = row.iter().map(|w| w.bottom).fold(f64::NEG_INFINITY, f64::max);

                let mut cells: Vec<Cell> = Vec::new();
                for word in row {
                    match cells.last_mut() {
                        Some(cell) if word.x0 - cell.x1 <= self.column_gap => {
                            cell.text.push(' ');
                            cell.text.push_str(&word.text);
                            cell.x1 = cell.x1.max(word.x1);
                        }
                        _ => cells.push(Cell {
                            text: word.text.clone(),
                            x0: word.x0,
                            x1: word.x1,
                        }),
                    }
                }

                Line { top, bottom, cells }
            })
            .collect()
    }
}
