use std::{fs::File, io::BufReader, path::Path};

use tempfile::NamedTempFile;

use crate::error::{GraderError, Result};

/// A CSV sheet held in memory. Every transformation returns a new table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn read_csv(path: &Path) -> Result<Table> {
        let file = File::open(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Table::new(headers, rows))
    }

    /// Writes through a temp file in the destination directory so a failed
    /// write never truncates an existing sheet.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
            wtr.write_record(&self.headers)?;
            for row in self.rows.iter() {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }
        tmp.persist(path)?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| GraderError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let i = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[i].as_str()).collect())
    }

    /// Appends `name`, or replaces it in place when it already exists.
    pub fn with_column(&self, name: &str, values: Vec<String>) -> Table {
        let mut headers = self.headers.clone();
        let mut rows = self.rows.clone();
        match self.column_index(name) {
            Some(i) => {
                for (row, value) in rows.iter_mut().zip(values) {
                    row[i] = value;
                }
            }
            None => {
                headers.push(name.to_string());
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Table::new(headers, rows)
    }

    /// Adds empty columns for every name not already present.
    pub fn with_empty_columns(&self, names: &[String]) -> Table {
        let mut out = self.clone();
        for name in names {
            if !out.has_column(name) {
                out = out.with_column(name, vec![String::new(); out.len()]);
            }
        }
        out
    }

    pub fn rename_column(&self, from: &str, to: &str) -> Table {
        let headers = self
            .headers
            .iter()
            .map(|h| if h == from { to.to_string() } else { h.clone() })
            .collect();
        Table::new(headers, self.rows.clone())
    }

    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<usize>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|i| row[*i].clone()).collect())
            .collect();
        Ok(Table::new(names.iter().map(|n| n.to_string()).collect(), rows))
    }

    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Table> {
        let i = self.require_column(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[i] == value)
            .cloned()
            .collect();
        Ok(Table::new(self.headers.clone(), rows))
    }

    pub fn map_column(&self, column: &str, f: impl Fn(&str) -> String) -> Result<Table> {
        let i = self.require_column(column)?;
        let mut rows = self.rows.clone();
        for row in rows.iter_mut() {
            row[i] = f(&row[i]);
        }
        Ok(Table::new(self.headers.clone(), rows))
    }

    /// Stacks tables, taking the union of headers in first-seen order.
    pub fn concat(tables: &[Table]) -> Table {
        let mut headers: Vec<String> = Vec::new();
        for table in tables {
            for h in table.headers.iter() {
                if !headers.contains(h) {
                    headers.push(h.clone());
                }
            }
        }
        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<Option<usize>> =
                headers.iter().map(|h| table.column_index(h)).collect();
            for row in table.rows.iter() {
                rows.push(
                    positions
                        .iter()
                        .map(|p| p.map(|i| row[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
        }
        Table::new(headers, rows)
    }
}
