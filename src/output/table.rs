//! Step × (tag, op) table and its CSV / JSON renderings

use std::collections::HashMap;
use std::io::Write;

use indexmap::IndexMap;
use serde::Serialize;

use crate::reduce::ReducedEventsDict;
use crate::Result;

/// One `(tag, op)` column, aligned to the table's step index.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    /// Outer header level
    pub tag: String,
    /// Inner header level
    pub op: String,
    /// `None` where the tag has no value at that step
    pub values: Vec<Option<f64>>,
}

/// Reduced series laid out as rows = steps, columns = `(tag, op)`.
///
/// Columns are ordered tag first (sorted), then op (requested order).
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedTable {
    steps: Vec<i64>,
    columns: Vec<TableColumn>,
}

impl ReducedTable {
    /// Lay out `reduced` as a table indexed by the union of all steps.
    #[must_use]
    pub fn from_reduced(reduced: &ReducedEventsDict) -> Self {
        let steps = reduced.step_union();
        let row_of: HashMap<i64, usize> = steps.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let mut columns = Vec::new();
        for tag in reduced.tags() {
            for op in reduced.ops() {
                let Some(series) = reduced.get(op, tag) else {
                    continue;
                };
                let mut values = vec![None; steps.len()];
                for (step, value) in series.iter() {
                    values[row_of[&step]] = Some(value);
                }
                columns.push(TableColumn {
                    tag: tag.to_string(),
                    op: op.to_string(),
                    values,
                });
            }
        }

        Self { steps, columns }
    }

    /// Row index.
    #[must_use]
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Data columns (the step index is not one of them).
    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Write as CSV with a two-line header.
    ///
    /// ```text
    /// tag,loss,loss
    /// reduce_op,mean,std
    /// 0,0.5,0.1
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates IO errors.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        write_csv_line(&mut out, "tag", self.columns.iter().map(|c| c.tag.as_str()))?;
        write_csv_line(&mut out, "reduce_op", self.columns.iter().map(|c| c.op.as_str()))?;

        for (i, step) in self.steps.iter().enumerate() {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values[i].map(|v| format!("{v:?}")).unwrap_or_default())
                .collect();
            write_csv_line(&mut out, &step.to_string(), cells.iter().map(String::as_str))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write as pretty-printed JSON.
    ///
    /// ```text
    /// {"step": [0, 1], "series": {"loss": {"mean": [0.5, 0.4]}}}
    /// ```
    ///
    /// NaN and missing values are written as `null`.
    ///
    /// # Errors
    ///
    /// Propagates serialization and IO errors.
    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        #[derive(Serialize)]
        struct JsonTable<'a> {
            step: &'a [i64],
            series: IndexMap<&'a str, IndexMap<&'a str, &'a [Option<f64>]>>,
        }

        let mut series: IndexMap<&str, IndexMap<&str, &[Option<f64>]>> = IndexMap::new();
        for column in &self.columns {
            series
                .entry(column.tag.as_str())
                .or_default()
                .insert(column.op.as_str(), column.values.as_slice());
        }

        serde_json::to_writer_pretty(
            out,
            &JsonTable {
                step: &self.steps,
                series,
            },
        )?;
        Ok(())
    }
}

fn write_csv_line<'a, W: Write>(
    out: &mut W,
    first: &str,
    rest: impl Iterator<Item = &'a str>,
) -> Result<()> {
    out.write_all(escape_csv(first).as_bytes())?;
    for cell in rest {
        out.write_all(b",")?;
        out.write_all(escape_csv(cell).as_bytes())?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

fn escape_csv(cell: &str) -> std::borrow::Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\"")).into()
    } else {
        cell.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::ReducedSeries;

    fn reduced() -> ReducedEventsDict {
        let mut reduced = ReducedEventsDict::new();
        reduced.insert("mean", "loss", ReducedSeries::new(vec![0, 1], vec![2.0, 6.0]));
        reduced.insert("max", "loss", ReducedSeries::new(vec![0, 1], vec![3.0, 7.0]));
        reduced.insert("mean", "acc", ReducedSeries::new(vec![1], vec![0.5]));
        reduced.insert("max", "acc", ReducedSeries::new(vec![1], vec![0.75]));
        reduced
    }

    #[test]
    fn test_column_order_tag_then_op() {
        let table = ReducedTable::from_reduced(&reduced());
        let keys: Vec<(&str, &str)> = table
            .columns()
            .iter()
            .map(|c| (c.tag.as_str(), c.op.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("acc", "mean"), ("acc", "max"), ("loss", "mean"), ("loss", "max")]
        );
        assert_eq!(table.steps(), &[0, 1]);
        assert_eq!(table.columns()[0].values, vec![None, Some(0.5)]);
    }

    #[test]
    fn test_csv_layout() {
        let mut buf = Vec::new();
        ReducedTable::from_reduced(&reduced()).write_csv(&mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "tag,acc,acc,loss,loss");
        assert_eq!(lines[1], "reduce_op,mean,max,mean,max");
        assert_eq!(lines[2], "0,,,2.0,3.0");
        assert_eq!(lines[3], "1,0.5,0.75,6.0,7.0");
    }

    #[test]
    fn test_csv_escapes_tags() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_layout() {
        let mut buf = Vec::new();
        ReducedTable::from_reduced(&reduced()).write_json(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["step"], serde_json::json!([0, 1]));
        assert_eq!(json["series"]["loss"]["max"], serde_json::json!([3.0, 7.0]));
        assert_eq!(json["series"]["acc"]["mean"], serde_json::json!([null, 0.5]));
    }
}
