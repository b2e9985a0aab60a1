//! Dynamic filter construction with bound parameters.
//!
//! User values never become part of the expression tree itself: every
//! condition refers to a `$n` placeholder and the values travel separately,
//! to be bound with `DataFrame::with_param_values`.

use datafusion::arrow::datatypes::DataType;
use datafusion::logical_expr::expr::Placeholder;
use datafusion::prelude::{Expr, ident, try_cast};
use datafusion::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `try_cast(column as int) >= $n`; rows whose value does not cast are excluded.
    YearAtLeast,
    YearAtMost,
    /// Case-insensitive substring match, OR-ed across the condition's columns.
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub columns: Vec<String>,
    pub operator: Operator,
    /// 1-based index into the parameter list.
    pub param: usize,
}

#[derive(Debug, Default)]
pub struct PredicateBuilder {
    conditions: Vec<Condition>,
    params: Vec<ScalarValue>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, columns: Vec<String>, operator: Operator, value: ScalarValue) {
        self.params.push(value);
        self.conditions.push(Condition {
            columns,
            operator,
            param: self.params.len(),
        });
    }

    pub fn year_at_least(&mut self, column: &str, year: i32) -> &mut Self {
        self.push(
            vec![column.to_string()],
            Operator::YearAtLeast,
            ScalarValue::Int32(Some(year)),
        );
        self
    }

    pub fn year_at_most(&mut self, column: &str, year: i32) -> &mut Self {
        self.push(
            vec![column.to_string()],
            Operator::YearAtMost,
            ScalarValue::Int32(Some(year)),
        );
        self
    }

    /// Adds a substring condition over `columns`. An empty column list adds
    /// nothing.
    pub fn contains_ignore_case(&mut self, columns: &[String], needle: &str) -> &mut Self {
        if !columns.is_empty() {
            self.push(
                columns.to_vec(),
                Operator::ContainsIgnoreCase,
                ScalarValue::Utf8(Some(like_pattern(needle))),
            );
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn params(&self) -> &[ScalarValue] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders the conjunction of all conditions, with its parameters.
    /// `None` when no condition was added.
    pub fn build(self) -> Option<(Expr, Vec<ScalarValue>)> {
        let predicate = self
            .conditions
            .iter()
            .map(|condition| render(condition, &self.params))
            .reduce(Expr::and)?;
        Some((predicate, self.params))
    }
}

fn placeholder(index: usize, data_type: DataType) -> Expr {
    Expr::Placeholder(Placeholder::new(format!("${}", index), Some(data_type)))
}

fn render(condition: &Condition, params: &[ScalarValue]) -> Expr {
    let data_type = params
        .get(condition.param - 1)
        .map(|p| p.data_type())
        .unwrap_or(DataType::Utf8);
    let value = placeholder(condition.param, data_type);

    let columns = condition.columns.iter().map(|c| ident(c.as_str()));
    let rendered = match condition.operator {
        Operator::YearAtLeast => columns
            .map(|c| try_cast(c, DataType::Int32).gt_eq(value.clone()))
            .reduce(Expr::and),
        Operator::YearAtMost => columns
            .map(|c| try_cast(c, DataType::Int32).lt_eq(value.clone()))
            .reduce(Expr::and),
        Operator::ContainsIgnoreCase => columns.map(|c| c.ilike(value.clone())).reduce(Expr::or),
    };

    rendered.unwrap_or_else(|| Expr::Literal(ScalarValue::Boolean(Some(true))))
}

/// Wraps a user substring in `%...%`, escaping LIKE wildcards so they match
/// literally.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
