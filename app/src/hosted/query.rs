// app/src/hosted/query.rs

//! Filter/sort/range vocabulary for table reads and writes, rendered as
//! PostgREST query parameters by the REST backend.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
  Eq,
  Neq,
  Gt,
  Gte,
  Lt,
  Lte,
  /// Case-insensitive substring match; the hosted store evaluates it.
  ILikeContains,
  /// Value is a JSON array of accepted values.
  In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: String,
  pub op: FilterOp,
  pub value: Value,
}

impl Filter {
  pub fn new(column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
    Self {
      column: column.to_string(),
      op,
      value: value.into(),
    }
  }

  pub fn eq(column: &str, value: impl Into<Value>) -> Self {
    Self::new(column, FilterOp::Eq, value)
  }

  /// `column=op.value` as PostgREST expects it.
  pub fn to_param(&self) -> (String, String) {
    let rendered = match self.op {
      FilterOp::Eq => format!("eq.{}", scalar(&self.value)),
      FilterOp::Neq => format!("neq.{}", scalar(&self.value)),
      FilterOp::Gt => format!("gt.{}", scalar(&self.value)),
      FilterOp::Gte => format!("gte.{}", scalar(&self.value)),
      FilterOp::Lt => format!("lt.{}", scalar(&self.value)),
      FilterOp::Lte => format!("lte.{}", scalar(&self.value)),
      FilterOp::ILikeContains => format!("ilike.*{}*", scalar(&self.value)),
      FilterOp::In => {
        let items: Vec<String> = match &self.value {
          Value::Array(values) => values.iter().map(|v| format!("\"{}\"", scalar(v))).collect(),
          other => vec![format!("\"{}\"", scalar(other))],
        };
        format!("in.({})", items.join(","))
      }
    };
    (self.column.clone(), rendered)
  }
}

fn scalar(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => "null".to_string(),
    other => other.to_string(),
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
  pub column: String,
  pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
  pub filters: Vec<Filter>,
  pub order: Vec<Order>,
  pub limit: Option<usize>,
  pub offset: Option<usize>,
}

impl Query {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
    self.filter(Filter::eq(column, value))
  }

  pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
    self.filter(Filter::new(column, FilterOp::Gte, value))
  }

  pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
    self.filter(Filter::new(column, FilterOp::Lte, value))
  }

  pub fn ilike_contains(self, column: &str, term: &str) -> Self {
    self.filter(Filter::new(column, FilterOp::ILikeContains, term))
  }

  pub fn is_in(self, column: &str, values: Vec<Value>) -> Self {
    self.filter(Filter::new(column, FilterOp::In, Value::Array(values)))
  }

  pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
    self.order.push(Order {
      column: column.to_string(),
      ascending,
    });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn to_params(&self) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(self.filters.iter().map(Filter::to_param));
    if !self.order.is_empty() {
      let order = self
        .order
        .iter()
        .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
        .collect::<Vec<_>>()
        .join(",");
      params.push(("order".to_string(), order));
    }
    if let Some(limit) = self.limit {
      params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = self.offset {
      params.push(("offset".to_string(), offset.to_string()));
    }
    params
  }
}
