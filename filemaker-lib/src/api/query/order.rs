//! Sort order for find queries.

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `ascend`
    Ascend,
    /// `descend`
    Descend,
}

impl Direction {
    /// The direction on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascend => "ascend",
            Self::Descend => "descend",
        }
    }
}

/// Specifies the ordering of find results.
///
/// Fields are sent as `-sortfield.N`/`-sortorder.N` pairs, N starting at 1.
///
/// # Example
///
/// ```
/// use filemaker_lib::api::query::SortOrder;
///
/// // Sort by id, then by date, most recent first
/// let order = SortOrder::asc("id").then_desc("date");
///
/// // Same thing, `-` prefix meaning descending
/// let same = SortOrder::parse(["id", "-date"]);
/// assert_eq!(order, same);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortOrder {
    pub(crate) fields: Vec<(String, Direction)>,
}

impl SortOrder {
    /// Creates an ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            fields: vec![(field.into(), Direction::Ascend)],
        }
    }

    /// Creates a descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            fields: vec![(field.into(), Direction::Descend)],
        }
    }

    /// Builds an order from field names, a leading `-` meaning descending.
    pub fn parse<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|field| {
                let field = field.as_ref();
                match field.strip_prefix('-') {
                    Some(name) => (name.to_string(), Direction::Descend),
                    None => (field.to_string(), Direction::Ascend),
                }
            })
            .collect();
        Self { fields }
    }

    /// Adds a secondary ascending order on a field.
    pub fn then_asc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Direction::Ascend));
        self
    }

    /// Adds a secondary descending order on a field.
    pub fn then_desc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Direction::Descend));
        self
    }

    /// Returns the ordered fields with their directions.
    pub fn fields(&self) -> &[(String, Direction)] {
        &self.fields
    }

    /// Returns the wire parameters.
    pub(crate) fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.fields.len() * 2);
        for (i, (field, direction)) in self.fields.iter().enumerate() {
            params.push((format!("-sortfield.{}", i + 1), field.clone()));
            params.push((format!("-sortorder.{}", i + 1), direction.as_str().to_string()));
        }
        params
    }
}
