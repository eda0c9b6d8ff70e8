//! Key pattern parsing for table scans.
//!
//! A pattern is turned into a single comparison on the primary key attribute
//! that the store evaluates server-side. Only one wildcard form is
//! understood: a `*` after at least one character means "begins with the text
//! before the first `*`". Any other pattern, including one starting with `*`,
//! is matched literally as a substring.

/// Server-side comparison applied to the primary key during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFilter {
    /// `BEGINS_WITH` comparison.
    BeginsWith(String),
    /// `CONTAINS` comparison.
    Contains(String),
}

impl ScanFilter {
    /// Parses a key pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynakv_core::kv::ScanFilter;
    ///
    /// assert_eq!(ScanFilter::from_pattern("user:*"), ScanFilter::BeginsWith("user:".into()));
    /// assert_eq!(ScanFilter::from_pattern("a*b*"), ScanFilter::BeginsWith("a".into()));
    /// assert_eq!(ScanFilter::from_pattern("user"), ScanFilter::Contains("user".into()));
    /// assert_eq!(ScanFilter::from_pattern("*user"), ScanFilter::Contains("*user".into()));
    /// ```
    pub fn from_pattern(pattern: &str) -> Self {
        match pattern.find('*') {
            Some(pos) if pos > 0 => ScanFilter::BeginsWith(pattern[..pos].to_string()),
            _ => ScanFilter::Contains(pattern.to_string()),
        }
    }

    /// The operand compared against the key.
    pub fn operand(&self) -> &str {
        match self {
            ScanFilter::BeginsWith(s) | ScanFilter::Contains(s) => s,
        }
    }

    /// DynamoDB filter expression for this comparison, with `#K` bound to the
    /// key attribute and `:v` to the operand.
    pub fn filter_expression(&self) -> &'static str {
        match self {
            ScanFilter::BeginsWith(_) => "begins_with(#K, :v)",
            ScanFilter::Contains(_) => "contains(#K, :v)",
        }
    }

    /// Evaluates the comparison locally.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            ScanFilter::BeginsWith(prefix) => key.starts_with(prefix.as_str()),
            ScanFilter::Contains(needle) => key.contains(needle.as_str()),
        }
    }
}
