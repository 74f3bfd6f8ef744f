use serde::{Deserialize, Serialize};

///
/// Many2One
///
/// Foreign-key-like association from local columns to the target model's
/// primary key. Empty column lists are filled from the target at bind time:
/// local names default to `<name>_<remote pk column>`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Many2One {
    pub name: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_columns: Vec<String>,
}

impl Many2One {
    #[must_use]
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            column_names: Vec::new(),
            remote_columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column_names(mut self, names: &[&str]) -> Self {
        self.column_names = names.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn remote_columns(mut self, names: &[&str]) -> Self {
        self.remote_columns = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Local and remote column counts given the target primary key. Pairing
    /// is only meaningful when they match.
    #[must_use]
    pub fn arity(&self, target_primary_key: &[String]) -> (usize, usize) {
        let remote = self.remote(target_primary_key).len();
        let local = if self.column_names.is_empty() {
            remote
        } else {
            self.column_names.len()
        };

        (local, remote)
    }

    /// Pair local and remote column names given the target primary key.
    #[must_use]
    pub fn column_pairs(&self, target_primary_key: &[String]) -> Vec<(String, String)> {
        let remote = self.remote(target_primary_key).to_vec();

        if self.column_names.is_empty() {
            remote
                .into_iter()
                .map(|r| (format!("{}_{r}", self.name), r))
                .collect()
        } else {
            self.column_names.iter().cloned().zip(remote).collect()
        }
    }

    fn remote<'a>(&'a self, target_primary_key: &'a [String]) -> &'a [String] {
        if self.remote_columns.is_empty() {
            target_primary_key
        } else {
            &self.remote_columns
        }
    }
}
