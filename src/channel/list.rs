//! Channel list parsing
//!
//! The list is a tuner channels file with one entry per line. The channel
//! identifier is everything before the first `:`.

use std::path::Path;

use crate::error::{Error, Result};

/// Field delimiter in a channels file
pub const DELIMITER: char = ':';

/// Known channels, in file order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelList {
    names: Vec<String>,
}

impl ChannelList {
    /// Parse the contents of a channels file
    ///
    /// Blank lines and lines with an empty identifier are skipped.
    pub fn parse(text: &str) -> Self {
        let mut names: Vec<String> = Vec::new();
        for line in text.lines() {
            let name = line.split(DELIMITER).next().unwrap_or("").trim();
            if name.is_empty() || names.iter().any(|n| n == name) {
                continue;
            }
            names.push(name.to_string());
        }
        Self { names }
    }

    /// Build a list from identifiers
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.into();
            if !list.contains(&name) {
                list.names.push(name);
            }
        }
        list
    }

    /// Read and parse a channels file; fails if it holds no channels
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ChannelList {
                path: path.to_path_buf(),
                source,
            })?;

        let list = Self::parse(&text);
        if list.is_empty() {
            return Err(Error::NoChannels);
        }

        tracing::debug!(path = %path.display(), channels = list.len(), "Channel list loaded");
        Ok(list)
    }

    /// Whether `name` is a known channel
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// First channel in file order
    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Iterate over channel identifiers in file order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
