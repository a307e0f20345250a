//! Sort allow-list for post listings.
//!
//! Only the columns enumerated here can reach an `ORDER BY` clause; raw
//! request strings never do.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Reads,
    Likes,
    Popularity,
}

impl SortField {
    pub const ALL: [SortField; 4] = [Self::Id, Self::Reads, Self::Likes, Self::Popularity];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Reads => "reads",
            Self::Likes => "likes",
            Self::Popularity => "popularity",
        }
    }

    /// Column name on the `posts` table.
    pub fn column(self) -> &'static str {
        self.as_str()
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid(
                    "sortBy",
                    format!("`{s}` is not one of id, reads, likes, popularity"),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::invalid(
                "direction",
                format!("`{other}` is not one of asc, desc"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl PostSort {
    /// Absent parameters fall back to `id asc`.
    pub fn parse(sort_by: Option<&str>, direction: Option<&str>) -> Result<Self, DomainError> {
        let field = sort_by.map(SortField::from_str).transpose()?.unwrap_or_default();
        let direction = direction
            .map(SortDirection::from_str)
            .transpose()?
            .unwrap_or_default();
        Ok(Self { field, direction })
    }
}
