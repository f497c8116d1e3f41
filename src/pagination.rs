//! This module defines the common functionality for paging, sorting and searching lists of records.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};

use crate::{Error, db::QueryFilter};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of records per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The order to sort records in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    #[serde(rename = "asc")]
    Ascending,
    /// Sort in order of decreasing value.
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// The pagination query parameters common to all list endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaginationQuery {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The maximum number of records per page.
    pub limit: Option<u64>,
    /// The name of the field to sort by.
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// The direction to sort in.
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
    /// Only include records whose text matches this string, ignoring case.
    pub search: Option<String>,
}

/// The fields a resource can be sorted by.
#[derive(Debug)]
pub(crate) struct SortSpec {
    /// Pairs of the public field name and the SQL column it sorts by.
    pub(crate) fields: &'static [(&'static str, &'static str)],
    /// The public field name to sort by when none is requested.
    pub(crate) default_field: &'static str,
    /// The SQL column that breaks ties so that pages are stable.
    pub(crate) id_column: &'static str,
}

impl SortSpec {
    fn column_for(&self, field: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
    }
}

/// A validated page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of records on the page.
    pub limit: u64,
    /// The SQL column to sort by.
    pub sort_column: &'static str,
    /// The direction to sort in.
    pub sort_order: SortOrder,
    /// The trimmed search string, if any.
    pub search: Option<String>,
    id_column: &'static str,
}

impl PaginationQuery {
    /// Validate the query against `config` and the sortable fields in `sort_spec`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPagination] if `page` is zero, `limit` is zero
    /// or larger than the configured maximum, the page would start past the
    /// largest SQL offset, or `sortBy` names a field that cannot be sorted by.
    pub(crate) fn resolve(
        self,
        config: &PaginationConfig,
        sort_spec: &SortSpec,
    ) -> Result<PageRequest, Error> {
        let page = self.page.unwrap_or(config.default_page);
        if page == 0 {
            return Err(Error::InvalidPagination(
                "page must be at least 1".to_owned(),
            ));
        }

        let limit = self.limit.unwrap_or(config.default_page_size);
        if limit == 0 || limit > config.max_page_size {
            return Err(Error::InvalidPagination(format!(
                "limit must be between 1 and {}",
                config.max_page_size
            )));
        }

        let offset_fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !offset_fits {
            return Err(Error::InvalidPagination(format!(
                "page {page} is too large for a limit of {limit}"
            )));
        }

        let sort_field = self.sort_by.as_deref().unwrap_or(sort_spec.default_field);
        let sort_column = sort_spec.column_for(sort_field).ok_or_else(|| {
            Error::InvalidPagination(format!("cannot sort by \"{sort_field}\""))
        })?;

        let search = self
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());

        Ok(PageRequest {
            page,
            limit,
            sort_column,
            sort_order: self.sort_order.unwrap_or(SortOrder::Descending),
            search,
            id_column: sort_spec.id_column,
        })
    }
}

impl PageRequest {
    /// The number of records before the first record of the page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// The search string as a SQL `LIKE` pattern with wildcards escaped.
    ///
    /// The pattern must be used with `ESCAPE '\'`.
    pub(crate) fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|search| {
            let escaped = search
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }

    fn order_clause(&self) -> String {
        format!(
            "ORDER BY {} {}, {} ASC",
            self.sort_column,
            self.sort_order.as_sql(),
            self.id_column
        )
    }
}

/// The paging details of a [Page].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of records per page.
    pub limit: u64,
    /// The number of records across all pages.
    pub total: u64,
    /// The number of pages needed to show all records.
    pub total_pages: u64,
}

/// A page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The records on this page.
    pub data: Vec<T>,
    /// The paging details.
    pub meta: PageMeta,
}

impl<T> Page<T> {
    fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page: request.page,
                limit: request.limit,
                total,
                total_pages: total.div_ceil(request.limit),
            },
        }
    }
}

/// Count and fetch one page of rows.
///
/// `columns` is the select list and `from` the `FROM` clause including joins,
/// e.g. `"FROM account a"`. Rows are restricted by `filter` and ordered by
/// `request`.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails or a row cannot be mapped.
pub(crate) fn fetch_page<T, F>(
    connection: &Connection,
    columns: &str,
    from: &str,
    filter: &QueryFilter,
    request: &PageRequest,
    map_row: F,
) -> Result<Page<T>, Error>
where
    F: FnMut(&Row) -> Result<T, rusqlite::Error>,
{
    let where_clause = filter.where_clause();

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) {from} WHERE {where_clause}"),
        params_from_iter(filter.params()),
        |row| row.get(0),
    )?;

    let query = format!(
        "SELECT {columns} {from} WHERE {where_clause} {} LIMIT ? OFFSET ?",
        request.order_clause()
    );
    let params = filter.params().iter().cloned().chain([
        Value::Integer(request.limit as i64),
        Value::Integer(request.offset() as i64),
    ]);

    let data = connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_row)?
        .collect::<Result<Vec<T>, rusqlite::Error>>()?;

    Ok(Page::new(data, request, total as u64))
}
