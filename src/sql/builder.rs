//! Builds the paginated, sorted, filtered SELECT used by every list read.

use crate::sql::params::PgBindValue;

/// Quote identifier for PostgreSQL (safe: only from closed enums and consts).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// One predicate fragment of the list WHERE clause. Fragments are ANDed in
/// the order given; callers omit a fragment entirely when its value is
/// absent. The not-deleted predicate is not a fragment: the builder appends
/// it unconditionally after all caller fragments.
pub enum Filter {
    /// Exact match on a column.
    Eq(&'static str, PgBindValue),
    /// Case-sensitive substring containment on a text column.
    Contains(&'static str, String),
}

/// Escape LIKE metacharacters so the needle is matched literally.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// The bind value binds as binary, so non-text placeholders carry a SQL cast
/// (same technique as casting $n::timestamptz for string-bound timestamps).
fn placeholder(n: u32, v: &PgBindValue) -> String {
    match v {
        PgBindValue::I64(_) => format!("${}::bigint", n),
        PgBindValue::Bool(_) => format!("${}::boolean", n),
        PgBindValue::Null | PgBindValue::Str(_) => format!("${}", n),
    }
}

const MAX_PAGE_SIZE: u32 = 1000;

/// SELECT one page: caller fragments ANDed in order, NOT deleted appended
/// last, ORDER BY the sort column with an id tiebreak, LIMIT size OFFSET
/// page*size. `page` is zero-based. The secondary id sort keeps pages stable
/// when the sort column has ties.
pub fn select_page(
    table: &'static str,
    columns: &'static str,
    filters: &[Filter],
    sort_column: &'static str,
    descending: bool,
    page: u32,
    size: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();

    let mut where_parts = Vec::new();
    for f in filters {
        match f {
            Filter::Eq(col, val) => {
                let n = q.push_param(val.clone());
                where_parts.push(format!("{} = {}", quoted(col), placeholder(n, val)));
            }
            Filter::Contains(col, needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                let n = q.push_param(PgBindValue::Str(pattern));
                where_parts.push(format!("{} LIKE ${} ESCAPE '\\'", quoted(col), n));
            }
        }
    }
    where_parts.push("NOT deleted".to_string());

    let direction = if descending { "DESC" } else { "ASC" };
    let order_clause = if sort_column == "id" {
        format!(" ORDER BY {} {}", quoted("id"), direction)
    } else {
        format!(" ORDER BY {} {}, {} ASC", quoted(sort_column), direction, quoted("id"))
    };

    let size = size.min(MAX_PAGE_SIZE);
    let offset = page as u64 * size as u64;
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}{} LIMIT {} OFFSET {}",
        columns,
        quoted(table),
        where_parts.join(" AND "),
        order_clause,
        size,
        offset
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: &str = "id, user_id, title";

    #[test]
    fn default_page_has_only_not_deleted() {
        let q = select_page("post", COLS, &[], "id", false, 0, 2);
        assert_eq!(
            q.sql,
            "SELECT id, user_id, title FROM \"post\" WHERE NOT deleted ORDER BY \"id\" ASC LIMIT 2 OFFSET 0"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn fragments_keep_order_and_not_deleted_is_last() {
        let filters = [
            Filter::Eq("user_id", PgBindValue::I64(7)),
            Filter::Contains("title", "rust".into()),
            Filter::Eq("topic_id", PgBindValue::I64(3)),
        ];
        let q = select_page("post", COLS, &filters, "id", false, 0, 10);
        assert_eq!(
            q.sql,
            "SELECT id, user_id, title FROM \"post\" WHERE \"user_id\" = $1::bigint \
             AND \"title\" LIKE $2 ESCAPE '\\' AND \"topic_id\" = $3::bigint AND NOT deleted \
             ORDER BY \"id\" ASC LIMIT 10 OFFSET 0"
        );
        assert_eq!(q.params.len(), 3);
        assert_eq!(q.params[1], PgBindValue::Str("%rust%".into()));
    }

    #[test]
    fn offset_is_page_times_size() {
        let q = select_page("account", "id", &[], "id", false, 2, 2);
        assert!(q.sql.ends_with("LIMIT 2 OFFSET 4"));
    }

    #[test]
    fn non_id_sort_gets_id_tiebreak() {
        let q = select_page("account", "id", &[], "username", true, 0, 5);
        assert!(q.sql.contains("ORDER BY \"username\" DESC, \"id\" ASC"));
    }

    #[test]
    fn like_needle_is_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        let q = select_page(
            "post",
            COLS,
            &[Filter::Contains("title", "100%".into())],
            "id",
            false,
            0,
            1,
        );
        assert_eq!(q.params[0], PgBindValue::Str("%100\\%%".into()));
    }

    #[test]
    fn page_size_is_clamped() {
        let q = select_page("post", COLS, &[], "id", false, 0, 5000);
        assert!(q.sql.contains("LIMIT 1000 "));
    }
}
