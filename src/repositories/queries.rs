//! Statement builders for the `user` table.
//!
//! Every function here is pure: it turns domain inputs into SQL text plus the
//! ordered list of bound values. User data never ends up in the SQL text.

use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{
    Alias, Asterisk, Expr, Func, PostgresQueryBuilder, Query, QueryStatementWriter,
    SelectStatement, SimpleExpr, Values,
};
use sea_orm::{DbBackend, Statement};
use uuid::Uuid;

use crate::entity::user::{Column, Entity as UserEntity};
use crate::error::AppResult;
use crate::models::{CreateUserInput, Pagination, UpdateUserInput, UserFilter};

/// Alias of the aggregate column produced by [`build_count`].
pub const COUNT_ALIAS: &str = "count";

/// SQL text and its positional parameters.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub values: Values,
}

impl BuiltQuery {
    pub fn into_statement(self) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, self.sql, self.values.0)
    }
}

impl From<(String, Values)> for BuiltQuery {
    fn from((sql, values): (String, Values)) -> Self {
        Self { sql, values }
    }
}

/// `SELECT COUNT(*)` over the rows matching `filter`.
pub fn build_count(filter: &UserFilter) -> BuiltQuery {
    let mut stmt = Query::select();
    stmt.expr_as(Func::count(Expr::col(Asterisk)), Alias::new(COUNT_ALIAS))
        .from(UserEntity);
    apply_filter(&mut stmt, filter);

    stmt.build(PostgresQueryBuilder).into()
}

/// `SELECT *` over the rows matching `filter`, paged when limit/offset are set.
pub fn build_search(filter: &UserFilter, pagination: &Pagination) -> BuiltQuery {
    let mut stmt = Query::select();
    stmt.column(Asterisk).from(UserEntity);
    apply_filter(&mut stmt, filter);

    if let Some(limit) = pagination.limit {
        stmt.limit(limit);
    }
    if let Some(offset) = pagination.offset {
        stmt.offset(offset);
    }

    stmt.build(PostgresQueryBuilder).into()
}

pub fn build_find_by_id(id: Uuid) -> BuiltQuery {
    let mut stmt = Query::select();
    stmt.column(Asterisk)
        .from(UserEntity)
        .and_where(Expr::col(Column::Id).eq(id));

    stmt.build(PostgresQueryBuilder).into()
}

/// Insert only the columns that carry a value; id and timestamps come from
/// column defaults.
pub fn build_insert(input: &CreateUserInput) -> AppResult<BuiltQuery> {
    let mut columns = vec![Column::Name, Column::Surname];
    let mut values: Vec<SimpleExpr> = vec![
        input.name.as_str().into(),
        input.surname.as_str().into(),
    ];

    if let Some(patronymic) = &input.patronymic {
        columns.push(Column::Patronymic);
        values.push(patronymic.as_str().into());
    }
    if let Some(nationality) = &input.nationality {
        columns.push(Column::Nationality);
        values.push(nationality.as_str().into());
    }
    if let Some(age) = input.age {
        columns.push(Column::Age);
        values.push(age.into());
    }
    if let Some(sex) = input.sex {
        columns.push(Column::Sex);
        values.push(sex.as_str().into());
    }

    let mut stmt = Query::insert();
    stmt.into_table(UserEntity).columns(columns);
    stmt.values(values)?;
    stmt.returning_all();

    Ok(stmt.build(PostgresQueryBuilder).into())
}

/// Patch the present columns of one row. `updated_at` is always touched, so a
/// patch without fields still runs and bumps the timestamp.
pub fn build_update(id: Uuid, input: &UpdateUserInput) -> BuiltQuery {
    let mut stmt = Query::update();
    stmt.table(UserEntity)
        .value(Column::UpdatedAt, Expr::current_timestamp());

    if let Some(name) = &input.name {
        stmt.value(Column::Name, name.as_str());
    }
    if let Some(surname) = &input.surname {
        stmt.value(Column::Surname, surname.as_str());
    }
    if let Some(patronymic) = &input.patronymic {
        stmt.value(Column::Patronymic, patronymic.as_str());
    }
    if let Some(nationality) = &input.nationality {
        stmt.value(Column::Nationality, nationality.as_str());
    }
    if let Some(age) = input.age {
        stmt.value(Column::Age, age);
    }
    if let Some(sex) = input.sex {
        stmt.value(Column::Sex, sex.as_str());
    }

    stmt.and_where(Expr::col(Column::Id).eq(id)).returning_all();

    stmt.build(PostgresQueryBuilder).into()
}

pub fn build_delete(id: Uuid) -> BuiltQuery {
    let mut stmt = Query::delete();
    stmt.from_table(UserEntity)
        .and_where(Expr::col(Column::Id).eq(id))
        .returning_all();

    stmt.build(PostgresQueryBuilder).into()
}

// Predicate order is fixed: name, surname, patronymic, nationality, sex, age.
fn apply_filter(stmt: &mut SelectStatement, filter: &UserFilter) {
    if let Some(name) = &filter.name {
        stmt.and_where(Expr::col(Column::Name).ilike(contains_pattern(name)));
    }
    if let Some(surname) = &filter.surname {
        stmt.and_where(Expr::col(Column::Surname).ilike(contains_pattern(surname)));
    }
    if let Some(patronymic) = &filter.patronymic {
        stmt.and_where(Expr::col(Column::Patronymic).ilike(contains_pattern(patronymic)));
    }
    if let Some(nationality) = &filter.nationality {
        stmt.and_where(Expr::col(Column::Nationality).eq(nationality.as_str()));
    }
    if let Some(sex) = filter.sex {
        stmt.and_where(Expr::col(Column::Sex).eq(sex.as_str()));
    }
    if let Some(age) = filter.age {
        stmt.and_where(Expr::col(Column::Age).eq(age));
    }
}

/// `%value%` with LIKE metacharacters escaped (backslash is the default
/// escape character in PostgreSQL).
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
