//! SQL parsing and classification.
//!
//! Uses sqlparser with the PostgreSQL dialect. Anything the parser rejects
//! is treated as destructive so a read-only policy never lets it through.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::{Classification, SafetyLevel, StatementType};

type Verdict = (SafetyLevel, StatementType);

/// Classifies a SQL string.
pub fn classify_sql(sql: &str) -> Classification {
    let statements = match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => {
            return Classification {
                level: SafetyLevel::Destructive,
                statement_type: StatementType::Unknown,
                parse_error: Some(e.to_string()),
            }
        }
    };

    match statements.as_slice() {
        [] => Classification {
            level: SafetyLevel::Destructive,
            statement_type: StatementType::Unknown,
            parse_error: Some("empty SQL statement".to_string()),
        },
        [single] => {
            let (level, statement_type) = classify_statement(single);
            Classification::new(level, statement_type)
        }
        many => {
            let (level, statement_type) = most_dangerous(many.iter().map(classify_statement))
                .unwrap_or((SafetyLevel::Destructive, StatementType::Unknown));
            Classification::new(level, StatementType::Multiple(Box::new(statement_type)))
        }
    }
}

/// Picks the verdict with the highest level; the first one wins ties.
fn most_dangerous(verdicts: impl Iterator<Item = Verdict>) -> Option<Verdict> {
    verdicts.fold(None, |worst, verdict| match worst {
        Some(current) if current.0 >= verdict.0 => Some(current),
        _ => Some(verdict),
    })
}

fn classify_statement(statement: &Statement) -> Verdict {
    use SafetyLevel::{Destructive, Mutating, Safe};

    match statement {
        // May hide data-modifying CTEs, so look inside.
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the statement.
                (classify_statement(statement).0, StatementType::Explain)
            } else {
                (Safe, StatementType::Explain)
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. } => (Safe, StatementType::Show),

        Statement::Insert { .. } => (Mutating, StatementType::Insert),
        Statement::Update { .. } => (Mutating, StatementType::Update),
        Statement::Merge { .. } => (Mutating, StatementType::Merge),

        Statement::Delete { .. } => (Destructive, StatementType::Delete),
        Statement::Drop { .. } => (Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (Destructive, StatementType::Truncate),
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => (Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. } => (Destructive, StatementType::Create),
        Statement::Grant { .. } => (Destructive, StatementType::Grant),
        Statement::Revoke { .. } => (Destructive, StatementType::Revoke),

        // SET, COPY, CALL, transactions and the rest: assume the worst.
        _ => (Destructive, StatementType::Unknown),
    }
}

fn classify_query(query: &Query) -> Verdict {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    most_dangerous(ctes.chain(std::iter::once(classify_set_expr(&query.body))))
        .unwrap_or((SafetyLevel::Safe, StatementType::Select))
}

fn classify_set_expr(set_expr: &SetExpr) -> Verdict {
    match set_expr {
        SetExpr::Insert(statement) | SetExpr::Update(statement) => classify_statement(statement),
        SetExpr::Query(query) => classify_query(query),
        // SELECT ... INTO creates a table.
        SetExpr::Select(select) if select.into.is_some() => {
            (SafetyLevel::Destructive, StatementType::Create)
        }
        SetExpr::Select(select) => {
            most_dangerous(select.from.iter().map(classify_table_with_joins))
                .unwrap_or((SafetyLevel::Safe, StatementType::Select))
        }
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous([classify_set_expr(left), classify_set_expr(right)].into_iter())
                .unwrap_or((SafetyLevel::Safe, StatementType::Select))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

fn classify_table_with_joins(twj: &TableWithJoins) -> Verdict {
    let relations = std::iter::once(&twj.relation).chain(twj.joins.iter().map(|j| &j.relation));
    most_dangerous(relations.map(classify_table_factor))
        .unwrap_or((SafetyLevel::Safe, StatementType::Select))
}

fn classify_table_factor(factor: &TableFactor) -> Verdict {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}
