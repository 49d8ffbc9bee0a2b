//! Static sample data shown on the Dashboard and Reports pages.
//!
//! None of this comes from the database.

use crate::db::{ColumnInfo, QueryResult, Value};

/// Report types selectable on the Reports page.
pub const REPORT_TYPES: [&str; 3] = ["Sales Report", "User Activity", "Performance Analysis"];

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
const MONTHLY_SALES: [i64; 6] = [65, 78, 90, 81, 95, 107];
const MONTHLY_REVENUE: [i64; 6] = [2300, 2100, 2290, 2000, 2181, 2500];

const CATEGORIES: [&str; 4] = ["A", "B", "C", "D"];
const QUARTERS: [(&str, [i64; 4]); 4] = [
    ("Q1", [100, 150, 200, 120]),
    ("Q2", [120, 160, 210, 140]),
    ("Q3", [140, 180, 230, 160]),
    ("Q4", [160, 200, 250, 180]),
];

/// A headline figure with its change versus the previous period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub label: &'static str,
    pub value: &'static str,
    pub delta: &'static str,
}

impl Metric {
    /// Returns true if the change is not negative.
    pub fn is_up(&self) -> bool {
        !self.delta.starts_with('-')
    }
}

pub fn metrics() -> [Metric; 3] {
    [
        Metric {
            label: "Total Records",
            value: "1,234",
            delta: "+5%",
        },
        Metric {
            label: "Active Users",
            value: "456",
            delta: "+12%",
        },
        Metric {
            label: "Last Updated",
            value: "2 min ago",
            delta: "-1%",
        },
    ]
}

/// Monthly sales and revenue, one row per month.
pub fn monthly_trend() -> QueryResult {
    let columns = vec![
        ColumnInfo::new("Month", "TEXT"),
        ColumnInfo::new("Sales", "INT8"),
        ColumnInfo::new("Revenue", "INT8"),
    ];
    let rows = MONTHS
        .iter()
        .zip(MONTHLY_SALES)
        .zip(MONTHLY_REVENUE)
        .map(|((month, sales), revenue)| {
            vec![Value::from(*month), Value::Int(sales), Value::Int(revenue)]
        })
        .collect();

    QueryResult::with_data(columns, rows)
}

/// Quarterly figures per category, one row per category.
pub fn quarterly_report() -> QueryResult {
    let columns = std::iter::once(ColumnInfo::new("Category", "TEXT"))
        .chain(
            QUARTERS
                .iter()
                .map(|(quarter, _)| ColumnInfo::new(*quarter, "INT8")),
        )
        .collect();
    let rows = CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, category)| {
            std::iter::once(Value::from(*category))
                .chain(QUARTERS.iter().map(|(_, values)| Value::Int(values[i])))
                .collect()
        })
        .collect();

    QueryResult::with_data(columns, rows)
}

/// Heading shown above the selected report.
pub fn report_heading(report_type: &str) -> String {
    format!("Generating {report_type}...")
}
