use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Semantic meaning a column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    InvoiceId,
    OrderId,
    CustomerName,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::InvoiceId, Role::OrderId, Role::CustomerName];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvoiceId => write!(f, "invoice number (NFe)"),
            Self::OrderId => write!(f, "order number (Pedido)"),
            Self::CustomerName => write!(f, "customer name (Cliente)"),
        }
    }
}

/// Which of the two exports a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSide {
    /// Internal export (table A).
    Pedro,
    /// External export (table B), supplies the customer name.
    Dga,
}

impl SourceSide {
    /// Roles this side must have resolved before a run.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Self::Pedro => &[Role::InvoiceId, Role::OrderId],
            Self::Dga => &[Role::InvoiceId, Role::OrderId, Role::CustomerName],
        }
    }
}

impl std::fmt::Display for SourceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pedro => write!(f, "pedro"),
            Self::Dga => write!(f, "dga"),
        }
    }
}

/// Column chosen for each role within one table. At most one column per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap {
    #[serde(default)]
    pub invoice: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

impl RoleMap {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::InvoiceId => self.invoice.as_deref(),
            Role::OrderId => self.order.as_deref(),
            Role::CustomerName => self.customer.as_deref(),
        }
    }

    pub fn set(&mut self, role: Role, column: impl Into<String>) {
        let column = Some(column.into());
        match role {
            Role::InvoiceId => self.invoice = column,
            Role::OrderId => self.order = column,
            Role::CustomerName => self.customer = column,
        }
    }

    pub fn is_assigned(&self, role: Role) -> bool {
        self.get(role).is_some()
    }

    /// Layer `overrides` on top of `self`; any role set in `overrides` wins.
    pub fn overridden_by(&self, overrides: &RoleMap) -> RoleMap {
        RoleMap {
            invoice: overrides.invoice.clone().or_else(|| self.invoice.clone()),
            order: overrides.order.clone().or_else(|| self.order.clone()),
            customer: overrides.customer.clone().or_else(|| self.customer.clone()),
        }
    }

    /// Required roles of `side` that have no column.
    pub fn unassigned(&self, side: SourceSide) -> Vec<Role> {
        side.required_roles()
            .iter()
            .copied()
            .filter(|r| !self.is_assigned(*r))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One reconciled row. Only `sent` and `note` change after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub invoice: String,
    pub order: String,
    pub customer: String,
    pub sent: bool,
    pub note: String,
    pub verified_on: NaiveDate,
}

impl MatchRecord {
    pub fn new(invoice: String, order: String, customer: String, verified_on: NaiveDate) -> Self {
        Self {
            invoice,
            order,
            customer,
            sent: true,
            note: String::new(),
            verified_on,
        }
    }
}

/// Report counters. `sent + pending == total` by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total: usize,
    pub sent: usize,
    pub pending: usize,
}

/// Counts gathered during one run, for logging and the CLI summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunDiagnostics {
    pub pedro_rows: usize,
    pub dga_rows: usize,
    pub joined_rows: usize,
    pub duplicates_collapsed: usize,
    pub pedro_empty_keys: usize,
    pub dga_empty_keys: usize,
    /// Rows with an id containing the key separator (trimmed mode only).
    pub pedro_separator_ids: usize,
    pub dga_separator_ids: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconOutcome {
    pub records: Vec<MatchRecord>,
    pub diagnostics: RunDiagnostics,
    pub verified_on: NaiveDate,
}
