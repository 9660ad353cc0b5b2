use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Processor-side key/value metadata, kept in a stable key order
pub type Metadata = IndexMap<String, String>;

/// A customer record as stored by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Processor-assigned identifier (e.g. `cus_...`), immutable once created
    pub id: String,

    /// Email address, unique across customers created through the orchestrator
    pub email: Option<String>,

    /// Free-form description
    pub description: Option<String>,

    /// Processor-side metadata; the category tag lives here
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: Metadata,

    /// Whether the processor flags this customer as delinquent
    #[serde(default)]
    pub delinquent: bool,

    /// Identifier of the default payment source, if one is attached
    pub default_source: Option<String>,

    /// Coupon currently applied to the customer, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,

    /// When the customer was created
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Look up a metadata value by key
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Whether a default payment source is attached
    pub fn has_default_source(&self) -> bool {
        self.default_source
            .as_deref()
            .is_some_and(|source| !source.is_empty())
    }

    /// Whether this customer's email is exactly `email` (case-sensitive)
    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }

    /// Project this customer onto its lite view
    pub fn lite(&self) -> CustomerLite {
        CustomerLite::from(self)
    }
}

/// Read-only listing view of a [`Customer`].
///
/// Carries the id, which can be used to retrieve the full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerLite {
    pub id: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub delinquent: bool,
}

impl From<&Customer> for CustomerLite {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.clone(),
            email: customer.email.clone(),
            description: customer.description.clone(),
            delinquent: customer.delinquent,
        }
    }
}

impl From<Customer> for CustomerLite {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            description: customer.description,
            delinquent: customer.delinquent,
        }
    }
}

/// Parameters for creating a customer at the processor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCustomer {
    pub email: String,
    pub description: Option<String>,
    pub metadata: Metadata,
}

impl NewCustomer {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Partial update of a customer; `None` fields are left untouched.
///
/// Metadata entries are merged key by key, matching how the processor
/// treats metadata updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerUpdate {
    pub email: Option<String>,
    pub metadata: Option<Metadata>,
}

impl CustomerUpdate {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            metadata: None,
        }
    }

    pub fn metadata_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(key.into(), value.into());
        Self {
            email: None,
            metadata: Some(metadata),
        }
    }
}
