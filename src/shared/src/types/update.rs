//! Partial updates
//!
//! A [`SubscriptionPatch`] is the decoded request payload: every field is
//! independently present or absent. [`SubscriptionPatch::resolve`] turns it into
//! an [`UpdateDescriptor`], the ordered list of column changes to apply. Columns
//! always appear in the same order (`service_name`, `price`, `user_id`,
//! `start_date`, `end_date`) so the generated statement shape is reproducible.

use serde::{de, Deserialize, Deserializer};
use utoipa::ToSchema;

use super::month_year::MonthYear;
use super::subscription::Subscription;

/// Presence of a single field in a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Field absent from the payload; storage keeps its value
    Unset,
    /// Field present; storage is overwritten even when unchanged
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unset
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, FieldUpdate::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Unset => None,
        }
    }
}

// `null` on a non-nullable field counts as absent.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.map_or(FieldUpdate::Unset, FieldUpdate::Set))
    }
}

fn deserialize_start_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FieldUpdate<MonthYear>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(text) => MonthYear::parse(&text).map_err(de::Error::custom)?,
        None => None,
    };
    Ok(parsed.map_or(FieldUpdate::Unset, FieldUpdate::Set))
}

// Present-but-null (or empty) clears the end date.
fn deserialize_end_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FieldUpdate<Option<MonthYear>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(text) => MonthYear::parse(&text).map_err(de::Error::custom)?,
        None => None,
    };
    Ok(FieldUpdate::Set(parsed))
}

/// Partial-update payload for `PUT /subs/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct SubscriptionPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Netflix")]
    pub service_name: FieldUpdate<String>,

    #[serde(default)]
    #[schema(value_type = Option<i32>, example = 450)]
    pub price: FieldUpdate<i32>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub user_id: FieldUpdate<String>,

    #[serde(default, deserialize_with = "deserialize_start_date")]
    #[schema(value_type = Option<String>, example = "08-2025")]
    pub start_date: FieldUpdate<MonthYear>,

    /// `null` clears the end date; omitting the field leaves it untouched
    #[serde(default, deserialize_with = "deserialize_end_date")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: FieldUpdate<Option<MonthYear>>,
}

impl SubscriptionPatch {
    /// True when no field was present in the payload
    pub fn is_empty(&self) -> bool {
        !(self.service_name.is_set()
            || self.price.is_set()
            || self.user_id.is_set()
            || self.start_date.is_set()
            || self.end_date.is_set())
    }

    /// Build the ordered change list for the subscription `id`
    pub fn resolve(self, id: impl Into<String>) -> UpdateDescriptor {
        let mut changes = Vec::new();

        if let FieldUpdate::Set(value) = self.service_name {
            changes.push(FieldChange::ServiceName(value));
        }
        if let FieldUpdate::Set(value) = self.price {
            changes.push(FieldChange::Price(value));
        }
        if let FieldUpdate::Set(value) = self.user_id {
            changes.push(FieldChange::UserId(value));
        }
        if let FieldUpdate::Set(value) = self.start_date {
            changes.push(FieldChange::StartDate(value));
        }
        if let FieldUpdate::Set(value) = self.end_date {
            changes.push(FieldChange::EndDate(value));
        }

        UpdateDescriptor {
            id: id.into(),
            changes,
        }
    }
}

/// Writable subscription columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ServiceName,
    Price,
    UserId,
    StartDate,
    EndDate,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::ServiceName => "service_name",
            Column::Price => "price",
            Column::UserId => "user_id",
            Column::StartDate => "start_date",
            Column::EndDate => "end_date",
        }
    }
}

/// A value bound to a column in a generated statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Integer(i32),
    Month(MonthYear),
    NullableMonth(Option<MonthYear>),
}

/// One column assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    ServiceName(String),
    Price(i32),
    UserId(String),
    StartDate(MonthYear),
    EndDate(Option<MonthYear>),
}

impl FieldChange {
    pub fn column(&self) -> Column {
        match self {
            FieldChange::ServiceName(_) => Column::ServiceName,
            FieldChange::Price(_) => Column::Price,
            FieldChange::UserId(_) => Column::UserId,
            FieldChange::StartDate(_) => Column::StartDate,
            FieldChange::EndDate(_) => Column::EndDate,
        }
    }

    pub fn value(&self) -> ColumnValue {
        match self {
            FieldChange::ServiceName(value) | FieldChange::UserId(value) => {
                ColumnValue::Text(value.clone())
            }
            FieldChange::Price(value) => ColumnValue::Integer(*value),
            FieldChange::StartDate(value) => ColumnValue::Month(*value),
            FieldChange::EndDate(value) => ColumnValue::NullableMonth(*value),
        }
    }
}

/// Sparse update for a single subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDescriptor {
    pub id: String,
    pub changes: Vec<FieldChange>,
}

impl UpdateDescriptor {
    /// Nothing to write
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// `(column, value)` pairs in application order
    pub fn assignments(&self) -> Vec<(Column, ColumnValue)> {
        self.changes
            .iter()
            .map(|change| (change.column(), change.value()))
            .collect()
    }

    /// Apply the changes to an in-memory record
    pub fn apply_to(&self, subscription: &mut Subscription) {
        for change in &self.changes {
            match change {
                FieldChange::ServiceName(value) => subscription.service_name = value.clone(),
                FieldChange::Price(value) => subscription.price = *value,
                FieldChange::UserId(value) => subscription.user_id = value.clone(),
                FieldChange::StartDate(value) => subscription.start_date = *value,
                FieldChange::EndDate(value) => subscription.end_date = *value,
            }
        }
    }
}
