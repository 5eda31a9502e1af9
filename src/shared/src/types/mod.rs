//! Domain types shared between the database layer and the HTTP API
//!
//! - [`MonthYear`]: calendar month value used for subscription start/end dates
//! - [`Subscription`] / [`NewSubscription`]: the stored record and its create input
//! - [`SubscriptionPatch`]: partial-update payload, resolved into an [`UpdateDescriptor`]

pub mod month_year;
pub mod subscription;
pub mod update;

pub use month_year::{MonthYear, MonthYearError};
pub use subscription::{NewSubscription, Subscription};
pub use update::{
    Column, ColumnValue, FieldChange, FieldUpdate, SubscriptionPatch, UpdateDescriptor,
};
