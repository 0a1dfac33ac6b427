//! Record ⇄ object mapping.
//!
//! [`Mapper::merge`] applies a record onto an existing object in place,
//! [`Mapper::serialize`] produces a record from an object and
//! [`Mapper::deserialize`] merges onto a freshly constructed instance. The
//! first field that cannot be reconciled aborts the call; fields written
//! before it stay written.

mod coerce;
pub mod config;
mod merge;
mod serialize;

pub use config::{ArrayMergePolicy, MapperConfig};

use crate::core::{Record, Result};
use crate::exclusion::Operation;
use crate::model::{Mapped, MappedType};
use merge::MergeRun;
use serialize::SerializeRun;
use tracing::{Level, event, info_span};

/// Mapping facade carrying a [`MapperConfig`].
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    config: MapperConfig,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Applies `record` onto `target`, skipping fields excluded for merge
    /// and leaving fields absent from the record untouched.
    pub fn merge(&self, target: &mut dyn Mapped, record: &Record) -> Result<()> {
        self.run_merge(target, record, Operation::Merge)
    }

    /// Produces a record from every field of `source` not excluded for serialize.
    pub fn serialize(&self, source: &dyn Mapped) -> Result<Record> {
        let span = info_span!("recordmap.serialize", type_name = %source.type_name());
        let _enter = span.enter();

        match SerializeRun::new(&self.config).serialize(source, "") {
            Ok(record) => {
                event!(Level::DEBUG, fields = record.len(), "object serialized");
                Ok(record)
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "serialize failed");
                Err(err)
            }
        }
    }

    /// Builds `T` through its factory and applies `record` with the deserialize exclusions.
    pub fn deserialize<T: MappedType>(&self, record: &Record) -> Result<T> {
        let mut target = T::create()?;
        self.run_merge(&mut target, record, Operation::Deserialize)?;
        Ok(target)
    }

    fn run_merge(&self, target: &mut dyn Mapped, record: &Record, operation: Operation) -> Result<()> {
        let span = info_span!(
            "recordmap.merge",
            type_name = %target.type_name(),
            operation = %operation
        );
        let _enter = span.enter();

        match MergeRun::new(&self.config, operation).merge(target, record) {
            Ok(()) => {
                event!(Level::DEBUG, "record merged");
                Ok(())
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "merge failed");
                Err(err)
            }
        }
    }
}

/// [`Mapper::merge`] with the default configuration.
pub fn merge(target: &mut dyn Mapped, record: &Record) -> Result<()> {
    Mapper::default().merge(target, record)
}

/// [`Mapper::serialize`] with the default configuration.
pub fn serialize(source: &dyn Mapped) -> Result<Record> {
    Mapper::default().serialize(source)
}

/// [`Mapper::deserialize`] with the default configuration.
pub fn deserialize<T: MappedType>(record: &Record) -> Result<T> {
    Mapper::default().deserialize(record)
}

/// Method-call sugar over the default [`Mapper`].
pub trait MappedExt: Mapped {
    fn merge_record(&mut self, record: &Record) -> Result<()>
    where
        Self: Sized,
    {
        merge(self, record)
    }

    fn to_record(&self) -> Result<Record>
    where
        Self: Sized,
    {
        serialize(self)
    }
}

impl<T: Mapped> MappedExt for T {}
